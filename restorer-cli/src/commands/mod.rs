//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// `run`: restore a file or directory.
pub mod run;

/// `config`: print the effective configuration.
pub mod show_config;

/// `info`: report the located ffmpeg.
pub mod info;
