// restorer-cli/src/lib.rs
//
// Library portion of the Restorer CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod presets;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, ConfigArgs, RunArgs, ShowConfigArgs};
pub use config::build_config;
pub use presets::DirectoryPresetStore;
