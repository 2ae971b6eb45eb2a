//! Core library for ffmpeg-based upscaling and restoration.
//!
//! This crate turns a restoration configuration into an ffmpeg filter chain
//! and argument vector, then runs and supervises ffmpeg for each input file.
//! It never prints; front ends observe progress through an
//! [`progress_reporting::OutputSink`].
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use restorer_core::{Engine, RestoreConfig};
//! use restorer_core::progress_reporting::LogSink;
//! use std::path::Path;
//!
//! let config = RestoreConfig::builder()
//!     .crf(18.0)
//!     .scale_factor(2.0)
//!     .build()
//!     .unwrap();
//!
//! let summary = Engine::new()
//!     .with_dry_run(true)
//!     .compile_and_run(Path::new("/path/to/tapes"), &config, &mut LogSink)
//!     .unwrap();
//!
//! for report in &summary.reports {
//!     println!("{}", report.invocation.display_command());
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod discovery;
pub mod encoding;
pub mod error;
pub mod external;
pub mod output_path;
pub mod presets;
pub mod processing;
pub mod progress_reporting;
pub mod utils;

// Re-exports for public API
pub use cancel::CancellationFlag;
pub use config::{RestoreConfig, RestoreConfigBuilder};
pub use discovery::{MediaKind, find_processable_files};
pub use encoding::{EncodeSettings, PixelFormat, encoder_id, normalize_x265_params};
pub use error::{CoreError, CoreResult};
pub use external::{
    BinaryLocator, FixedLocator, Invocation, NullPreview, PreviewSink, ProcessRunner, SdlWindow,
    Supervisor, SystemLocator, ffmpeg_version,
};
pub use output_path::output_path_for;
pub use presets::{MemoryPresetStore, PresetStore};
pub use processing::{
    Engine, FilterChain, JobReport, JobStatus, RunSummary, StageKind, compile_and_run,
    compile_filter_chain, plan_job,
};
pub use utils::{format_duration, parse_ffmpeg_time};
