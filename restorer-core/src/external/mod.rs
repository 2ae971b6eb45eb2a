// ============================================================================
// restorer-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Locating, invoking and supervising ffmpeg
//
// KEY COMPONENTS:
// - BinaryLocator: where the ffmpeg executable lives
// - FfmpegCommandBuilder / assemble_invocation: the argument vector
// - PreviewSink: destination of the live-preview branch
// - ProcessRunner / Supervisor: running the invocation and draining output
//
// The traits are the seams the job runner is generic over, so tests can swap
// in a recording runner or a fixed locator.

pub mod ffmpeg_builder;
pub mod ffmpeg_executor;
pub mod locator;
pub mod preview;

#[cfg(test)]
pub(crate) mod mocks;

pub use ffmpeg_builder::{FfmpegCommandBuilder, Invocation, assemble_invocation};
pub use ffmpeg_executor::{ProcessRunner, Supervisor, SupervisorState};
pub use locator::{BinaryLocator, FixedLocator, SystemLocator, ffmpeg_version};
pub use preview::{NullPreview, PreviewSink, SdlWindow};
