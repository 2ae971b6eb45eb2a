// ============================================================================
// restorer-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the restorer-core library
//
// Only the process supervisor and the job entry point produce runtime errors.
// The derived-parameter functions, the filter-chain compiler and the argument
// assembler are total over a well-formed configuration and never fail.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors surfaced by the core library.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required option or path was missing, or a knob named no known value.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The binary locator could not find an executable ffmpeg.
    #[error("External tool not found: {0}")]
    ExternalToolNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input path could not be read or does not exist.
    #[error("Path error: {0}")]
    PathError(String),

    #[error("No processable files found in the input directory")]
    NoFilesFound,

    /// The cancellation flag was observed at a job boundary.
    #[error("Processing cancelled")]
    Cancelled,

    /// The external tool ran but exited with a non-zero code.
    #[error("{tool} failed with exit code {code}")]
    ProcessFailed { tool: String, code: i32 },

    /// Pipe, spawn or wait failure inside the supervisor.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Builds the error for a child process that could not be started.
pub fn command_start_error(tool: &str, err: io::Error) -> CoreError {
    CoreError::Internal(format!("failed to start {tool}: {err}"))
}

/// Builds the error for a failed wait on a running child process.
pub fn command_wait_error(tool: &str, err: io::Error) -> CoreError {
    CoreError::Internal(format!("failed to wait for {tool}: {err}"))
}

/// Builds the error for a child process that exited unsuccessfully.
///
/// Processes killed by a signal carry no exit code; they are reported as `-1`.
pub fn command_failed_error(tool: &str, status: ExitStatus) -> CoreError {
    CoreError::ProcessFailed {
        tool: tool.to_string(),
        code: status.code().unwrap_or(-1),
    }
}
