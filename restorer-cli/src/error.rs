// ============================================================================
// restorer-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Mapping failures to process exit codes
//
// Commands return anyhow errors. When the root cause is a CoreError, its kind
// decides the exit code; everything else is a generic failure.

use restorer_core::CoreError;

/// Exit code for an interrupted run, as shells report SIGINT.
pub const EXIT_CANCELLED: i32 = 130;

/// Exit code when ffmpeg cannot be found.
pub const EXIT_TOOL_NOT_FOUND: i32 = 127;

/// Exit code for invalid options or configuration.
pub const EXIT_USAGE: i32 = 2;

/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Chooses the process exit code for a failed command.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.chain().find_map(|cause| cause.downcast_ref::<CoreError>()) {
        Some(CoreError::Cancelled) => EXIT_CANCELLED,
        Some(CoreError::ExternalToolNotFound(_)) => EXIT_TOOL_NOT_FOUND,
        Some(CoreError::InvalidOptions(_)) => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}
