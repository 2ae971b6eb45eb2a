//! Output file naming.
//!
//! Restored files are named `<stem>_[restored].<ext>` and written either to
//! the configured output directory or next to the input. Images always become
//! PNG; videos always become MP4.

use crate::discovery::MediaKind;

use std::path::{Path, PathBuf};

/// Suffix appended to the input stem.
pub const OUTPUT_SUFFIX: &str = "_[restored]";

/// Builds the output path for `input`.
///
/// # Arguments
///
/// * `input` - The file being processed
/// * `output_dir` - Destination directory; `None` uses the input's directory
/// * `media` - Decides the output extension
#[must_use]
pub fn output_path_for(input: &Path, output_dir: Option<&Path>, media: MediaKind) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let extension = match media {
        MediaKind::Image => "png",
        MediaKind::Video => "mp4",
    };
    let file_name = format!("{stem}{OUTPUT_SUFFIX}.{extension}");

    let directory = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    directory.join(file_name)
}
