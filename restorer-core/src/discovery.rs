//! File discovery for directory inputs.
//!
//! Walks an input directory recursively and returns every file the pipeline
//! knows how to process: video containers (mp4, mkv, mov) and still images.
//! Hidden entries (names starting with a dot) are skipped along with anything
//! beneath them.

use crate::error::{CoreError, CoreResult};
use crate::utils::lowercase_extension;

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions handled as single-frame image jobs.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Container extensions picked up during directory traversal.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov"];

/// What kind of job a file becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Classifies a path by extension. Anything that is not a known image is
    /// treated as video, so explicit single-file inputs with unusual container
    /// extensions still run.
    pub fn from_path(path: &Path) -> Self {
        if is_image(path) {
            MediaKind::Image
        } else {
            MediaKind::Video
        }
    }
}

/// True if the path has a known image extension (case-insensitive).
#[must_use]
pub fn is_image(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// True if the path has a container extension picked up by directory traversal.
#[must_use]
pub fn is_video_container(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Finds every processable file under `input_dir`, sorted by path.
///
/// # Arguments
///
/// * `input_dir` - The directory to search
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of discovered videos and images
/// * `Err(CoreError::Io)` - If the top-level directory cannot be read
/// * `Err(CoreError::NoFilesFound)` - If nothing processable was found
///
/// Unreadable subdirectories are logged and skipped.
///
/// # Examples
///
/// ```rust,no_run
/// use restorer_core::find_processable_files;
/// use std::path::Path;
///
/// match find_processable_files(Path::new("/path/to/footage")) {
///     Ok(files) => println!("Found {} files", files.len()),
///     Err(e) => println!("Error finding files: {}", e),
/// }
/// ```
pub fn find_processable_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect(input_dir, &mut files, true)?;
    files.sort();

    if files.is_empty() {
        Err(CoreError::NoFilesFound)
    } else {
        Ok(files)
    }
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>, top_level: bool) -> CoreResult<()> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if !top_level => {
            debug!("Skipping unreadable directory {}: {}", dir.display(), e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for entry in read_dir.flatten() {
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        if path.is_dir() {
            collect(&path, files, false)?;
        } else if path.is_file() && (is_video_container(&path) || is_image(&path)) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn classifies_extensions_case_insensitively() {
        assert!(is_image(Path::new("scan.TIFF")));
        assert!(is_image(Path::new("a/b/frame.webp")));
        assert!(!is_image(Path::new("clip.mp4")));
        assert!(is_video_container(Path::new("clip.MOV")));
        assert!(!is_video_container(Path::new("clip.avi")));

        assert_eq!(MediaKind::from_path(Path::new("x.JPG")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("x.avi")), MediaKind::Video);
    }

    #[test]
    fn walks_recursively_and_skips_hidden() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("season1");
        let hidden = dir.path().join(".cache");
        fs::create_dir(&nested)?;
        fs::create_dir(&hidden)?;

        File::create(dir.path().join("b.mkv"))?;
        File::create(dir.path().join("a.png"))?;
        File::create(dir.path().join("notes.txt"))?;
        File::create(dir.path().join(".hidden.mp4"))?;
        File::create(nested.join("ep1.mov"))?;
        File::create(hidden.join("inside.mp4"))?;

        let files = find_processable_files(dir.path())?;
        assert_eq!(
            files,
            vec![
                dir.path().join("a.png"),
                dir.path().join("b.mkv"),
                nested.join("ep1.mov"),
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_directory_reports_no_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        File::create(dir.path().join("readme.md"))?;
        assert!(matches!(
            find_processable_files(dir.path()),
            Err(CoreError::NoFilesFound)
        ));
        Ok(())
    }

    #[test]
    fn missing_directory_is_io_error() {
        let result = find_processable_files(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
