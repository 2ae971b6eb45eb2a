// ============================================================================
// restorer-core/src/external/locator.rs
// ============================================================================
//
// BINARY LOCATOR: Finding an executable ffmpeg
//
// Search order:
//   1. RESTORER_FFMPEG, then FFMPEG_PATH
//   2. next to the running executable, then an app bundle's ../Resources
//   3. /opt/homebrew/bin, /usr/local/bin, /usr/bin
//   4. every directory on PATH
//   5. the binary managed by ffmpeg-sidecar
//
// A candidate only counts if it is an existing executable file. A locator
// that finds nothing yields ExternalToolNotFound, which the job runner treats
// as fatal before any work starts.

use crate::error::{CoreError, CoreResult};

use log::debug;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variables consulted before any directory search, in order.
pub const ENV_OVERRIDES: [&str; 2] = ["RESTORER_FFMPEG", "FFMPEG_PATH"];

const WELL_KNOWN_DIRS: [&str; 3] = ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

/// Supplies the path of the external tool.
pub trait BinaryLocator {
    /// # Errors
    ///
    /// `CoreError::ExternalToolNotFound` when no executable candidate exists.
    fn locate(&self) -> CoreResult<PathBuf>;
}

/// Locator that searches the environment and the filesystem.
#[derive(Debug, Clone, Default)]
pub struct SystemLocator {
    overrides: Vec<PathBuf>,
    search_dirs: Vec<PathBuf>,
    path_var: Option<OsString>,
    use_sidecar: bool,
}

impl SystemLocator {
    /// Locator over the real process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let overrides = ENV_OVERRIDES
            .iter()
            .filter_map(|name| env::var_os(name))
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .collect();

        let mut search_dirs = Vec::new();
        if let Some(exe_dir) = env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
            search_dirs.push(exe_dir.join("../Resources"));
            search_dirs.insert(0, exe_dir);
        }
        search_dirs.extend(WELL_KNOWN_DIRS.iter().map(PathBuf::from));

        Self {
            overrides,
            search_dirs,
            path_var: env::var_os("PATH"),
            use_sidecar: true,
        }
    }

    /// Locator with no candidates at all; build one up with the `with_*`
    /// methods.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.push(path.into());
        self
    }

    #[must_use]
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn with_path_var(mut self, path_var: impl Into<OsString>) -> Self {
        self.path_var = Some(path_var.into());
        self
    }

    /// Every candidate path, in search order. The sidecar binary is not
    /// included.
    #[must_use]
    pub fn candidates(&self) -> Vec<PathBuf> {
        let name = binary_name();
        let mut candidates = self.overrides.clone();
        candidates.extend(self.search_dirs.iter().map(|dir| dir.join(&name)));
        if let Some(path_var) = &self.path_var {
            candidates.extend(env::split_paths(path_var).map(|dir| dir.join(&name)));
        }
        candidates
    }
}

impl BinaryLocator for SystemLocator {
    fn locate(&self) -> CoreResult<PathBuf> {
        if let Some(found) = self.candidates().into_iter().find(|p| is_executable(p)) {
            debug!("Using ffmpeg at {}", found.display());
            return Ok(found);
        }

        if self.use_sidecar {
            let managed = ffmpeg_sidecar::paths::ffmpeg_path();
            if is_executable(&managed) {
                debug!("Using ffmpeg-sidecar binary at {}", managed.display());
                return Ok(managed);
            }
        }

        Err(CoreError::ExternalToolNotFound(
            "ffmpeg (set RESTORER_FFMPEG or install ffmpeg on PATH)".to_string(),
        ))
    }
}

/// Locator that always answers with one path, as long as it is executable.
#[derive(Debug, Clone)]
pub struct FixedLocator {
    path: PathBuf,
}

impl FixedLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BinaryLocator for FixedLocator {
    fn locate(&self) -> CoreResult<PathBuf> {
        if is_executable(&self.path) {
            Ok(self.path.clone())
        } else {
            Err(CoreError::ExternalToolNotFound(self.path.display().to_string()))
        }
    }
}

/// Version string reported by the ffmpeg at `path`.
///
/// # Errors
///
/// `CoreError::Internal` if the binary cannot be run or its banner parsed.
pub fn ffmpeg_version(path: &Path) -> CoreResult<String> {
    ffmpeg_sidecar::version::ffmpeg_version_with_path(path)
        .map_err(|e| CoreError::Internal(format!("could not read ffmpeg version: {e}")))
}

fn binary_name() -> String {
    format!("ffmpeg{}", env::consts::EXE_SUFFIX)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
