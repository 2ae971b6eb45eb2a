// restorer-cli/src/presets.rs
//
// Presets kept on disk, one JSON record per file.
//
// A preset named `vhs` lives at `<dir>/vhs.json` and uses the same format as
// `--config` files. The directory comes from `--preset-dir`, then
// RESTORER_PRESET_DIR, then `<config dir>/restorer/presets`.

use log::{debug, warn};
use restorer_core::presets::{FACTORY_PRESET, PresetStore};
use restorer_core::{CoreError, CoreResult, RestoreConfig};

use std::fs;
use std::path::{Path, PathBuf};

const PRESET_EXTENSION: &str = "json";

/// The per-user preset directory, if the platform has a config directory.
pub fn default_preset_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("restorer").join("presets"))
}

/// Preset store backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct DirectoryPresetStore {
    dir: PathBuf,
}

impl DirectoryPresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store over `dir`, or the per-user directory when `dir` is `None`.
    ///
    /// Falls back to `./presets` on platforms without a config directory.
    pub fn resolve(dir: Option<&Path>) -> Self {
        let dir = dir
            .map(Path::to_path_buf)
            .or_else(default_preset_dir)
            .unwrap_or_else(|| PathBuf::from("presets"));
        debug!("Using preset directory {}", dir.display());
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PRESET_EXTENSION}"))
    }
}

/// Rejects names that would escape the preset directory.
fn check_name(name: &str) -> CoreResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidOptions("preset name is empty".to_string()));
    }
    if name == FACTORY_PRESET {
        return Err(CoreError::InvalidOptions(format!(
            "preset '{FACTORY_PRESET}' is built in and cannot be overwritten"
        )));
    }
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(CoreError::InvalidOptions(format!("invalid preset name '{name}'")));
    }
    Ok(name)
}

impl PresetStore for DirectoryPresetStore {
    fn load(&self, name: &str) -> Option<RestoreConfig> {
        let name = name.trim();
        if name == FACTORY_PRESET {
            return Some(RestoreConfig::default());
        }
        if check_name(name).is_err() {
            return None;
        }

        let path = self.path_for(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                debug!("Cannot read preset {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(config) => {
                debug!("Loaded preset '{name}' from {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring malformed preset {}: {e}", path.display());
                None
            }
        }
    }

    fn save(&mut self, name: &str, config: &RestoreConfig) -> CoreResult<()> {
        let name = check_name(name)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| CoreError::InvalidOptions(format!("cannot serialize preset: {e}")))?;
        let path = self.path_for(name);
        fs::write(&path, json)?;
        debug!("Saved preset '{name}' to {}", path.display());
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.dir)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PRESET_EXTENSION))
            })
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .filter(|name| name != FACTORY_PRESET)
            .collect();
        names.push(FACTORY_PRESET.to_string());
        names.sort();
        names.dedup();
        names
    }
}
