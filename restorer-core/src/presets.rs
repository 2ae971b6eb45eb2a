// ============================================================================
// restorer-core/src/presets.rs
// ============================================================================
//
// PRESETS: Named configuration records
//
// A preset store hands out and accepts complete configuration records. The
// name `factory` is reserved: it always yields the built-in defaults and can
// never be overwritten. A preset that does not exist is not an error; callers
// keep whatever defaults they already hold.
//
// Only an in-memory store ships with the core. Persisting presets is left to
// front ends.

use crate::config::RestoreConfig;
use crate::error::{CoreError, CoreResult};

use std::collections::BTreeMap;

/// Name of the built-in preset.
pub const FACTORY_PRESET: &str = "factory";

/// Source and destination of named configuration records.
pub trait PresetStore {
    /// The record saved under `name`, or `None` if there is none.
    fn load(&self, name: &str) -> Option<RestoreConfig>;

    /// Saves `config` under `name`, replacing any earlier record.
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidOptions` for an empty or reserved name.
    fn save(&mut self, name: &str, config: &RestoreConfig) -> CoreResult<()>;

    /// Every available name, including `factory`, sorted.
    fn names(&self) -> Vec<String>;
}

/// Preset store held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPresetStore {
    presets: BTreeMap<String, RestoreConfig>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresetStore for MemoryPresetStore {
    fn load(&self, name: &str) -> Option<RestoreConfig> {
        if name == FACTORY_PRESET {
            return Some(RestoreConfig::default());
        }
        self.presets.get(name).cloned()
    }

    fn save(&mut self, name: &str, config: &RestoreConfig) -> CoreResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidOptions("preset name is empty".to_string()));
        }
        if name == FACTORY_PRESET {
            return Err(CoreError::InvalidOptions(format!(
                "preset '{FACTORY_PRESET}' is built in and cannot be overwritten"
            )));
        }
        self.presets.insert(name.to_string(), config.clone());
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.presets.keys().cloned().collect();
        names.push(FACTORY_PRESET.to_string());
        names.sort();
        names
    }
}

/// Loads `name` from `store`, falling back to `current` when it is missing.
pub fn load_or_keep(store: &dyn PresetStore, name: &str, current: RestoreConfig) -> RestoreConfig {
    match store.load(name) {
        Some(config) => config,
        None => {
            log::warn!("Preset '{name}' not found; keeping current settings");
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Codec;

    #[test]
    fn factory_is_always_defaults() {
        let store = MemoryPresetStore::new();
        let factory = store.load(FACTORY_PRESET).unwrap();
        assert_eq!(factory.crf, RestoreConfig::default().crf);
        assert_eq!(store.names(), vec!["factory".to_string()]);
    }

    #[test]
    fn factory_cannot_be_overwritten() {
        let mut store = MemoryPresetStore::new();
        let result = store.save("factory", &RestoreConfig::default());
        assert!(matches!(result, Err(CoreError::InvalidOptions(_))));
    }

    #[test]
    fn saved_presets_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let mut store = MemoryPresetStore::new();
        let config = RestoreConfig {
            codec: Codec::H264,
            crf: 20.0,
            ..RestoreConfig::default()
        };
        store.save("vhs", &config)?;

        let loaded = store.load("vhs").unwrap();
        assert_eq!(loaded.codec, Codec::H264);
        assert_eq!(loaded.crf, 20.0);
        assert_eq!(store.names(), vec!["factory".to_string(), "vhs".to_string()]);
        Ok(())
    }

    #[test]
    fn missing_preset_keeps_current() {
        let store = MemoryPresetStore::new();
        let current = RestoreConfig {
            crf: 30.0,
            ..RestoreConfig::default()
        };
        assert_eq!(load_or_keep(&store, "nope", current).crf, 30.0);
    }
}
