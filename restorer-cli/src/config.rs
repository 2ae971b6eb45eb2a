// restorer-cli/src/config.rs
//
// Builds the configuration record from the command line.
//
// Layers, lowest first:
//   built-in defaults < --preset < --config FILE < flags < --set KEY=VALUE

use crate::cli::ConfigArgs;

use anyhow::{Context, Result};
use log::debug;
use restorer_core::config::split_assignment;
use restorer_core::presets::{PresetStore, load_or_keep};
use restorer_core::RestoreConfig;

use std::fs;
use std::path::Path;

/// Reads a JSON configuration file. Missing fields keep their defaults.
pub fn load_config_file(path: &Path) -> Result<RestoreConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid config file '{}'", path.display()))
}

/// Resolves every layer into one validated record.
pub fn build_config(args: &ConfigArgs, store: &dyn PresetStore) -> Result<RestoreConfig> {
    let mut config = RestoreConfig::default();

    if let Some(name) = &args.preset {
        config = load_or_keep(store, name, config);
    }

    if let Some(path) = &args.config_file {
        config = load_config_file(path)?;
        debug!("Loaded configuration from {}", path.display());
    }

    for (key, value) in args.flag_settings() {
        config
            .apply_setting(key, &value)
            .with_context(|| format!("Invalid value for {key}"))?;
    }

    for assignment in &args.settings {
        let (key, value) = split_assignment(assignment)?;
        config
            .apply_setting(key, value)
            .with_context(|| format!("Invalid --set {assignment}"))?;
    }

    config.validate()?;
    Ok(config)
}

/// Pretty JSON for `restorer config`.
pub fn render_config(config: &RestoreConfig) -> Result<String> {
    serde_json::to_string_pretty(config).context("Failed to serialize configuration")
}
