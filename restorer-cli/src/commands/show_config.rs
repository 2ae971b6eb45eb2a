//! Implementation of the 'config' subcommand.

use crate::cli::ShowConfigArgs;
use crate::config::{build_config, render_config};
use crate::presets::DirectoryPresetStore;

use anyhow::{Context, Result};
use log::info;
use restorer_core::presets::PresetStore;

/// Prints the configuration the given arguments resolve to, saving it as a
/// preset when asked.
pub fn run(args: &ShowConfigArgs) -> Result<()> {
    let mut store = DirectoryPresetStore::resolve(args.config.preset_dir.as_deref());
    let config = build_config(&args.config, &store)?;

    if let Some(name) = &args.save_preset {
        store
            .save(name, &config)
            .with_context(|| format!("Failed to save preset '{name}'"))?;
        info!("Saved preset '{}' in {}", name.trim(), store.dir().display());
    }

    println!("{}", render_config(&config)?);
    Ok(())
}
