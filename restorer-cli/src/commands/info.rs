//! Implementation of the 'info' subcommand.

use crate::terminal::print_info;

use anyhow::Result;
use log::warn;
use restorer_core::external::locator::ENV_OVERRIDES;
use restorer_core::{BinaryLocator, SystemLocator, ffmpeg_version};

/// Reports the ffmpeg the locator finds and its version.
pub fn run() -> Result<()> {
    for name in ENV_OVERRIDES {
        if let Some(value) = std::env::var_os(name) {
            print_info(name, value.to_string_lossy());
        }
    }

    let path = SystemLocator::from_env().locate()?;
    print_info("ffmpeg", path.display());

    match ffmpeg_version(&path) {
        Ok(version) => print_info("Version", version),
        Err(e) => warn!("{e}"),
    }
    Ok(())
}
