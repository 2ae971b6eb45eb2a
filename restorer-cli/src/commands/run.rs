//! Implementation of the 'run' subcommand.
//!
//! Builds the configuration, wires the Ctrl-C handler to the core's
//! cancellation flag, and hands the input to the core's job runner with a
//! terminal sink attached.

use crate::cli::RunArgs;
use crate::config::build_config;
use crate::logging::RunLog;
use crate::presets::DirectoryPresetStore;
use crate::terminal::{self, TerminalSink};

use anyhow::{Context, Result, bail};
use log::{info, warn};
use restorer_core::{CancellationFlag, Engine, NullPreview, RunSummary};

/// Installs a Ctrl-C handler that raises `flag`.
///
/// The running ffmpeg job is left to finish; the run stops before the next
/// file.
pub fn install_interrupt_handler(flag: &CancellationFlag) -> Result<()> {
    let flag = flag.clone();
    ctrlc::set_handler(move || {
        if !flag.is_requested() {
            warn!("Interrupt received; stopping after the current file");
        }
        flag.request();
    })
    .context("Failed to install Ctrl-C handler")
}

/// Builds the engine for `args` around `cancel`.
pub fn build_engine(args: &RunArgs, cancel: CancellationFlag) -> Engine {
    let engine = Engine::new()
        .with_cancellation(cancel)
        .with_dry_run(args.dry_run);
    if args.headless {
        engine.with_preview(NullPreview)
    } else {
        engine
    }
}

pub fn run(args: RunArgs) -> Result<RunSummary> {
    let store = DirectoryPresetStore::resolve(args.config.preset_dir.as_deref());
    let config = build_config(&args.config, &store)?;

    let run_log = match &args.log_dir {
        Some(dir) => {
            let log = RunLog::create(dir)?;
            info!("Writing ffmpeg output to {}", log.path().display());
            Some(log)
        }
        None => None,
    };

    let cancel = CancellationFlag::new();
    install_interrupt_handler(&cancel)?;
    let engine = build_engine(&args, cancel);

    let mut sink = TerminalSink::new(run_log);
    let summary = engine
        .compile_and_run(&args.input_path, &config, &mut sink)
        .with_context(|| format!("Failed to process '{}'", args.input_path.display()))?;

    terminal::print_summary(&summary, args.dry_run);
    if summary.has_failures() {
        bail!("{} of {} file(s) failed", summary.failed(), summary.reports.len());
    }
    Ok(summary)
}
