// ============================================================================
// restorer-cli/src/logging.rs
// ============================================================================
//
// LOGGING: Console logger setup and per-run log files
//
// The core logs through the `log` facade; this module installs env_logger as
// the backend. RUST_LOG overrides the level chosen here:
// - info (default): job start, finish and summary
// - debug (--verbose): compiled chains, argument vectors and ffmpeg output
//
// With --log-dir, everything ffmpeg writes is also appended to
// restorer_run_<timestamp>.log.

use anyhow::{Context, Result};
use env_logger::Env;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Installs the console logger.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Append-only log of a run's ffmpeg output.
pub struct RunLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RunLog {
    /// Creates `<dir>/restorer_run_<timestamp>.log`, creating `dir` if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
        let path = dir.join(format!("restorer_run_{}.log", get_timestamp()));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create log file '{}'", path.display()))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a line. Logging never interrupts a job, so write errors are
    /// dropped.
    pub fn line(&mut self, text: &str) {
        let _ = writeln!(self.writer, "{text}");
    }

    pub fn raw(&mut self, chunk: &str) {
        let _ = self.writer.write_all(chunk.as_bytes());
    }

    pub fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}
