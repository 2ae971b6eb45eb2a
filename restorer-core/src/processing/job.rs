// ============================================================================
// restorer-core/src/processing/job.rs
// ============================================================================
//
// JOB RUNNER: The single entry point from a front end into the core
//
// WORKFLOW:
// 1. Clear the cancellation flag and validate the configuration
// 2. Locate ffmpeg (fatal if missing)
// 3. Stat the input: a file is one job, a directory is a sequential batch
// 4. For each job: name the output, compile the chain, assemble the
//    invocation, then either report it (dry run) or hand it to the runner
//
// Cancellation is checked before every job. It never interrupts a running
// ffmpeg child.
//
// A failed single-file job is returned as the error of the run. Inside a
// directory batch a failed job is recorded in its report and the batch moves
// on; nothing is retried.

use crate::cancel::CancellationFlag;
use crate::config::RestoreConfig;
use crate::discovery::{MediaKind, find_processable_files};
use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg_builder::{Invocation, assemble_invocation};
use crate::external::ffmpeg_executor::{ProcessRunner, Supervisor};
use crate::external::locator::{BinaryLocator, SystemLocator};
use crate::external::preview::{PreviewSink, SdlWindow};
use crate::output_path::output_path_for;
use crate::processing::filter_chain::{FilterChain, compile_filter_chain};
use crate::progress_reporting::{JobStart, LogSink, OutputSink};
use crate::utils::format_duration;

use log::{debug, error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Completed,
    /// The invocation was reported but not run.
    DryRun,
    Failed(String),
}

/// Outcome of one file.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub invocation: Invocation,
    pub status: JobStatus,
    pub elapsed: Duration,
}

/// Reports for every job of a run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<JobReport>,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.count(|s| *s == JobStatus::Completed)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn total_elapsed(&self) -> Duration {
        self.reports.iter().map(|r| r.elapsed).sum()
    }

    fn count(&self, predicate: impl Fn(&JobStatus) -> bool) -> usize {
        self.reports.iter().filter(|r| predicate(&r.status)).count()
    }
}

/// Everything that is decided about a job before anything runs.
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub media: MediaKind,
    pub output: PathBuf,
    pub chain: FilterChain,
    pub invocation: Invocation,
}

/// Plans the job for `input` without touching the filesystem.
///
/// Planning is deterministic: the same inputs always produce the same chain
/// and argument vector.
#[must_use]
pub fn plan_job(
    program: &Path,
    input: &Path,
    config: &RestoreConfig,
    preview: &dyn PreviewSink,
) -> PlannedJob {
    let media = MediaKind::from_path(input);
    let output = output_path_for(input, config.output_dir.as_deref(), media);
    let chain = compile_filter_chain(config, media);
    let invocation =
        assemble_invocation(program, input, &output, config, &chain, media, preview);

    PlannedJob {
        media,
        output,
        chain,
        invocation,
    }
}

struct JobOutcome {
    report: JobReport,
    error: Option<CoreError>,
}

/// Runs restoration jobs with pluggable collaborators.
pub struct Engine {
    locator: Box<dyn BinaryLocator>,
    runner: Box<dyn ProcessRunner>,
    preview: Box<dyn PreviewSink>,
    cancel: CancellationFlag,
    dry_run: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            locator: Box::new(SystemLocator::from_env()),
            runner: Box::new(Supervisor::new()),
            preview: Box::new(SdlWindow::default()),
            cancel: CancellationFlag::new(),
            dry_run: false,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_locator(mut self, locator: impl BinaryLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    #[must_use]
    pub fn with_runner(mut self, runner: impl ProcessRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    #[must_use]
    pub fn with_preview(mut self, preview: impl PreviewSink + 'static) -> Self {
        self.preview = Box::new(preview);
        self
    }

    /// Shares `flag` with whoever raises it, e.g. a signal handler.
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancel = flag;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// Processes `input` (a file or a directory) with `config`.
    ///
    /// # Errors
    ///
    /// * `CoreError::InvalidOptions` if the configuration fails validation
    /// * `CoreError::ExternalToolNotFound` if ffmpeg cannot be located
    /// * `CoreError::PathError` if the input cannot be read
    /// * `CoreError::NoFilesFound` for a directory with nothing to process
    /// * `CoreError::Cancelled` if cancellation was requested before a job
    /// * the job's own error when a single-file run fails
    pub fn compile_and_run(
        &self,
        input: &Path,
        config: &RestoreConfig,
        sink: &mut dyn OutputSink,
    ) -> CoreResult<RunSummary> {
        self.cancel.clear();
        config.validate()?;

        let program = self.locator.locate()?;
        let metadata = fs::metadata(input).map_err(|e| {
            CoreError::PathError(format!("cannot read {}: {}", input.display(), e))
        })?;

        if metadata.is_dir() {
            self.run_directory(&program, input, config, sink)
        } else {
            self.check_cancelled()?;
            let outcome = self.run_one(&program, input, config, (1, 1), sink);
            match outcome.error {
                Some(e) => Err(e),
                None => Ok(RunSummary {
                    reports: vec![outcome.report],
                }),
            }
        }
    }

    fn run_directory(
        &self,
        program: &Path,
        dir: &Path,
        config: &RestoreConfig,
        sink: &mut dyn OutputSink,
    ) -> CoreResult<RunSummary> {
        let files = find_processable_files(dir)?;
        info!("Found {} file(s) in {}", files.len(), dir.display());

        let mut summary = RunSummary::default();
        for (i, file) in files.iter().enumerate() {
            self.check_cancelled()?;
            let outcome = self.run_one(program, file, config, (i + 1, files.len()), sink);
            summary.reports.push(outcome.report);
        }

        info!(
            "Batch finished: {} completed, {} failed, {} total",
            summary.completed(),
            summary.failed(),
            format_duration(summary.total_elapsed().as_secs_f64())
        );
        Ok(summary)
    }

    fn check_cancelled(&self) -> CoreResult<()> {
        if self.cancel.is_requested() {
            info!("Cancelled before the next job");
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn run_one(
        &self,
        program: &Path,
        input: &Path,
        config: &RestoreConfig,
        (index, total): (usize, usize),
        sink: &mut dyn OutputSink,
    ) -> JobOutcome {
        let started = Instant::now();
        let plan = plan_job(program, input, config, self.preview.as_ref());
        debug!("Filter chain for {}: {}", input.display(), plan.chain);

        sink.on_job_start(&JobStart {
            index,
            total,
            input,
            output: &plan.output,
            invocation: &plan.invocation,
            dry_run: self.dry_run,
        });

        let result = if self.dry_run {
            info!("Dry run: {}", plan.invocation.display_command());
            Ok(JobStatus::DryRun)
        } else {
            info!(
                "[{}/{}] {} -> {}",
                index,
                total,
                input.display(),
                plan.output.display()
            );
            ensure_parent_dir(&plan.output)
                .and_then(|()| self.runner.run(&plan.invocation, sink, &self.cancel))
                .map(|()| JobStatus::Completed)
        };

        let (status, error) = match result {
            Ok(status) => (status, None),
            Err(e) => {
                error!("Failed to process {}: {}", input.display(), e);
                (JobStatus::Failed(e.to_string()), Some(e))
            }
        };

        let report = JobReport {
            input: input.to_path_buf(),
            output: plan.output,
            invocation: plan.invocation,
            status,
            elapsed: started.elapsed(),
        };
        sink.on_job_finish(&report);

        JobOutcome { report, error }
    }
}

fn ensure_parent_dir(output: &Path) -> CoreResult<()> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Processes `input` with the default collaborators, logging tool output.
///
/// # Errors
///
/// See [`Engine::compile_and_run`].
pub fn compile_and_run(input: &Path, config: &RestoreConfig) -> CoreResult<RunSummary> {
    Engine::default().compile_and_run(input, config, &mut LogSink)
}
