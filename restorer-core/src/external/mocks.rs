// restorer-core/src/external/mocks.rs

// --- Test doubles for the process runner ---

use super::ffmpeg_builder::Invocation;
use super::ffmpeg_executor::ProcessRunner;
use crate::cancel::CancellationFlag;
use crate::error::{CoreError, CoreResult};
use crate::progress_reporting::{OutputSink, StreamKind};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Scripted outcome of one run.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub stderr: String,
    pub exit_code: i32,
}

impl ScriptedRun {
    pub fn success(stderr: &str) -> Self {
        Self {
            stderr: stderr.to_string(),
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            stderr: String::new(),
            exit_code,
        }
    }
}

/// Records every invocation it is asked to run and replays scripted results.
/// Runs beyond the script succeed silently.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    script: Rc<RefCell<VecDeque<ScriptedRun>>>,
    received: Rc<RefCell<Vec<Invocation>>>,
    /// Raised on the given flag during the run with this 1-based number.
    cancel_during: Option<(usize, CancellationFlag)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, run: ScriptedRun) {
        self.script.borrow_mut().push_back(run);
    }

    pub fn cancel_during(mut self, run_number: usize, flag: CancellationFlag) -> Self {
        self.cancel_during = Some((run_number, flag));
        self
    }

    pub fn received(&self) -> Vec<Invocation> {
        self.received.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.received.borrow().len()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(
        &self,
        invocation: &Invocation,
        sink: &mut dyn OutputSink,
        _cancel: &CancellationFlag,
    ) -> CoreResult<()> {
        self.received.borrow_mut().push(invocation.clone());
        let run_number = self.calls();

        if let Some((target, flag)) = &self.cancel_during {
            if *target == run_number {
                flag.request();
            }
        }

        let run = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| ScriptedRun::success(""));
        if !run.stderr.is_empty() {
            sink.on_output(StreamKind::Stderr, &run.stderr);
        }

        if run.exit_code == 0 {
            Ok(())
        } else {
            Err(CoreError::ProcessFailed {
                tool: "ffmpeg".to_string(),
                code: run.exit_code,
            })
        }
    }
}

/// Locator that answers with a path without checking it exists.
#[derive(Debug, Clone)]
pub struct StaticLocator(pub std::path::PathBuf);

impl super::locator::BinaryLocator for StaticLocator {
    fn locate(&self) -> CoreResult<std::path::PathBuf> {
        Ok(self.0.clone())
    }
}

/// Locator that never finds anything.
#[derive(Debug, Clone, Copy)]
pub struct MissingLocator;

impl super::locator::BinaryLocator for MissingLocator {
    fn locate(&self) -> CoreResult<std::path::PathBuf> {
        Err(CoreError::ExternalToolNotFound("ffmpeg".to_string()))
    }
}
