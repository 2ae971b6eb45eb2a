//! Output sinks for job events and external-tool diagnostics.
//!
//! The core never prints. Everything a front end may want to show flows
//! through an [`OutputSink`]: the start and end of each job, and every chunk
//! of output the external tool writes, in the order it arrives per stream.
//!
//! # Design Decisions
//! - One trait, with no-op defaults for the job hooks, so a sink that only
//!   cares about tool output implements a single method
//! - Chunks are raw text, not lines; [`ffmpeg_handler::StatsParser`] does the
//!   line splitting for callers that want progress numbers

pub mod ffmpeg_handler;

use std::path::Path;

use crate::external::ffmpeg_builder::Invocation;
use crate::processing::job::JobReport;

/// Which diagnostic stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Identifies a job as it starts.
#[derive(Debug, Clone, Copy)]
pub struct JobStart<'a> {
    /// 1-based position within the run
    pub index: usize,
    pub total: usize,
    pub input: &'a Path,
    pub output: &'a Path,
    pub invocation: &'a Invocation,
    pub dry_run: bool,
}

/// Receives job events and tool output.
pub trait OutputSink: Send {
    /// A chunk of text read from one of the tool's streams.
    fn on_output(&mut self, stream: StreamKind, chunk: &str);

    fn on_job_start(&mut self, _job: &JobStart<'_>) {}

    fn on_job_finish(&mut self, _report: &JobReport) {}
}

/// Forwards tool output to the `log` facade at debug level, target `ffmpeg`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn on_output(&mut self, stream: StreamKind, chunk: &str) {
        for line in chunk.split(['\r', '\n']).filter(|line| !line.trim().is_empty()) {
            log::debug!(target: "ffmpeg", "[{stream:?}] {line}");
        }
    }

    fn on_job_start(&mut self, job: &JobStart<'_>) {
        log::debug!("Command: {}", job.invocation.display_command());
    }
}

/// Accumulates everything it receives. Useful for tests and for callers that
/// want the tool's full error text after a failure.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub stdout: String,
    pub stderr: String,
    pub started: Vec<String>,
    pub finished: Vec<JobReport>,
}

impl OutputSink for CollectingSink {
    fn on_output(&mut self, stream: StreamKind, chunk: &str) {
        match stream {
            StreamKind::Stdout => self.stdout.push_str(chunk),
            StreamKind::Stderr => self.stderr.push_str(chunk),
        }
    }

    fn on_job_start(&mut self, job: &JobStart<'_>) {
        self.started.push(job.invocation.display_command());
    }

    fn on_job_finish(&mut self, report: &JobReport) {
        self.finished.push(report.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_keeps_streams_apart() {
        let mut sink = CollectingSink::default();
        sink.on_output(StreamKind::Stderr, "frame=  1");
        sink.on_output(StreamKind::Stdout, "out");
        sink.on_output(StreamKind::Stderr, "\rframe=  2");
        assert_eq!(sink.stderr, "frame=  1\rframe=  2");
        assert_eq!(sink.stdout, "out");
    }
}
