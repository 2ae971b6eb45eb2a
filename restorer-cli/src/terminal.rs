// ============================================================================
// restorer-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: Progress display and styled messages
//
// KEY COMPONENTS:
// - TerminalSink: the OutputSink the CLI hands to the core. It shows one
//   spinner per job fed by ffmpeg's -stats lines, keeps the last few
//   diagnostic lines to show if the job fails, and mirrors everything into
//   the optional run log.
// - print_* helpers for headings, summaries and errors.

use crate::logging::RunLog;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use restorer_core::progress_reporting::ffmpeg_handler::{EncodeStats, StatsParser};
use restorer_core::progress_reporting::{JobStart, OutputSink, StreamKind};
use restorer_core::{JobReport, JobStatus, RunSummary, format_duration};

use std::collections::VecDeque;
use std::time::Duration;

const TAIL_LINES: usize = 12;

/// Styling constants for terminal output.
pub mod styling {
    pub const SUCCESS_SYMBOL: &str = "✓";
    pub const PROCESSING_SYMBOL: &str = "»";
    pub const ERROR_SYMBOL: &str = "✗";
    pub const DRY_RUN_SYMBOL: &str = "◎";
    pub const SUB_ITEM_INDENT: &str = "    ";
}

/// Progress and diagnostics for a run, as seen on the terminal.
pub struct TerminalSink {
    spinner: Option<ProgressBar>,
    parser: StatsParser,
    tail: VecDeque<String>,
    label: String,
    run_log: Option<RunLog>,
}

impl TerminalSink {
    pub fn new(run_log: Option<RunLog>) -> Self {
        Self {
            spinner: None,
            parser: StatsParser::new(),
            tail: VecDeque::with_capacity(TAIL_LINES),
            label: String::new(),
            run_log,
        }
    }

    fn remember(&mut self, chunk: &str) {
        for line in chunk.split(['\r', '\n']).map(str::trim) {
            // Stats lines only matter while they are current.
            if line.is_empty() || line.starts_with("frame=") {
                continue;
            }
            if self.tail.len() == TAIL_LINES {
                self.tail.pop_front();
            }
            self.tail.push_back(line.to_string());
        }
    }

    fn show_stats(&self, stats: &EncodeStats) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format!("{} {}", self.label, progress_text(stats, self.parser.duration_secs())));
        }
    }
}

/// One-line progress text for a stats update.
pub fn progress_text(stats: &EncodeStats, duration_secs: Option<f64>) -> String {
    let mut text = format!(
        "frame {} | {:.1} fps | {}",
        stats.frame,
        stats.fps,
        format_duration(stats.time_secs)
    );
    if let Some(duration) = duration_secs {
        if let Some(percent) = stats.percent(duration) {
            text.push_str(&format!(" ({percent:.1}%)"));
        }
        if let Some(eta) = stats.eta_secs(duration) {
            text.push_str(&format!(" | ETA {}", format_duration(eta)));
        }
    }
    if let Some(speed) = stats.speed {
        text.push_str(&format!(" | {speed:.2}x"));
    }
    text
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl OutputSink for TerminalSink {
    fn on_output(&mut self, stream: StreamKind, chunk: &str) {
        if let Some(log) = self.run_log.as_mut() {
            log.raw(chunk);
        }
        self.remember(chunk);
        if stream == StreamKind::Stderr {
            if let Some(stats) = self.parser.feed(chunk) {
                self.show_stats(&stats);
            }
        }
    }

    fn on_job_start(&mut self, job: &JobStart<'_>) {
        self.parser = StatsParser::new();
        self.tail.clear();
        self.label = format!("[{}/{}] {}", job.index, job.total, file_label(job.input));

        if let Some(log) = self.run_log.as_mut() {
            log.line(&format!("==== {} -> {}", job.input.display(), job.output.display()));
            log.line(&job.invocation.display_command());
        }

        if job.dry_run {
            println!(
                "{} {}",
                style(styling::DRY_RUN_SYMBOL).cyan(),
                style(&self.label).bold()
            );
            println!("{}{}", styling::SUB_ITEM_INDENT, job.invocation.display_command());
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(format!("{} {}", styling::PROCESSING_SYMBOL, self.label));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn on_job_finish(&mut self, report: &JobReport) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        if let Some(log) = self.run_log.as_mut() {
            log.line(&format!("\n==== {:?} after {:.1}s", report.status, report.elapsed.as_secs_f64()));
            log.flush();
        }

        match &report.status {
            JobStatus::Completed => println!(
                "{} {} {}",
                style(styling::SUCCESS_SYMBOL).green(),
                self.label,
                style(format!("({})", format_duration(report.elapsed.as_secs_f64()))).dim()
            ),
            JobStatus::DryRun => {}
            JobStatus::Failed(reason) => {
                eprintln!(
                    "{} {} {}",
                    style(styling::ERROR_SYMBOL).red().bold(),
                    self.label,
                    style(reason).red()
                );
                for line in &self.tail {
                    eprintln!("{}{}", styling::SUB_ITEM_INDENT, style(line).dim());
                }
            }
        }
    }
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Prints the end-of-run summary.
pub fn print_summary(summary: &RunSummary, dry_run: bool) {
    if dry_run {
        println!(
            "\n{} command(s) shown, nothing was run.",
            style(summary.reports.len()).bold()
        );
        return;
    }
    println!(
        "\n{} completed, {} failed in {}",
        style(summary.completed()).green().bold(),
        if summary.has_failures() {
            style(summary.failed()).red().bold()
        } else {
            style(summary.failed()).bold()
        },
        format_duration(summary.total_elapsed().as_secs_f64())
    );
    for report in summary.reports.iter().filter(|r| r.status != JobStatus::DryRun) {
        println!("{}{}", styling::SUB_ITEM_INDENT, report.output.display());
    }
}

/// Prints a labelled value.
pub fn print_info(label: &str, value: impl std::fmt::Display) {
    println!("{}: {}", style(label).cyan(), value);
}

/// Prints an error with red styling.
pub fn print_error(message: impl std::fmt::Display) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_text_with_known_duration() {
        let stats = EncodeStats {
            frame: 240,
            fps: 24.0,
            time_secs: 10.0,
            speed: Some(1.0),
        };
        let text = progress_text(&stats, Some(100.0));
        assert!(text.starts_with("frame 240 | 24.0 fps"));
        assert!(text.contains("(10.0%)"));
        assert!(text.contains("ETA"));
        assert!(text.ends_with("1.00x"));
    }

    #[test]
    fn tail_skips_stats_and_keeps_recent_lines() {
        let mut sink = TerminalSink::new(None);
        sink.on_output(StreamKind::Stderr, "frame=1 fps=1 time=00:00:01.00\r");
        for i in 0..20 {
            sink.on_output(StreamKind::Stderr, &format!("line {i}\n"));
        }
        assert_eq!(sink.tail.len(), TAIL_LINES);
        assert_eq!(sink.tail.back().map(String::as_str), Some("line 19"));
        assert!(sink.tail.iter().all(|l| !l.starts_with("frame=")));
    }
}
