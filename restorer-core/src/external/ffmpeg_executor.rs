// ============================================================================
// restorer-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// PROCESS SUPERVISOR: Running ffmpeg and draining its output
//
// The supervisor spawns the assembled invocation with stdin attached to the
// null device and both output streams piped. One reader thread per stream
// forwards chunks over a channel; the supervising thread waits on that channel
// with a short timeout, hands each chunk to the caller's sink, and polls the
// child's exit status on every wake-up.
//
// STATES:
//   Idle -> Spawned -> Draining -> Reaped
//
// Once the child has exited, any output still in flight is drained for a short
// grace period and the supervisor leaves Draining even if a stream is still
// held open by some other process. Reader threads that are still blocked at
// that point are detached.
//
// Cancellation is not enforced here. A request observed while draining is
// logged once; the job runner acts on it before the next job.

use crate::cancel::CancellationFlag;
use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};
use crate::external::ffmpeg_builder::Invocation;
use crate::progress_reporting::{OutputSink, StreamKind};

use log::{debug, info, trace, warn};
use std::io::{ErrorKind, Read};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long the supervisor waits for output before re-checking the child.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long buffered output is still collected after the child has exited.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_millis(500);

const READ_BUFFER_SIZE: usize = 4096;

/// Runs an invocation to completion.
pub trait ProcessRunner {
    /// Runs `invocation`, forwarding its output to `sink`.
    ///
    /// # Errors
    ///
    /// * `CoreError::Internal` if the process cannot be spawned or waited on
    /// * `CoreError::ProcessFailed` if it exits with a non-zero code
    fn run(
        &self,
        invocation: &Invocation,
        sink: &mut dyn OutputSink,
        cancel: &CancellationFlag,
    ) -> CoreResult<()>;
}

/// Lifecycle of one supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SupervisorState {
    Idle,
    Spawned,
    Draining,
    Reaped,
}

enum StreamMessage {
    Chunk(StreamKind, String),
    Closed,
}

/// Supervises ffmpeg as a child process.
#[derive(Debug, Clone)]
pub struct Supervisor {
    tool: String,
    poll_interval: Duration,
    drain_grace: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self {
            tool: "ffmpeg".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }
}

impl Supervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used in error messages.
    #[must_use]
    pub fn with_tool_name(mut self, tool: &str) -> Self {
        self.tool = tool.to_string();
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    fn advance(&self, state: &mut SupervisorState, next: SupervisorState) {
        debug_assert!(next > *state, "supervisor moved backwards: {state:?} -> {next:?}");
        trace!("{} supervisor: {:?} -> {:?}", self.tool, state, next);
        *state = next;
    }

    /// Kills and reaps a child after a wait failure.
    fn abandon(&self, child: &mut Child) {
        if let Err(e) = child.kill() {
            debug!("Failed to kill {}: {}", self.tool, e);
        }
        let _ = child.wait();
    }
}

impl ProcessRunner for Supervisor {
    fn run(
        &self,
        invocation: &Invocation,
        sink: &mut dyn OutputSink,
        cancel: &CancellationFlag,
    ) -> CoreResult<()> {
        let mut state = SupervisorState::Idle;

        let mut command = invocation.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Spawning: {}", invocation.display_command());
        let mut child = command
            .spawn()
            .map_err(|e| command_start_error(&self.tool, e))?;
        self.advance(&mut state, SupervisorState::Spawned);

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, StreamKind::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, StreamKind::Stderr, tx.clone()));
        }
        drop(tx);
        self.advance(&mut state, SupervisorState::Draining);

        let mut open_streams = readers.len();
        let mut exit_status: Option<ExitStatus> = None;
        let mut cancel_noted = false;

        while open_streams > 0 && exit_status.is_none() {
            match rx.recv_timeout(self.poll_interval) {
                Ok(StreamMessage::Chunk(kind, text)) => sink.on_output(kind, &text),
                Ok(StreamMessage::Closed) => open_streams -= 1,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => open_streams = 0,
            }

            if !cancel_noted && cancel.is_requested() {
                info!("Cancellation requested; it takes effect once the running job ends");
                cancel_noted = true;
            }

            match child.try_wait() {
                Ok(status) => exit_status = status,
                Err(e) => {
                    self.abandon(&mut child);
                    return Err(command_wait_error(&self.tool, e));
                }
            }
        }

        if open_streams > 0 {
            drain_remaining(&rx, sink, &mut open_streams, self.drain_grace);
            if open_streams > 0 {
                warn!(
                    "{} exited but {} output stream(s) stayed open; continuing",
                    self.tool, open_streams
                );
            }
        }

        let status = match exit_status {
            Some(status) => status,
            None => child
                .wait()
                .map_err(|e| command_wait_error(&self.tool, e))?,
        };
        self.advance(&mut state, SupervisorState::Reaped);

        let detached = join_finished(readers);
        if detached > 0 {
            debug!(
                "Detached {detached} {} reader thread(s); output arriving after the {:?} drain grace is discarded",
                self.tool, self.drain_grace
            );
        }

        if status.success() {
            Ok(())
        } else {
            Err(command_failed_error(&self.tool, status))
        }
    }
}

/// Collects output that is already in flight, up to `grace`.
/// Joins the readers that have already finished and returns how many are
/// left running.
fn join_finished(readers: Vec<JoinHandle<()>>) -> usize {
    let mut detached = 0;
    for reader in readers {
        if reader.is_finished() {
            let _ = reader.join();
        } else {
            detached += 1;
        }
    }
    detached
}

fn drain_remaining(
    rx: &Receiver<StreamMessage>,
    sink: &mut dyn OutputSink,
    open_streams: &mut usize,
    grace: Duration,
) {
    let deadline = Instant::now() + grace;
    while *open_streams > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        match rx.recv_timeout(remaining) {
            Ok(StreamMessage::Chunk(kind, text)) => sink.on_output(kind, &text),
            Ok(StreamMessage::Closed) => *open_streams -= 1,
            Err(RecvTimeoutError::Timeout) => return,
            Err(RecvTimeoutError::Disconnected) => {
                *open_streams = 0;
            }
        }
    }
}

fn spawn_reader<R>(mut stream: R, kind: StreamKind, tx: Sender<StreamMessage>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let mut carry = Vec::new();
        loop {
            match stream.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    let text = decode_chunk(&mut carry, &buffer[..n]);
                    if !text.is_empty() && tx.send(StreamMessage::Chunk(kind, text)).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("Read error on {kind:?}: {e}");
                    break;
                }
            }
        }
        if !carry.is_empty() {
            let text = String::from_utf8_lossy(&carry).into_owned();
            let _ = tx.send(StreamMessage::Chunk(kind, text));
        }
        let _ = tx.send(StreamMessage::Closed);
    })
}

/// Decodes bytes as UTF-8, holding back an incomplete trailing sequence so a
/// character split across two reads is not mangled.
fn decode_chunk(carry: &mut Vec<u8>, bytes: &[u8]) -> String {
    carry.extend_from_slice(bytes);
    match std::str::from_utf8(carry) {
        Ok(text) => {
            let text = text.to_string();
            carry.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let text = String::from_utf8_lossy(&carry[..valid]).into_owned();
            carry.drain(..valid);
            text
        }
        Err(_) => {
            let text = String::from_utf8_lossy(carry).into_owned();
            carry.clear();
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_keeps_split_multibyte_characters() {
        let mut carry = Vec::new();
        let bytes = "é".as_bytes();
        assert_eq!(decode_chunk(&mut carry, &bytes[..1]), "");
        assert_eq!(carry.len(), 1);
        assert_eq!(decode_chunk(&mut carry, &bytes[1..]), "é");
        assert!(carry.is_empty());
    }

    #[test]
    fn decode_replaces_invalid_bytes() {
        let mut carry = Vec::new();
        assert_eq!(decode_chunk(&mut carry, &[b'a', 0xff, b'b']), "a\u{fffd}b");
        assert!(carry.is_empty());
    }

    #[test]
    fn join_finished_counts_running_readers() {
        let done = thread::spawn(|| {});
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let blocked = thread::spawn(move || {
            let _ = release_rx.recv();
        });
        while !done.is_finished() {
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(join_finished(vec![done, blocked]), 1);
        drop(release_tx);
        assert_eq!(join_finished(Vec::new()), 0);
    }

    #[test]
    fn states_are_ordered() {
        assert!(SupervisorState::Idle < SupervisorState::Spawned);
        assert!(SupervisorState::Draining < SupervisorState::Reaped);
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use crate::error::CoreError;
        use crate::progress_reporting::CollectingSink;
        use std::path::PathBuf;

        fn sh(script: &str) -> Invocation {
            Invocation {
                program: PathBuf::from("/bin/sh"),
                args: vec!["-c".to_string(), script.to_string()],
            }
        }

        #[test]
        fn forwards_both_streams_and_succeeds() {
            let mut sink = CollectingSink::default();
            let result = Supervisor::new().run(
                &sh("printf out; printf err >&2"),
                &mut sink,
                &CancellationFlag::new(),
            );
            assert!(result.is_ok());
            assert_eq!(sink.stdout, "out");
            assert_eq!(sink.stderr, "err");
        }

        #[test]
        fn nonzero_exit_reports_code() {
            let mut sink = CollectingSink::default();
            let result = Supervisor::new().run(&sh("exit 3"), &mut sink, &CancellationFlag::new());
            assert!(matches!(
                result,
                Err(CoreError::ProcessFailed { code: 3, .. })
            ));
        }

        #[test]
        fn stdin_is_closed() {
            let mut sink = CollectingSink::default();
            let result = Supervisor::new().run(
                &sh("if read line; then exit 1; else exit 0; fi"),
                &mut sink,
                &CancellationFlag::new(),
            );
            assert!(result.is_ok());
        }
    }
}
