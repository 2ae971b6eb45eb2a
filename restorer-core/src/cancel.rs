//! Process-wide cooperative cancellation.
//!
//! A [`CancellationFlag`] is a cheap, clonable handle over one atomic bit. The
//! CLI raises it from its Ctrl-C handler; the job runner clears it at the start
//! of a run and checks it between files. A running ffmpeg child is not
//! interrupted, so cancellation takes effect at the next job boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    requested: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the current run to stop at its next checkpoint.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = CancellationFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_requested());

        handle.request();
        assert!(flag.is_requested());

        flag.clear();
        assert!(!handle.is_requested());
    }

    #[test]
    fn request_from_another_thread_is_visible() {
        let flag = CancellationFlag::new();
        let handle = flag.clone();
        std::thread::spawn(move || handle.request())
            .join()
            .unwrap();
        assert!(flag.is_requested());
    }
}
