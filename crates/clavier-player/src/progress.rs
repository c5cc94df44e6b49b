//! Playback progress counters
//!
//! Two plain atomics written only by the scheduler thread and read by
//! whatever polls them (the original shell refreshes a progress bar at
//! 60 Hz). Single-writer/multi-reader with Relaxed ordering; a stale
//! read just means the bar lags one frame.

use std::sync::atomic::{AtomicU64, Ordering};

/// Progress of the current playback pass, in rounded seconds
pub struct Progress {
    curr_note: AtomicU64,
    max_note: AtomicU64,
}

impl Progress {
    /// Counters start at `(0, 1)` so a naive `curr / max` is valid
    /// before the first pass begins.
    pub(crate) fn new() -> Self {
        Self {
            curr_note: AtomicU64::new(0),
            max_note: AtomicU64::new(1),
        }
    }

    pub(crate) fn begin_pass(&self, max_note: u64) {
        self.curr_note.store(0, Ordering::Relaxed);
        self.max_note.store(max_note, Ordering::Relaxed);
    }

    pub(crate) fn set_current(&self, curr_note: u64) {
        self.curr_note.store(curr_note, Ordering::Relaxed);
    }

    /// Terminated sessions read as `(0, 0)`.
    pub(crate) fn finish(&self) {
        self.curr_note.store(0, Ordering::Relaxed);
        self.max_note.store(0, Ordering::Relaxed);
    }

    /// Timestamp of the last dispatched chord, rounded seconds.
    pub fn current_note(&self) -> u64 {
        self.curr_note.load(Ordering::Relaxed)
    }

    /// Timestamp of the final chord of the pass, rounded seconds.
    pub fn max_note(&self) -> u64 {
        self.max_note.load(Ordering::Relaxed)
    }

    /// `current / max` clamped to `[0, 1]`; zero when terminated.
    pub fn fraction(&self) -> f64 {
        let max = self.max_note();
        if max == 0 {
            return 0.0;
        }
        (self.current_note() as f64 / max as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_counters() {
        let progress = Progress::new();
        assert_eq!(progress.current_note(), 0);
        assert_eq!(progress.max_note(), 1);
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn test_pass_lifecycle() {
        let progress = Progress::new();
        progress.begin_pass(120);
        progress.set_current(30);
        assert_eq!(progress.fraction(), 0.25);

        progress.finish();
        assert_eq!(progress.current_note(), 0);
        assert_eq!(progress.max_note(), 0);
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn test_fraction_clamped() {
        let progress = Progress::new();
        progress.begin_pass(10);
        progress.set_current(15);
        assert_eq!(progress.fraction(), 1.0);
    }
}
