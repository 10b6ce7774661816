//! Pause/resume bookkeeping for a single animation.
//!
//! `pause()` only raises a flag. The next frame that observes the flag saves
//! a [`PauseSnapshot`] and stops requesting frames. `play()` then marks an
//! unpause step; that step shifts the run's start time forward by the paused
//! interval so elapsed-time progress is unaffected.

/// Timing state frozen at the frame that observed the pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseSnapshot {
    /// Clock value (ms) of the frame that suspended the run.
    pub paused_at: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PauseController {
    snapshot: Option<PauseSnapshot>,
    unpause_pending: bool,
}

impl PauseController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the suspension point. The caller cancels any scheduled frame.
    pub fn save_state(&mut self, now: f64) {
        self.snapshot = Some(PauseSnapshot { paused_at: now });
    }

    /// Whether a suspended run is waiting to be resumed.
    pub fn has_continuation(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<PauseSnapshot> {
        self.snapshot
    }

    /// Flag the next step as the first one after unpausing.
    pub fn mark_unpause(&mut self) {
        self.unpause_pending = true;
    }

    pub fn is_unpause_pending(&self) -> bool {
        self.unpause_pending
    }

    /// Consume the snapshot on an unpause step, returning how far the start
    /// time must move forward.
    pub fn take_resume_shift(&mut self, now: f64) -> Option<f64> {
        if !self.unpause_pending {
            return None;
        }
        self.snapshot
            .take()
            .map(|snapshot| now - snapshot.paused_at)
    }

    /// Clear the one-shot unpause flag.
    pub fn finish_resume(&mut self) {
        self.unpause_pending = false;
    }

    /// Drop all pause state, e.g. when a fresh run starts.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
