//! Per-instance stepping state machine.
//!
//! One call to [`Stepper::step`] is one frame. The step computes elapsed time,
//! derives the progress percent, applies the curve, reports the value through
//! the frame callback, and returns a [`StepOutcome`] telling the caller whether
//! to request another frame, stay suspended, or finish.
//!
//! ```text
//! Idle ──start──▶ Running ──pause──▶ Paused
//!                   ▲  │ ◀──play───────┘
//!                   │  ├── boundary, repeats left ──▶ Restarted (Running)
//!                   │  ├── boundary, no repeats ──▶ Completed
//!                   │  └── stop() observed ──▶ Halted (Completed)
//! ```
//!
//! Progress is always derived from absolute elapsed time, so frames that the
//! host skipped only need replaying (as *virtual* steps) to keep callers that
//! integrate over frames in sync; the percent itself never drifts.

use std::fmt;
use std::ops::ControlFlow;

use rune_config::AnimationConfig;

use crate::curve::TimingFn;
use crate::pause::PauseController;
use crate::registry::RunFlags;
use crate::types::AnimationId;

/// Frame-rate assumptions used for drop-frame compensation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub desired_fps: f64,
    pub max_catch_up_frames: u32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            desired_fps: 60.0,
            max_catch_up_frames: 4,
        }
    }
}

impl FrameTiming {
    pub fn from_config(config: &AnimationConfig) -> Self {
        Self {
            desired_fps: config.desired_fps,
            max_catch_up_frames: config.max_catch_up_frames,
        }
    }

    /// Milliseconds between two display refreshes.
    pub fn frame_interval(&self) -> f64 {
        1000.0 / self.desired_fps
    }
}

/// Completion report handed to the completion callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    /// Rough quality signal: desired fps minus dropped frames per second.
    pub estimated_fps: f64,
    pub animation_id: Option<AnimationId>,
    /// `true` when the run reached its end percent (or had no duration),
    /// `false` when it was stopped or ended early.
    pub finished: bool,
}

/// What the driver should do after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Keep going; request the next frame.
    Continue,
    /// Paused; no frame is requested until `play()`.
    Suspended,
    /// A cycle boundary was crossed and a new cycle begins; request the next frame.
    Restarted { iteration: i64, reversed: bool },
    /// Terminal decision at a cycle boundary. The run must be deregistered.
    Completed(Completion),
    /// `stop()` was observed; the run halts without rescheduling and must be
    /// deregistered.
    Halted(Completion),
}

impl StepOutcome {
    /// Whether the driver must schedule another frame.
    pub fn requests_frame(&self) -> bool {
        matches!(self, Self::Continue | Self::Restarted { .. })
    }
}

/// Mutable progress tracking for one run.
///
/// Copied from the descriptor at start time; later descriptor edits do not
/// reach an in-flight run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub start_percent: f64,
    pub end_percent: f64,
    pub delay: f64,
    pub duration: Option<f64>,
    /// `-1` repeats forever.
    pub repeat: i64,
    pub auto_reverse: bool,
    pub reverse: bool,
    pub iteration: i64,
    pub drop_counter: u32,
    pub percent: f64,
    /// Elapsed-time baseline (ms).
    pub start: f64,
    /// Clock value of the last rendered frame (ms).
    pub last_frame: f64,
}

impl RunState {
    pub fn new(
        now: f64,
        delay: f64,
        duration: Option<f64>,
        repeat: i64,
        reverse: bool,
        auto_reverse: bool,
    ) -> Self {
        let (start_percent, end_percent) = if reverse { (1.0, 0.0) } else { (0.0, 1.0) };
        Self {
            start_percent,
            end_percent,
            delay,
            duration,
            repeat,
            auto_reverse,
            reverse,
            iteration: 0,
            drop_counter: 0,
            percent: start_percent,
            start: now,
            last_frame: now,
        }
    }

    /// Recompute `percent` from the elapsed time at `now`.
    ///
    /// During the delay window, or without a (non-zero) duration, the
    /// previous percent is kept.
    fn advance(&mut self, now: f64) {
        let diff = now - self.start;
        let Some(duration) = self.duration.filter(|d| *d != 0.0 && !d.is_nan()) else {
            return;
        };
        if diff <= self.delay {
            return;
        }

        let raw = (diff - self.delay) / duration;
        self.percent = if self.reverse {
            (1.0 - raw).clamp(0.0, 1.0)
        } else {
            raw.min(1.0)
        };
    }

    fn at_end(&self) -> bool {
        self.percent == self.end_percent
    }
}

/// The per-instance state machine.
pub struct Stepper {
    state: RunState,
    curve: Option<TimingFn>,
    timing: FrameTiming,
}

impl fmt::Debug for Stepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stepper")
            .field("state", &self.state)
            .field("curve", &self.curve.as_ref().map(|_| ".."))
            .field("timing", &self.timing)
            .finish()
    }
}

impl Stepper {
    pub fn new(state: RunState, curve: Option<TimingFn>, timing: FrameTiming) -> Self {
        Self {
            state,
            curve,
            timing,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Current eased value.
    pub fn value(&self) -> f64 {
        match &self.curve {
            Some(curve) => curve(self.state.percent),
            None => self.state.percent,
        }
    }

    /// Run one frame at clock value `now`.
    ///
    /// `on_frame(value, time, render)` is called once per virtual catch-up
    /// step with `render == false`, then once for the real frame. Returning
    /// `ControlFlow::Break(())` from the real frame ends the current cycle
    /// as if the end percent had been reached.
    pub fn step<F>(
        &mut self,
        now: f64,
        flags: &RunFlags,
        pause: &mut PauseController,
        mut on_frame: F,
    ) -> StepOutcome
    where
        F: FnMut(f64, f64, bool) -> ControlFlow<()>,
    {
        if let Some(shift) = pause.take_resume_shift(now) {
            log::trace!("resuming after {shift:.1}ms pause");
            self.state.start += shift;
            self.state.last_frame = now;
        }

        if flags.is_paused {
            pause.save_state(now);
            return StepOutcome::Suspended;
        }

        if !flags.is_running {
            return StepOutcome::Halted(self.completion(now, flags.instance_id, false));
        }

        self.catch_up(now, &mut on_frame);

        self.state.advance(now);
        pause.finish_resume();

        let value = self.value();
        let flow = on_frame(value, now, true);
        if flow.is_break() || self.state.at_end() {
            return self.decide(now, flags.instance_id);
        }

        self.state.last_frame = now;
        StepOutcome::Continue
    }

    /// Replay up to `max_catch_up_frames` frames missed since the last
    /// rendered one, each at its own (earlier) clock value.
    fn catch_up<F>(&mut self, now: f64, on_frame: &mut F)
    where
        F: FnMut(f64, f64, bool) -> ControlFlow<()>,
    {
        let interval = self.timing.frame_interval();
        let dropped = ((now - self.state.last_frame) / interval).round() - 1.0;
        if dropped.is_nan() || dropped < 1.0 {
            return;
        }

        let replay = (dropped as u32).min(self.timing.max_catch_up_frames);
        log::debug!("{dropped} dropped frame(s), replaying {replay}");

        let base = self.state.last_frame;
        for j in 0..replay {
            let virtual_now = base + f64::from(j + 1) * interval;
            self.state.advance(virtual_now);
            let value = self.value();
            let _ = on_frame(value, virtual_now, false);
            self.state.drop_counter += 1;
        }
    }

    /// Continuation decision at a cycle boundary.
    fn decide(&mut self, now: f64, instance_id: Option<AnimationId>) -> StepOutcome {
        let state = &mut self.state;
        if state.repeat == -1 {
            self.restart(now)
        } else if state.iteration < state.repeat {
            state.iteration += 1;
            self.restart(now)
        } else if state.repeat == 0 && state.auto_reverse {
            self.restart(now)
        } else {
            let finished = state.at_end() || state.duration.is_none();
            StepOutcome::Completed(self.completion(now, instance_id, finished))
        }
    }

    /// Auto-reverse at the end percent, otherwise rewind to the start percent.
    fn restart(&mut self, now: f64) -> StepOutcome {
        let state = &mut self.state;
        if state.at_end() && state.auto_reverse {
            std::mem::swap(&mut state.start_percent, &mut state.end_percent);
            state.reverse = !state.reverse;
            if state.repeat == 0 {
                state.auto_reverse = false;
            }
        } else {
            state.percent = state.start_percent;
        }
        state.start = now;

        StepOutcome::Restarted {
            iteration: state.iteration,
            reversed: state.reverse,
        }
    }

    fn completion(&self, now: f64, animation_id: Option<AnimationId>, finished: bool) -> Completion {
        let elapsed_secs = (now - self.state.start) / 1000.0;
        let estimated_fps = if elapsed_secs > 0.0 {
            self.timing.desired_fps - f64::from(self.state.drop_counter) / elapsed_secs
        } else {
            self.timing.desired_fps
        };

        Completion {
            estimated_fps,
            animation_id,
            finished,
        }
    }
}
