//! Animation descriptors.
//!
//! An [`Animation`] is the user-facing object: timing options, optional
//! callbacks, and the run-control operations `start`, `stop`, `pause` and
//! `play`. Starting copies the options into a fresh [`Stepper`], so editing a
//! descriptor mid-run only affects the next `start()`.
//!
//! Options can be built in code or deserialized from JSON:
//!
//! ```
//! use rune_motion::AnimationOptions;
//!
//! let options = AnimationOptions::from_json(
//!     r#"{ "duration": 300, "curve": "ease-in-out", "autoReverse": true }"#,
//! ).unwrap();
//! assert_eq!(options.duration, Some(300.0));
//! assert_eq!(options.repeat, -1);
//! ```

use std::fmt;
use std::ops::ControlFlow;

use rune_config::AnimationConfig;
use serde::{Deserialize, Serialize};

use crate::curve::{Curve, CurveLibrary};
use crate::error::Result;
use crate::pause::PauseController;
use crate::registry::{AnimationRegistry, RunFlags};
use crate::scheduler::{FrameScheduler, FrameToken};
use crate::stepper::{Completion, FrameTiming, RunState, StepOutcome, Stepper};
use crate::types::{AnimationId, AnimationState};

/// Called with the eased value on every rendered frame.
pub type StepHook = Box<dyn FnMut(f64)>;

/// Low-level frame hook: `(value, time, render)`. Break ends the cycle.
pub type FrameHook = Box<dyn FnMut(f64, f64, bool) -> ControlFlow<()>>;

/// Called once when a run ends.
pub type CompleteHook = Box<dyn FnMut(&Completion)>;

/// Declarative animation options.
///
/// Missing JSON fields take the defaults below; `"duration": null` leaves the
/// duration unset, which holds the animation at its start percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationOptions {
    pub name: Option<String>,
    /// Opaque target reference, passed through untouched.
    pub el: Option<String>,
    /// Curve name or `cubic-bezier(x1, y1, x2, y2)`.
    pub curve: String,
    pub duration: Option<f64>,
    pub delay: f64,
    /// Extra cycles after the first; `-1` repeats forever.
    pub repeat: i64,
    pub reverse: bool,
    pub auto_reverse: bool,
    pub use_slow_animations: bool,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            name: None,
            el: None,
            curve: "linear".to_string(),
            duration: Some(500.0),
            delay: 0.0,
            repeat: -1,
            reverse: false,
            auto_reverse: false,
            use_slow_animations: false,
        }
    }
}

impl AnimationOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Everything a descriptor needs from its driver for one operation.
pub struct FrameContext<'a> {
    /// Clock value (ms) for this operation.
    pub now: f64,
    pub scheduler: &'a mut dyn FrameScheduler,
    pub registry: &'a mut AnimationRegistry,
    pub curves: &'a CurveLibrary,
    pub timing: FrameTiming,
}

/// A single animation descriptor.
pub struct Animation {
    pub name: Option<String>,
    pub el: Option<String>,
    pub curve: Curve,
    pub duration: Option<f64>,
    pub delay: f64,
    pub repeat: i64,
    pub reverse: bool,
    pub auto_reverse: bool,

    flags: RunFlags,
    pause: PauseController,
    stepper: Option<Stepper>,
    pending_frame: Option<FrameToken>,
    completed: bool,

    on_step: Option<StepHook>,
    on_frame: Option<FrameHook>,
    on_complete: Option<CompleteHook>,
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("name", &self.name)
            .field("el", &self.el)
            .field("curve", &self.curve)
            .field("duration", &self.duration)
            .field("delay", &self.delay)
            .field("repeat", &self.repeat)
            .field("reverse", &self.reverse)
            .field("auto_reverse", &self.auto_reverse)
            .field("flags", &self.flags)
            .field("stepper", &self.stepper)
            .field("pending_frame", &self.pending_frame)
            .finish_non_exhaustive()
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::new(AnimationOptions::default())
    }
}

impl Animation {
    pub fn new(options: AnimationOptions) -> Self {
        Self::with_config(options, &AnimationConfig::default())
    }

    /// Build a descriptor, applying the slow-animation factor when either
    /// the options or the config ask for it.
    pub fn with_config(options: AnimationOptions, config: &AnimationConfig) -> Self {
        let mut duration = options.duration;
        let mut delay = options.delay;

        if options.use_slow_animations || config.use_slow_animations {
            let factor = config.slow_factor;
            log::warn!(
                "Running animation {} with SLOW animations (duration and delay increased by {factor}x)",
                options.name.as_deref().unwrap_or("<unnamed>"),
            );
            delay *= factor;
            duration = duration.map(|d| d * factor);
        }

        Self {
            curve: Curve::from(options.curve.as_str()),
            name: options.name,
            el: options.el,
            duration,
            delay,
            repeat: options.repeat,
            reverse: options.reverse,
            auto_reverse: options.auto_reverse,
            flags: RunFlags::default(),
            pause: PauseController::new(),
            stepper: None,
            pending_frame: None,
            completed: false,
            on_step: None,
            on_frame: None,
            on_complete: None,
        }
    }

    pub fn with_curve(mut self, curve: impl Into<Curve>) -> Self {
        self.curve = curve.into();
        self
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_repeat(mut self, repeat: i64) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_auto_reverse(mut self, auto_reverse: bool) -> Self {
        self.auto_reverse = auto_reverse;
        self
    }

    pub fn on_step(mut self, hook: impl FnMut(f64) + 'static) -> Self {
        self.on_step = Some(Box::new(hook));
        self
    }

    pub fn on_frame(mut self, hook: impl FnMut(f64, f64, bool) -> ControlFlow<()> + 'static) -> Self {
        self.on_frame = Some(Box::new(hook));
        self
    }

    pub fn on_complete(mut self, hook: impl FnMut(&Completion) + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.el.as_deref())
            .unwrap_or("<unnamed>")
    }

    /// Begin a fresh run and request its first frame.
    ///
    /// Starting an animation that is already running cancels its pending
    /// frame and replaces the run under a new id.
    pub fn start(&mut self, ctx: &mut FrameContext<'_>) -> AnimationId {
        if let Some(token) = self.pending_frame.take() {
            ctx.scheduler.cancel_frame(token);
        }

        let curve = ctx.curves.resolve(&self.curve, self.duration);
        let state = RunState::new(
            ctx.now,
            self.delay,
            self.duration,
            self.repeat,
            self.reverse,
            self.auto_reverse,
        );
        self.stepper = Some(Stepper::new(state, Some(curve), ctx.timing));
        self.pause.reset();
        self.completed = false;

        let id = ctx.registry.animation_started(&mut self.flags);
        log::info!("Starting animation {} as {id}", self.label());

        self.pending_frame = Some(ctx.scheduler.request_frame());
        id
    }

    /// Ask the run to halt. The next frame observes it and completes with
    /// `finished == false`.
    pub fn stop(&mut self) {
        self.flags.is_running = false;
    }

    /// Ask the run to suspend. The next frame observes it and stops
    /// requesting frames.
    pub fn pause(&mut self) {
        self.flags.is_paused = true;
    }

    /// Clear the pause flag, re-requesting a frame if a frame already
    /// suspended the run. Returns whether a frame was requested.
    pub fn play(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        self.flags.is_paused = false;
        if !self.pause.has_continuation() {
            return false;
        }

        self.pause.mark_unpause();
        if let Some(token) = self.pending_frame.take() {
            scheduler.cancel_frame(token);
        }
        self.pending_frame = Some(scheduler.request_frame());
        true
    }

    /// Run one frame. Returns `None` when there is no live run.
    pub fn run_frame(&mut self, ctx: &mut FrameContext<'_>) -> Option<StepOutcome> {
        self.pending_frame = None;
        if self.completed {
            return None;
        }
        let stepper = self.stepper.as_mut()?;

        let on_step = &mut self.on_step;
        let on_frame = &mut self.on_frame;
        let outcome = stepper.step(ctx.now, &self.flags, &mut self.pause, |value, now, render| {
            if render && let Some(hook) = on_step.as_mut() {
                hook(value);
            }
            match on_frame.as_mut() {
                Some(hook) => hook(value, now, render),
                None => ControlFlow::Continue(()),
            }
        });

        match outcome {
            StepOutcome::Continue | StepOutcome::Restarted { .. } => {
                self.pending_frame = Some(ctx.scheduler.request_frame());
            }
            StepOutcome::Suspended => {
                log::debug!("Animation {} suspended at {:.1}ms", self.label(), ctx.now);
            }
            StepOutcome::Completed(completion) | StepOutcome::Halted(completion) => {
                ctx.registry.animation_stopped(&mut self.flags);
                self.completed = true;
                log::info!(
                    "Finished animation {} (finished: {}, fps: {:.1})",
                    self.label(),
                    completion.finished,
                    completion.estimated_fps,
                );
                if let Some(hook) = self.on_complete.as_mut() {
                    hook(&completion);
                }
            }
        }

        Some(outcome)
    }

    pub fn state(&self) -> AnimationState {
        if self.stepper.is_none() {
            AnimationState::Idle
        } else if self.completed {
            AnimationState::Completed
        } else if self.flags.is_paused {
            AnimationState::Paused
        } else {
            AnimationState::Running
        }
    }

    /// Current percent of the live (or last) run.
    pub fn progress(&self) -> Option<f64> {
        self.stepper.as_ref().map(|s| s.state().percent)
    }

    /// Current eased value of the live (or last) run.
    pub fn value(&self) -> Option<f64> {
        self.stepper.as_ref().map(Stepper::value)
    }

    pub fn iteration(&self) -> Option<i64> {
        self.stepper.as_ref().map(|s| s.state().iteration)
    }

    pub fn run_state(&self) -> Option<&RunState> {
        self.stepper.as_ref().map(Stepper::state)
    }

    pub fn instance_id(&self) -> Option<AnimationId> {
        self.flags.instance_id
    }

    pub fn is_running(&self) -> bool {
        self.flags.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.flags.is_paused
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::FrameQueue;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Harness {
        queue: FrameQueue<()>,
        registry: AnimationRegistry,
        curves: CurveLibrary,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                queue: FrameQueue::new(),
                registry: AnimationRegistry::default(),
                curves: CurveLibrary::default(),
            }
        }

        fn start(&mut self, animation: &mut Animation, now: f64) -> AnimationId {
            let mut scheduler = self.queue.scoped(());
            let mut ctx = FrameContext {
                now,
                scheduler: &mut scheduler,
                registry: &mut self.registry,
                curves: &self.curves,
                timing: FrameTiming::default(),
            };
            animation.start(&mut ctx)
        }

        /// Run the frame only if one is pending, like a real host would.
        fn frame(&mut self, animation: &mut Animation, now: f64) -> Option<StepOutcome> {
            if self.queue.take_due().is_empty() {
                return None;
            }
            let mut scheduler = self.queue.scoped(());
            let mut ctx = FrameContext {
                now,
                scheduler: &mut scheduler,
                registry: &mut self.registry,
                curves: &self.curves,
                timing: FrameTiming::default(),
            };
            animation.run_frame(&mut ctx)
        }
    }

    #[test]
    fn test_option_defaults() {
        let options = AnimationOptions::default();
        assert_eq!(options.curve, "linear");
        assert_eq!(options.duration, Some(500.0));
        assert_eq!(options.delay, 0.0);
        assert_eq!(options.repeat, -1);
        assert!(!options.reverse);
        assert!(!options.auto_reverse);
    }

    #[test]
    fn test_options_from_json() {
        let options = AnimationOptions::from_json(
            r#"{ "name": "fade", "el": "div#box", "duration": null, "delay": 20, "repeat": 2, "useSlowAnimations": true }"#,
        )
        .unwrap();
        assert_eq!(options.name.as_deref(), Some("fade"));
        assert_eq!(options.el.as_deref(), Some("div#box"));
        assert_eq!(options.duration, None);
        assert_eq!(options.delay, 20.0);
        assert_eq!(options.repeat, 2);
        assert!(options.use_slow_animations);

        assert!(AnimationOptions::from_json("{ \"repeat\": \"forever\" }").is_err());
    }

    #[test]
    fn test_slow_animations_scale_duration_and_delay() {
        let options = AnimationOptions {
            duration: Some(200.0),
            delay: 10.0,
            use_slow_animations: true,
            ..Default::default()
        };
        let animation = Animation::new(options);
        assert_eq!(animation.duration, Some(600.0));
        assert_eq!(animation.delay, 30.0);
    }

    #[test]
    fn test_config_forces_slow_animations() {
        let config = AnimationConfig {
            use_slow_animations: true,
            slow_factor: 2.0,
            ..Default::default()
        };
        let options = AnimationOptions {
            duration: Some(100.0),
            ..Default::default()
        };
        let animation = Animation::with_config(options, &config);
        assert_eq!(animation.duration, Some(200.0));
    }

    #[test]
    fn test_start_requests_first_frame() {
        let mut harness = Harness::new();
        let mut animation = Animation::default();
        assert_eq!(animation.state(), AnimationState::Idle);

        let id = harness.start(&mut animation, 0.0);
        assert_eq!(id, AnimationId(1));
        assert_eq!(animation.instance_id(), Some(id));
        assert!(animation.is_running());
        assert!(animation.pending_frame().is_some());
        assert_eq!(harness.queue.len(), 1);
        assert!(harness.registry.is_tracked(id));
    }

    #[test]
    fn test_restart_cancels_pending_frame() {
        let mut harness = Harness::new();
        let mut animation = Animation::default();
        let first = harness.start(&mut animation, 0.0);
        let second = harness.start(&mut animation, 5.0);

        assert_ne!(first, second);
        assert_eq!(harness.queue.len(), 1);
    }

    #[test]
    fn test_hooks_receive_values_and_completion() {
        let mut harness = Harness::new();
        let values = Rc::new(RefCell::new(Vec::new()));
        let done = Rc::new(RefCell::new(None));

        let options = AnimationOptions {
            duration: Some(100.0),
            repeat: 0,
            ..Default::default()
        };
        let mut animation = Animation::new(options)
            .on_step({
                let values = values.clone();
                move |v| values.borrow_mut().push(v)
            })
            .on_complete({
                let done = done.clone();
                move |c| *done.borrow_mut() = Some(*c)
            });

        let id = harness.start(&mut animation, 0.0);
        harness.frame(&mut animation, 10.0);
        harness.frame(&mut animation, 20.0);
        let outcome = harness.frame(&mut animation, 120.0);

        assert!(matches!(outcome, Some(StepOutcome::Completed(_))));
        assert_eq!(animation.state(), AnimationState::Completed);
        assert!(!animation.is_running());
        // Stopping clears the instance flag only; the id stays in the table.
        assert!(harness.registry.is_tracked(id));
        assert!(harness.queue.is_empty());

        let values = values.borrow();
        assert_eq!(values.first(), Some(&0.1));
        assert_eq!(values.last(), Some(&1.0));

        let completion = done.borrow().expect("completion hook");
        assert!(completion.finished);
        assert_eq!(completion.animation_id, Some(id));
    }

    #[test]
    fn test_step_hook_skips_catch_up_frames() {
        let mut harness = Harness::new();
        let rendered = Rc::new(RefCell::new(Vec::new()));
        let replayed = Rc::new(RefCell::new(0u32));

        let mut animation = Animation::new(AnimationOptions {
            duration: Some(1000.0),
            ..Default::default()
        })
        .on_step({
            let rendered = rendered.clone();
            move |v| rendered.borrow_mut().push(v)
        })
        .on_frame({
            let replayed = replayed.clone();
            move |_, _, render| {
                if !render {
                    *replayed.borrow_mut() += 1;
                }
                ControlFlow::Continue(())
            }
        });

        harness.start(&mut animation, 0.0);
        harness.frame(&mut animation, 10.0);
        harness.frame(&mut animation, 110.0);

        assert_eq!(*rendered.borrow(), vec![0.01, 0.11]);
        assert_eq!(*replayed.borrow(), 4);
    }

    #[test]
    fn test_missing_hooks_are_noops() {
        let mut harness = Harness::new();
        let mut animation = Animation::new(AnimationOptions {
            duration: Some(50.0),
            repeat: 0,
            ..Default::default()
        });
        harness.start(&mut animation, 0.0);
        harness.frame(&mut animation, 10.0);
        let outcome = harness.frame(&mut animation, 60.0);
        assert!(matches!(outcome, Some(StepOutcome::Completed(_))));
    }

    #[test]
    fn test_descriptor_edits_do_not_reach_live_run() {
        let mut harness = Harness::new();
        let mut animation = Animation::new(AnimationOptions {
            duration: Some(100.0),
            ..Default::default()
        });
        harness.start(&mut animation, 0.0);
        animation.duration = Some(1000.0);
        animation.reverse = true;

        harness.frame(&mut animation, 10.0);
        assert_eq!(animation.progress(), Some(0.1));
    }

    #[test]
    fn test_stop_completes_unfinished_on_next_frame() {
        let mut harness = Harness::new();
        let mut animation = Animation::default();
        harness.start(&mut animation, 0.0);
        harness.frame(&mut animation, 10.0);

        animation.stop();
        let outcome = harness.frame(&mut animation, 20.0);
        match outcome {
            Some(StepOutcome::Halted(completion)) => assert!(!completion.finished),
            other => panic!("expected halt, got {other:?}"),
        }
        assert!(harness.queue.is_empty());
        assert_eq!(harness.frame(&mut animation, 30.0), None);
    }

    #[test]
    fn test_pause_and_play() {
        let mut harness = Harness::new();
        let mut animation = Animation::new(AnimationOptions {
            duration: Some(1000.0),
            ..Default::default()
        });
        harness.start(&mut animation, 0.0);
        harness.frame(&mut animation, 10.0);

        animation.pause();
        assert_eq!(animation.state(), AnimationState::Paused);
        assert_eq!(harness.frame(&mut animation, 20.0), Some(StepOutcome::Suspended));
        assert!(harness.queue.is_empty());

        let resumed = animation.play(&mut harness.queue.scoped(()));
        assert!(resumed);
        assert_eq!(harness.queue.len(), 1);

        harness.frame(&mut animation, 520.0);
        assert_eq!(animation.run_state().map(|s| s.start), Some(500.0));
        assert_eq!(animation.progress(), Some(0.02));
    }

    #[test]
    fn test_play_before_suspension_keeps_pending_frame() {
        let mut harness = Harness::new();
        let mut animation = Animation::default();
        harness.start(&mut animation, 0.0);

        animation.pause();
        let resumed = animation.play(&mut harness.queue.scoped(()));
        assert!(!resumed);
        assert_eq!(harness.queue.len(), 1);
        assert_eq!(harness.frame(&mut animation, 10.0), Some(StepOutcome::Continue));
    }

    #[test]
    fn test_frame_hook_break_ends_cycle() {
        let mut harness = Harness::new();
        let mut animation = Animation::new(AnimationOptions {
            duration: Some(100.0),
            repeat: 0,
            ..Default::default()
        })
        .on_frame(|value, _, _| {
            if value >= 0.2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        harness.start(&mut animation, 0.0);
        assert_eq!(harness.frame(&mut animation, 10.0), Some(StepOutcome::Continue));
        let outcome = harness.frame(&mut animation, 20.0);
        assert!(matches!(outcome, Some(StepOutcome::Completed(Completion { finished: false, .. }))));
    }
}
