//! Frame driver that owns every animation and its shared services.
//!
//! The host calls [`Animator::tick`] once per display refresh. Each tick runs
//! the frame requests made since the previous tick, in request order; frames
//! requested while a tick runs wait for the next one.

use std::collections::HashMap;

use rune_config::AnimationConfig;
use serde::{Deserialize, Serialize};

use crate::animation::{Animation, AnimationOptions, FrameContext};
use crate::clock::{Clock, ManualClock, SystemClock};
use crate::curve::CurveLibrary;
use crate::error::{MotionError, Result};
use crate::events::{AnimationEvent, EventQueue};
use crate::registry::AnimationRegistry;
use crate::scheduler::FrameQueue;
use crate::stepper::{FrameTiming, StepOutcome};
use crate::types::AnimationId;

/// Handle for an animation owned by an [`Animator`].
///
/// Unlike [`AnimationId`], a key is stable across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationKey(pub u64);

/// Owns animations, the registry, the curve library and the frame queue.
pub struct Animator<C: Clock = SystemClock> {
    clock: C,
    config: AnimationConfig,
    registry: AnimationRegistry,
    curves: CurveLibrary,
    frames: FrameQueue<AnimationKey>,
    animations: HashMap<AnimationKey, Animation>,
    next_key: u64,
    events: EventQueue,
    frame_count: u64,
}

impl Animator<SystemClock> {
    /// Animator on the wall clock with default settings.
    pub fn system() -> Self {
        Self::new(SystemClock::new())
    }
}

impl<C: Clock> Animator<C> {
    pub fn new(clock: C) -> Self {
        Self::build(clock, AnimationConfig::default())
    }

    /// Create an animator from validated configuration.
    pub fn with_config(clock: C, config: AnimationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(clock, config))
    }

    fn build(clock: C, config: AnimationConfig) -> Self {
        Self {
            clock,
            registry: AnimationRegistry::new(config.compaction_interval),
            config,
            curves: CurveLibrary::default(),
            frames: FrameQueue::new(),
            animations: HashMap::new(),
            next_key: 1,
            events: EventQueue::new(),
            frame_count: 0,
        }
    }

    /// Replace the curve library used by subsequent `start()` calls.
    pub fn with_curves(mut self, curves: CurveLibrary) -> Self {
        self.curves = curves;
        self
    }

    pub fn curves_mut(&mut self) -> &mut CurveLibrary {
        &mut self.curves
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    pub fn insert(&mut self, animation: Animation) -> AnimationKey {
        let key = AnimationKey(self.next_key);
        self.next_key += 1;
        self.animations.insert(key, animation);
        key
    }

    /// Build a descriptor from options, honoring the configured slow mode.
    pub fn create(&mut self, options: AnimationOptions) -> AnimationKey {
        let animation = Animation::with_config(options, &self.config);
        self.insert(animation)
    }

    /// Remove an animation and drop its pending frames. No completion is
    /// reported for a run removed mid-flight.
    pub fn remove(&mut self, key: AnimationKey) -> Option<Animation> {
        self.frames.cancel_key(key);
        self.animations.remove(&key)
    }

    pub fn get(&self, key: AnimationKey) -> Option<&Animation> {
        self.animations.get(&key)
    }

    pub fn get_mut(&mut self, key: AnimationKey) -> Option<&mut Animation> {
        self.animations.get_mut(&key)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn start(&mut self, key: AnimationKey) -> Result<AnimationId> {
        let now = self.clock.now();
        let animation = self
            .animations
            .get_mut(&key)
            .ok_or(MotionError::UnknownAnimation(key))?;

        let mut scheduler = self.frames.scoped(key);
        let mut ctx = FrameContext {
            now,
            scheduler: &mut scheduler,
            registry: &mut self.registry,
            curves: &self.curves,
            timing: FrameTiming::from_config(&self.config),
        };
        let id = animation.start(&mut ctx);

        self.events.push(AnimationEvent::Started {
            animation_id: id,
            name: animation.name.clone(),
        });
        Ok(id)
    }

    pub fn stop(&mut self, key: AnimationKey) -> Result<()> {
        self.animation_mut(key)?.stop();
        Ok(())
    }

    pub fn pause(&mut self, key: AnimationKey) -> Result<()> {
        self.animation_mut(key)?.pause();
        Ok(())
    }

    /// Resume a paused animation. Returns whether a frame was requested.
    pub fn play(&mut self, key: AnimationKey) -> Result<bool> {
        let animation = self
            .animations
            .get_mut(&key)
            .ok_or(MotionError::UnknownAnimation(key))?;

        let requested = animation.play(&mut self.frames.scoped(key));
        if requested && let Some(animation_id) = animation.instance_id() {
            self.events.push(AnimationEvent::Resumed { animation_id });
        }
        Ok(requested)
    }

    fn animation_mut(&mut self, key: AnimationKey) -> Result<&mut Animation> {
        self.animations
            .get_mut(&key)
            .ok_or(MotionError::UnknownAnimation(key))
    }

    /// Run one display refresh. Returns how many animations stepped.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let timing = FrameTiming::from_config(&self.config);
        let due = self.frames.take_due();
        self.frame_count += 1;

        let mut stepped = 0;
        for (_token, key) in due {
            let Some(animation) = self.animations.get_mut(&key) else {
                continue;
            };

            let mut scheduler = self.frames.scoped(key);
            let mut ctx = FrameContext {
                now,
                scheduler: &mut scheduler,
                registry: &mut self.registry,
                curves: &self.curves,
                timing,
            };
            let Some(outcome) = animation.run_frame(&mut ctx) else {
                continue;
            };
            stepped += 1;

            let Some(animation_id) = animation.instance_id() else {
                continue;
            };
            match outcome {
                StepOutcome::Continue => {}
                StepOutcome::Suspended => {
                    self.events.push(AnimationEvent::Paused {
                        animation_id,
                        at: now,
                    });
                }
                StepOutcome::Restarted { iteration, reversed } => {
                    self.events.push(AnimationEvent::Iteration {
                        animation_id,
                        iteration,
                        reversed,
                    });
                }
                StepOutcome::Completed(completion) => {
                    self.events
                        .push(AnimationEvent::from_completion(animation_id, &completion, false));
                }
                StepOutcome::Halted(completion) => {
                    self.events
                        .push(AnimationEvent::from_completion(animation_id, &completion, true));
                }
            }
        }

        log::trace!("tick {} at {now:.1}ms stepped {stepped}", self.frame_count);
        stepped
    }

    /// Whether any frame is waiting for the next tick.
    pub fn has_pending_frames(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Number of ticks run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Take the events recorded since the last drain. Call this after every
    /// tick; an undrained queue discards its oldest events once full.
    pub fn drain_events(&mut self) -> impl Iterator<Item = AnimationEvent> + '_ {
        self.events.drain()
    }
}

impl Animator<ManualClock> {
    /// Advance the manual clock by `ms` and tick once.
    pub fn advance(&mut self, ms: f64) -> usize {
        self.clock.advance(ms);
        self.tick()
    }

    /// Tick every `step_ms` until no frame is pending or `max_ticks` ran.
    /// Returns the number of ticks.
    pub fn run_until_idle(&mut self, step_ms: f64, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while self.has_pending_frames() && ticks < max_ticks {
            self.advance(step_ms);
            ticks += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnimationState;

    fn finite(duration: f64) -> AnimationOptions {
        AnimationOptions {
            duration: Some(duration),
            repeat: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let mut animator = Animator::new(ManualClock::new());
        let err = animator.start(AnimationKey(9)).unwrap_err();
        assert!(matches!(err, MotionError::UnknownAnimation(AnimationKey(9))));
        assert!(animator.stop(AnimationKey(9)).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnimationConfig {
            desired_fps: 0.0,
            ..Default::default()
        };
        assert!(Animator::with_config(ManualClock::new(), config).is_err());
    }

    #[test]
    fn test_run_to_completion_emits_events() {
        let mut animator = Animator::new(ManualClock::new());
        let key = animator.create(finite(100.0));
        let id = animator.start(key).unwrap();

        let ticks = animator.run_until_idle(10.0, 100);
        assert_eq!(ticks, 10);
        assert_eq!(animator.get(key).map(Animation::state), Some(AnimationState::Completed));
        assert_eq!(animator.get(key).and_then(Animation::instance_id), Some(id));

        let events: Vec<_> = animator.drain_events().collect();
        assert!(matches!(events.first(), Some(AnimationEvent::Started { .. })));
        assert!(matches!(
            events.last(),
            Some(AnimationEvent::Completed { finished: true, .. })
        ));
    }

    #[test]
    fn test_frames_requested_during_tick_wait() {
        let mut animator = Animator::new(ManualClock::new());
        let a = animator.create(AnimationOptions::default());
        let b = animator.create(AnimationOptions::default());
        animator.start(a).unwrap();
        animator.start(b).unwrap();

        assert_eq!(animator.advance(10.0), 2);
        // Each animation rescheduled exactly once.
        assert_eq!(animator.frames.len(), 2);
    }

    #[test]
    fn test_pause_and_play_events() {
        let mut animator = Animator::new(ManualClock::new());
        let key = animator.create(AnimationOptions::default());
        let id = animator.start(key).unwrap();
        animator.advance(10.0);

        animator.pause(key).unwrap();
        animator.advance(10.0);
        assert!(!animator.has_pending_frames());

        assert!(animator.play(key).unwrap());
        assert!(animator.has_pending_frames());

        let events: Vec<_> = animator.events().events_for(id).into_iter().cloned().collect();
        assert!(events.contains(&AnimationEvent::Paused {
            animation_id: id,
            at: 20.0
        }));
        assert!(events.contains(&AnimationEvent::Resumed { animation_id: id }));
    }

    #[test]
    fn test_stop_emits_stopped() {
        let mut animator = Animator::new(ManualClock::new());
        let key = animator.create(AnimationOptions::default());
        let id = animator.start(key).unwrap();
        animator.advance(10.0);

        animator.stop(key).unwrap();
        animator.advance(10.0);
        assert!(!animator.has_pending_frames());
        assert_eq!(animator.get(key).map(Animation::is_running), Some(false));
        assert_eq!(animator.get(key).and_then(Animation::instance_id), Some(id));
        assert!(
            animator
                .drain_events()
                .any(|e| matches!(e, AnimationEvent::Stopped { .. }))
        );
    }

    #[test]
    fn test_remove_cancels_frames() {
        let mut animator = Animator::new(ManualClock::new());
        let key = animator.create(AnimationOptions::default());
        animator.start(key).unwrap();

        assert!(animator.remove(key).is_some());
        assert!(!animator.has_pending_frames());
        assert_eq!(animator.advance(10.0), 0);
        assert!(animator.is_empty());
    }

    #[test]
    fn test_config_compaction_interval_reaches_registry() {
        let config = AnimationConfig {
            compaction_interval: 5,
            ..Default::default()
        };
        let mut animator = Animator::with_config(ManualClock::new(), config).unwrap();
        let key = animator.create(finite(10.0));
        for _ in 0..5 {
            animator.start(key).unwrap();
        }
        assert_eq!(animator.registry().compactions(), 1);
    }
}
