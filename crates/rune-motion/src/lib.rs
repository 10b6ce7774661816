//! Frame-synchronized animation scheduler.
//!
//! This crate drives per-frame progress callbacks for declarative animations:
//! - **Curves**: named CSS timing functions, `cubic-bezier(...)` text, or custom functions
//! - **Registry**: process-wide table of running animation instances
//! - **Stepper**: per-instance state machine with drop-frame catch-up and
//!   repeat / reverse / auto-reverse handling
//! - **Pause/Resume**: start-time shifting so a pause never shows up as progress
//!
//! # Architecture
//!
//! ```text
//! Animator (host calls tick() once per display refresh)
//!   ├── FrameQueue      (pending frame requests, in request order)
//!   ├── AnimationRegistry
//!   ├── CurveLibrary
//!   └── Animation ── Stepper ── RunState
//!                └── PauseController
//! ```
//!
//! # Usage
//!
//! ```
//! use rune_motion::{Animation, AnimationOptions, Animator, ManualClock};
//!
//! let clock = ManualClock::new();
//! let mut animator = Animator::new(clock.clone());
//!
//! let options = AnimationOptions {
//!     duration: Some(100.0),
//!     repeat: 0,
//!     ..AnimationOptions::default()
//! };
//! let key = animator.insert(Animation::new(options).on_step(|value| {
//!     let _ = value; // render here
//! }));
//! animator.start(key).unwrap();
//!
//! for _ in 0..10 {
//!     clock.advance(16.0);
//!     animator.tick();
//! }
//! ```

pub mod animation;
pub mod animator;
pub mod clock;
pub mod curve;
pub mod easing;
pub mod error;
pub mod events;
pub mod pause;
pub mod registry;
pub mod scheduler;
pub mod stepper;
pub mod types;

pub use animation::{Animation, AnimationOptions, FrameContext};
pub use animator::{AnimationKey, Animator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use curve::{Curve, CurveLibrary, TimingFn};
pub use easing::{EasingFunction, StepPosition};
pub use error::{MotionError, Result};
pub use events::{AnimationEvent, EventQueue};
pub use pause::{PauseController, PauseSnapshot};
pub use registry::{AnimationRegistry, RunFlags};
pub use rune_config::AnimationConfig;
pub use scheduler::{FrameQueue, FrameScheduler, FrameToken};
pub use stepper::{Completion, FrameTiming, RunState, StepOutcome, Stepper};
pub use types::{AnimationId, AnimationState};
