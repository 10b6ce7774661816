//! Animation lifecycle events.
//!
//! The [`Animator`](crate::animator::Animator) records an event whenever an
//! animation starts, pauses, resumes, begins a new cycle, or ends. Hosts poll
//! them after each tick instead of wiring a callback per animation.
//!
//! # Usage
//!
//! ```ignore
//! animator.tick();
//! for event in animator.drain_events() {
//!     match event {
//!         AnimationEvent::Completed { animation_id, finished, .. } => {
//!             println!("{animation_id} done (finished: {finished})");
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::stepper::Completion;
use crate::types::AnimationId;

/// Event emitted when an animation changes state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationEvent {
    /// A fresh run was registered.
    Started {
        animation_id: AnimationId,
        name: Option<String>,
    },
    /// A frame observed the pause flag and suspended the run.
    Paused { animation_id: AnimationId, at: f64 },
    /// `play()` re-requested a frame for a suspended run.
    Resumed { animation_id: AnimationId },
    /// A cycle boundary was crossed and the run continues.
    Iteration {
        animation_id: AnimationId,
        /// Completed repeat count (`0` for infinite runs).
        iteration: i64,
        /// Direction of the cycle that begins now.
        reversed: bool,
    },
    /// The run reached its end.
    Completed {
        animation_id: AnimationId,
        estimated_fps: f64,
        finished: bool,
    },
    /// The run halted after `stop()`.
    Stopped {
        animation_id: AnimationId,
        estimated_fps: f64,
    },
}

impl AnimationEvent {
    /// Build the terminal event for a completion report.
    pub fn from_completion(animation_id: AnimationId, completion: &Completion, stopped: bool) -> Self {
        if stopped {
            Self::Stopped {
                animation_id,
                estimated_fps: completion.estimated_fps,
            }
        } else {
            Self::Completed {
                animation_id,
                estimated_fps: completion.estimated_fps,
                finished: completion.finished,
            }
        }
    }

    /// Get the animation ID for this event.
    pub fn animation_id(&self) -> AnimationId {
        match self {
            Self::Started { animation_id, .. }
            | Self::Paused { animation_id, .. }
            | Self::Resumed { animation_id }
            | Self::Iteration { animation_id, .. }
            | Self::Completed { animation_id, .. }
            | Self::Stopped { animation_id, .. } => *animation_id,
        }
    }

    /// Check if this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Stopped { .. })
    }
}

/// Events kept before the oldest ones are discarded.
pub const DEFAULT_EVENT_LIMIT: usize = 1024;

/// Queue for collecting animation events during ticks.
///
/// Hosts are expected to drain it after each tick. An undrained queue keeps
/// only the newest `limit` events.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<AnimationEvent>,
    limit: usize,
    discarded: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_limit(DEFAULT_EVENT_LIMIT)
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue holding at most `limit` events (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: VecDeque::new(),
            limit: limit.max(1),
            discarded: 0,
        }
    }

    pub fn push(&mut self, event: AnimationEvent) {
        if self.events.len() >= self.limit {
            self.events.pop_front();
            self.discarded += 1;
            if self.discarded == 1 {
                log::warn!("animation event queue full ({} events), discarding oldest", self.limit);
            }
        }
        self.events.push_back(event);
    }

    /// Number of events discarded because the queue was full.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<AnimationEvent> {
        self.events.pop_front()
    }

    /// Drain all events from the queue, returning an iterator.
    pub fn drain(&mut self) -> impl Iterator<Item = AnimationEvent> + '_ {
        self.events.drain(..)
    }

    /// Get events for a specific animation.
    pub fn events_for(&self, animation_id: AnimationId) -> Vec<&AnimationEvent> {
        self.events
            .iter()
            .filter(|e| e.animation_id() == animation_id)
            .collect()
    }
}
