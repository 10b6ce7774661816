//! Core identifier and state types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a running animation instance.
///
/// Allocated by the [`AnimationRegistry`](crate::registry::AnimationRegistry),
/// starting at 1 and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

impl AnimationId {
    /// Raw numeric value of the identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of an animation descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    /// Constructed but never started.
    #[default]
    Idle,
    /// Stepping once per frame.
    Running,
    /// Suspended until `play()`.
    Paused,
    /// Terminal; a new `start()` begins a fresh run.
    Completed,
}
