//! Registry of running animation instances.
//!
//! The registry is the single shared table of animation ids. It is an
//! explicit service object: one instance lives in the
//! [`Animator`](crate::animator::Animator) and is handed by reference to
//! every descriptor that starts or stops.

use std::collections::HashMap;

use crate::types::AnimationId;

/// Run-control flags a descriptor exposes to the registry and the stepper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    pub is_running: bool,
    pub is_paused: bool,
    /// Set once registered; never cleared because ids are never reclaimed.
    pub instance_id: Option<AnimationId>,
}

/// Table of animation ids with a monotonically increasing allocator.
#[derive(Debug, Clone)]
pub struct AnimationRegistry {
    running: HashMap<AnimationId, bool>,
    counter: u64,
    compaction_interval: u64,
    compactions: u64,
}

impl Default for AnimationRegistry {
    fn default() -> Self {
        Self::new(20)
    }
}

impl AnimationRegistry {
    /// Create a registry that compacts every `compaction_interval` allocations.
    ///
    /// An interval of 0 is treated as 1.
    pub fn new(compaction_interval: u64) -> Self {
        Self {
            running: HashMap::new(),
            counter: 1,
            compaction_interval: compaction_interval.max(1),
            compactions: 0,
        }
    }

    /// Allocate an id for a starting animation and mark it running.
    pub fn animation_started(&mut self, flags: &mut RunFlags) -> AnimationId {
        let id = AnimationId(self.counter);
        self.counter += 1;

        if id.0 % self.compaction_interval == 0 {
            self.compact();
        }

        self.running.insert(id, true);

        flags.is_running = true;
        flags.instance_id = Some(id);

        id
    }

    /// Mark an animation as no longer running.
    ///
    /// Only the instance flag is cleared; the id stays in the table.
    pub fn animation_stopped(&mut self, flags: &mut RunFlags) {
        flags.is_running = false;
    }

    /// Rebuild the table from the keys currently present.
    fn compact(&mut self) {
        let compacted: HashMap<AnimationId, bool> =
            self.running.keys().map(|id| (*id, true)).collect();
        log::debug!(
            "compacting animation registry ({} entries)",
            compacted.len()
        );
        self.running = compacted;
        self.compactions += 1;
    }

    /// Whether an id is present in the table.
    pub fn is_tracked(&self, id: AnimationId) -> bool {
        self.running.get(&id).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Number of compactions performed so far.
    pub fn compactions(&self) -> u64 {
        self.compactions
    }

    /// The most recently allocated id, if any.
    pub fn last_allocated(&self) -> Option<AnimationId> {
        (self.counter > 1).then(|| AnimationId(self.counter - 1))
    }
}
