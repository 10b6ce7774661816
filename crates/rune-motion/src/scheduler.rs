//! Frame request plumbing.
//!
//! [`FrameScheduler`] is the host primitive the descriptor talks to: request
//! one callback on the next display refresh, or cancel a pending one. The
//! continuation is implicit; each descriptor is handed a scheduler already
//! bound to itself (see [`FrameQueue::scoped`]).

use serde::{Deserialize, Serialize};

/// Handle for one pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameToken(pub u64);

/// Request/cancel a per-refresh callback for the bound continuation.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;

    /// Cancel a pending request. Unknown or already-run tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Ordered queue of frame requests keyed by continuation.
///
/// Requests run in the order they were made. [`FrameQueue::take_due`] hands
/// out everything requested so far; requests made while those run wait for
/// the next frame.
#[derive(Debug, Clone)]
pub struct FrameQueue<K> {
    pending: Vec<(FrameToken, K)>,
    next_token: u64,
}

impl<K> Default for FrameQueue<K> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_token: 1,
        }
    }
}

impl<K: Copy + PartialEq> FrameQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, key: K) -> FrameToken {
        let token = FrameToken(self.next_token);
        self.next_token += 1;
        self.pending.push((token, key));
        token
    }

    pub fn cancel(&mut self, token: FrameToken) {
        self.pending.retain(|(t, _)| *t != token);
    }

    /// Drop every pending request for `key`.
    pub fn cancel_key(&mut self, key: K) {
        self.pending.retain(|(_, k)| *k != key);
    }

    /// Take all requests made so far, in request order.
    pub fn take_due(&mut self) -> Vec<(FrameToken, K)> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self, token: FrameToken) -> bool {
        self.pending.iter().any(|(t, _)| *t == token)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// A [`FrameScheduler`] whose requests run `key`.
    pub fn scoped(&mut self, key: K) -> ScopedScheduler<'_, K> {
        ScopedScheduler { queue: self, key }
    }
}

/// A [`FrameQueue`] bound to one continuation key.
#[derive(Debug)]
pub struct ScopedScheduler<'a, K> {
    queue: &'a mut FrameQueue<K>,
    key: K,
}

impl<K: Copy + PartialEq> FrameScheduler for ScopedScheduler<'_, K> {
    fn request_frame(&mut self) -> FrameToken {
        self.queue.request(self.key)
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.queue.cancel(token);
    }
}
