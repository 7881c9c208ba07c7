//! End-of-source notification plumbing.
//!
//! A source reports that it ran out by calling [`EndedListener::notify`]. The
//! listener only pushes the cycle id into an [`EndedInbox`]; the player drains
//! the inbox on its own thread, so a source may signal from an audio callback.

use crossbeam::queue::SegQueue;
use std::sync::Arc;

/// Identifies one play cycle, i.e. one connected source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleId(pub(crate) u64);

impl CycleId {
    /// Raw counter value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Listener attached to a source for the lifetime of one play cycle.
#[derive(Debug, Clone)]
pub struct EndedListener {
    cycle: CycleId,
    queue: Arc<SegQueue<CycleId>>,
}

impl EndedListener {
    /// The cycle this listener belongs to.
    pub const fn cycle(&self) -> CycleId {
        self.cycle
    }

    /// Report that the source reached the end of its range.
    pub fn notify(&self) {
        self.queue.push(self.cycle);
    }
}

/// Receiving side of end-of-source notifications.
#[derive(Debug, Default)]
pub struct EndedInbox {
    queue: Arc<SegQueue<CycleId>>,
}

impl EndedInbox {
    /// Create an empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a listener that reports into this inbox for `cycle`.
    pub fn listener(&self, cycle: CycleId) -> EndedListener {
        EndedListener {
            cycle,
            queue: Arc::clone(&self.queue),
        }
    }

    /// Pop the oldest pending notification.
    pub fn pop(&self) -> Option<CycleId> {
        self.queue.pop()
    }

    /// Number of pending notifications.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check whether no notification is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
