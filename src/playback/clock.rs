//! Clocks and a host-driven frame scheduler.

use super::traits::{Clock, FrameId, FrameScheduler};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Wall clock measured from when it was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock that only moves when told to. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// Create a clock reading `start_ms`.
    pub fn starting_at(start_ms: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(start_ms)),
        }
    }

    /// Move forward by `ms` milliseconds.
    pub fn advance(&self, ms: f64) {
        *self.now.lock() += ms;
    }

    /// Jump to an absolute reading.
    pub fn set(&self, ms: f64) {
        *self.now.lock() = ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        *self.now.lock()
    }
}

#[derive(Debug, Default)]
struct QueueInner {
    next_id: u64,
    pending: BTreeSet<FrameId>,
    cancelled: u64,
}

/// Frame scheduler whose frames are delivered by the host's own loop.
///
/// The player requests frames through one handle; the host holds a clone and
/// periodically calls [`take_due`](Self::take_due), passing each id to
/// [`Player::on_frame`](super::Player::on_frame).
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl FrameQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every pending frame, oldest first.
    pub fn take_due(&self) -> Vec<FrameId> {
        let mut inner = self.inner.lock();
        std::mem::take(&mut inner.pending).into_iter().collect()
    }

    /// Number of frames waiting for delivery.
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Number of requests withdrawn before delivery.
    pub fn cancelled(&self) -> u64 {
        self.inner.lock().cancelled
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameId {
        let mut inner = self.inner.lock();
        let id = FrameId(inner.next_id);
        inner.next_id += 1;
        inner.pending.insert(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        let mut inner = self.inner.lock();
        if inner.pending.remove(&id) {
            inner.cancelled += 1;
        }
    }
}
