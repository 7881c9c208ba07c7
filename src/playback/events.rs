//! Events published by the player and a synchronous bus to deliver them.
//!
//! Delivery is in call order, unbuffered, and reaches exactly the subscribers
//! registered at the moment of emission. Nothing is replayed to late subscribers.

use super::traits::EventSink;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Channel name for [`PlayerEvent::Play`].
pub const PLAY: &str = "play";
/// Channel name for [`PlayerEvent::Pause`].
pub const PAUSE: &str = "pause";
/// Channel name for [`PlayerEvent::Seek`].
pub const SEEK: &str = "seek";
/// Channel name for [`PlayerEvent::Playing`].
pub const PLAYING: &str = "playing";
/// Channel name for [`PlayerEvent::PlayEnd`].
pub const PLAYEND: &str = "playend";
/// Channel name for [`PlayerEvent::RateChanged`].
pub const RATE_CHANGED: &str = "rateChanged";
/// Channel name for [`PlayerEvent::VolumeChange`].
pub const VOLUME_CHANGE: &str = "volumeChange";
/// Channel name for [`PlayerEvent::Muted`].
pub const MUTED: &str = "muted";

/// A notification published by the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Playback started (or restarted for a new loop cycle)
    Play,
    /// Playback paused by the caller or at natural end
    Pause,
    /// Position was set explicitly, in seconds
    Seek(f64),
    /// Position advanced on a tick, in seconds
    Playing(f64),
    /// One-shot playback reached its natural end
    #[serde(rename = "playend")]
    PlayEnd,
    /// Playback rate changed to the given multiplier
    RateChanged(f64),
    /// Volume changed to the given gain
    VolumeChange(f64),
    /// Mute flag changed
    Muted(bool),
}

impl PlayerEvent {
    /// The channel name this event is published on.
    pub const fn channel(&self) -> &'static str {
        match self {
            Self::Play => PLAY,
            Self::Pause => PAUSE,
            Self::Seek(_) => SEEK,
            Self::Playing(_) => PLAYING,
            Self::PlayEnd => PLAYEND,
            Self::RateChanged(_) => RATE_CHANGED,
            Self::VolumeChange(_) => VOLUME_CHANGE,
            Self::Muted(_) => MUTED,
        }
    }

    /// The argument list carried with the event. Booleans are sent as 0 or 1.
    pub fn args(&self) -> Vec<f64> {
        match *self {
            Self::Play | Self::Pause | Self::PlayEnd => Vec::new(),
            Self::Seek(t) | Self::Playing(t) => vec![t],
            Self::RateChanged(v) | Self::VolumeChange(v) => vec![v],
            Self::Muted(m) => vec![if m { 1.0 } else { 0.0 }],
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&PlayerEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    channel: Option<&'static str>,
    callback: Callback,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Synchronous publish/subscribe bus for [`PlayerEvent`]s.
///
/// Cloning yields another handle to the same bus, so a host can keep one
/// handle for subscribing while the player owns another for emitting.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event.
    pub fn subscribe_all<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(callback))
    }

    /// Subscribe to a single channel, e.g. [`SEEK`].
    pub fn subscribe<F>(&self, channel: &'static str, callback: F) -> SubscriptionId
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.register(Some(channel), Arc::new(callback))
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id);
        inner.subscribers.len() != before
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    fn register(&self, channel: Option<&'static str>, callback: Callback) -> SubscriptionId {
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            channel,
            callback,
        });
        id
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: &PlayerEvent) {
        // Snapshot under the lock, call outside it: callbacks may subscribe or
        // unsubscribe without deadlocking, and only affect later emissions.
        let targets: Vec<Callback> = {
            let inner = self.inner.lock();
            inner
                .subscribers
                .iter()
                .filter(|s| s.channel.is_none_or(|c| c == event.channel()))
                .map(|s| Arc::clone(&s.callback))
                .collect()
        };

        for callback in targets {
            callback(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// An [`EventSink`] that records everything it is given.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<PlayerEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded event, oldest first.
    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<PlayerEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Channel names of the recorded events, oldest first.
    pub fn channels(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(PlayerEvent::channel).collect()
    }

    /// Number of recorded events on `channel`.
    pub fn count(&self, channel: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.channel() == channel)
            .count()
    }

    /// Check whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &PlayerEvent) {
        self.events.lock().push(*event);
    }
}
