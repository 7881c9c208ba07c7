//! Seams between the player and the world around it.
//!
//! The player owns none of the audio machinery. It drives an [`AudioGraph`]
//! that hands out single-use [`OneShotSource`]s, reads a [`RegionSelection`]
//! when playback starts, publishes through an [`EventSink`], and advances its
//! play-head on frames requested from a [`FrameScheduler`] and timed with a
//! [`Clock`].

use super::events::PlayerEvent;
use super::notify::EndedListener;
use super::state::Region;

/// The audio resource the player is bound to once decoding has finished.
pub trait AudioGraph {
    /// Source handle produced by [`connect`](Self::connect).
    type Source: OneShotSource;

    /// Length of the loaded audio in seconds.
    fn duration(&self) -> f64;

    /// Current gain.
    fn volume(&self) -> f64;

    /// Set the gain.
    fn set_volume(&mut self, volume: f64);

    /// Check the mute flag.
    fn is_muted(&self) -> bool;

    /// Silence output without touching the gain.
    fn mute(&mut self);

    /// Restore output at the current gain.
    fn unmute(&mut self);

    /// Create a fresh source attached to the graph's output.
    ///
    /// Every call yields a new handle; previous handles must not be reused.
    fn connect(&mut self) -> Self::Source;

    /// Detach the graph's output after the current source has been stopped.
    fn disconnect(&mut self);
}

/// A playable handle that can be started and stopped exactly once.
pub trait OneShotSource {
    /// Begin playback `when` seconds from now, at `offset` seconds into the
    /// audio, for `duration` seconds of audio.
    fn start(&mut self, when: f64, offset: f64, duration: f64);

    /// Stop playback `when` seconds from now.
    fn stop(&mut self, when: f64);

    /// Current native rate multiplier.
    fn playback_rate(&self) -> f64;

    /// Change the native rate without interrupting playback.
    fn set_playback_rate(&mut self, rate: f64);

    /// Attach the listener to notify when the started range is exhausted.
    fn add_ended_listener(&mut self, listener: EndedListener);

    /// Detach the ended listener, if any. Must be called before [`stop`](Self::stop).
    fn remove_ended_listener(&mut self);
}

/// Read-only view of the regions currently selected by the user.
pub trait RegionSelection {
    /// Snapshot of the selected regions, in selection order.
    fn selected(&self) -> Vec<Region>;
}

/// Receiver for player events. Delivery must be synchronous.
pub trait EventSink {
    /// Publish one event.
    fn emit(&self, event: &PlayerEvent);
}

/// Identifies one requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Host facility that calls back once per display refresh.
///
/// The host answers a request by calling
/// [`Player::on_frame`](super::Player::on_frame) with the returned id.
pub trait FrameScheduler {
    /// Ask for one callback on the next frame.
    fn request_frame(&mut self) -> FrameId;

    /// Withdraw a pending request. Cancelling a delivered or unknown id is a no-op.
    fn cancel_frame(&mut self, id: FrameId);
}

/// Monotonic time source in milliseconds.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> f64;
}

impl RegionSelection for Vec<Region> {
    fn selected(&self) -> Vec<Region> {
        self.clone()
    }
}

impl<T: RegionSelection + ?Sized> RegionSelection for std::sync::Arc<T> {
    fn selected(&self) -> Vec<Region> {
        (**self).selected()
    }
}

impl<T: RegionSelection + ?Sized> RegionSelection for parking_lot::RwLock<T> {
    fn selected(&self) -> Vec<Region> {
        self.read().selected()
    }
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn emit(&self, event: &PlayerEvent) {
        (**self).emit(event);
    }
}

/// Selection that never has anything selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSelection;

impl RegionSelection for NoSelection {
    fn selected(&self) -> Vec<Region> {
        Vec::new()
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &PlayerEvent) {}
}
