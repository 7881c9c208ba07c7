//! Region-looping playback engine for a waveform viewer.
//!
//! This module provides:
//! - A [`Player`] that tracks an approximate play-head against an audio clock
//!   it cannot query, advancing it once per animation frame
//! - Play, pause, stop and seek with silent no-op guards for invalid states
//! - Looping over the span of the currently selected regions
//! - Variable rate and volume, with change events
//! - A software [`BufferGraph`] and, with the `playback` feature, a CPAL output
//!
//! # Example
//!
//! ```rust
//! use waveform_playback::playback::*;
//!
//! let frames = FrameQueue::new();
//! let clock = ManualClock::default();
//! let events = EventLog::new();
//! let context = PlayerContext::new(events.clone(), NoSelection, frames.clone(), clock.clone());
//!
//! let mut player = Player::new(PlaybackConfig::default(), context).unwrap();
//! player.init(BufferGraph::mono(vec![0.0; 48_000], 48_000).unwrap());
//! player.play(None, None);
//!
//! clock.advance(250.0);
//! for frame in frames.take_due() {
//!     player.on_frame(frame);
//! }
//! assert_eq!(player.current_time(), 0.25);
//! ```

pub mod buffer;
pub mod clock;
pub mod config;
pub mod events;
pub mod notify;
pub mod player;
pub mod state;
pub mod traits;

#[cfg(feature = "playback")]
pub mod output;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use buffer::{BufferGraph, BufferSource};
pub use clock::{FrameQueue, ManualClock, SystemClock};
pub use config::PlaybackConfig;
pub use events::{EventBus, EventLog, PlayerEvent, SubscriptionId};
pub use notify::{CycleId, EndedInbox, EndedListener};
pub use player::{Player, PlayerContext};
pub use state::{LoopWindow, PlaybackStatus, PlayerState, Region};
pub use traits::{
    AudioGraph, Clock, EventSink, FrameId, FrameScheduler, NoSelection, NullSink, OneShotSource,
    RegionSelection,
};

#[cfg(feature = "playback")]
pub use output::CpalOutput;
