// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! # Waveform Playback
//!
//! The playback engine behind a waveform viewer: play, pause, stop and seek
//! over decoded audio, variable rate and volume, and looping over the span of
//! the regions the user has selected.
//!
//! ## Overview
//!
//! The native audio clock is not something the engine can read on demand.
//! Instead the [`Player`](playback::Player) keeps its own approximate position,
//! advancing it on every animation frame by the measured elapsed time scaled by
//! the playback rate. Loop restarts are driven by that position check rather
//! than by the end-of-source notification, so a new source is queued on the
//! same frame the play-head reaches the loop end.
//!
//! All collaborators are injected:
//!
//! - [`AudioGraph`](playback::AudioGraph) / [`OneShotSource`](playback::OneShotSource):
//!   the decoded audio and its single-use playable handles
//! - [`RegionSelection`](playback::RegionSelection): read when `play` is called
//! - [`EventSink`](playback::EventSink): receives `play`, `pause`, `seek`,
//!   `playing`, `playend`, `rateChanged`, `volumeChange` and `muted`
//! - [`FrameScheduler`](playback::FrameScheduler) and [`Clock`](playback::Clock):
//!   drive position updates, and can be simulated in tests
//!
//! ## Features
//!
//! - `playback`: open a CPAL output device that renders a
//!   [`BufferGraph`](playback::BufferGraph) (adds the `cpal` dependency)
//!
//! ## Error Handling
//!
//! Transport operations never fail. Calling them after `destroy`, before audio
//! is bound, or from the wrong state does nothing and publishes nothing. Only
//! setup paths return [`PlaybackResult`]:
//!
//! ```rust
//! use waveform_playback::{PlaybackError, playback::PlaybackConfig};
//!
//! match PlaybackConfig::default().with_rate(0.0).validate() {
//!     Err(PlaybackError::InvalidRate(rate)) => eprintln!("bad rate {rate}"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! ## License
//!
//! MIT License

mod error;
pub mod playback;

pub use crate::error::{PlaybackError, PlaybackResult};
