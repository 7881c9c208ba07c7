//! Engine data model: play-head state, loop windows and selected regions.

use serde::{Deserialize, Serialize};

/// A selected region on the waveform, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Region start in seconds
    pub start: f64,
    /// Region end in seconds
    pub end: f64,
}

impl Region {
    /// Create a region spanning `start..end` seconds.
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// The `[start, end]` range playback is restricted to and repeated within.
///
/// This is a copied value taken when `play` runs, never a live view of the
/// selection it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopWindow {
    /// Loop start in seconds
    pub start: f64,
    /// Loop end in seconds
    pub end: f64,
}

impl LoopWindow {
    /// Compute the window covering every region, bounded to `[0, duration]`.
    ///
    /// Returns `None` for an empty selection, and for a selection that covers
    /// no time at all once bounded (a zero-length window cannot loop).
    pub fn spanning(regions: &[Region], duration: f64) -> Option<Self> {
        let (start, end) = regions.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(start, end), region| (start.min(region.start), end.max(region.end)),
        );

        let start = start.clamp(0.0, duration);
        let end = end.clamp(0.0, duration);

        // Also catches the empty fold, where start stays +inf before clamping.
        (!regions.is_empty() && end > start).then_some(Self { start, end })
    }

    /// Length of the window in seconds.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Clamp `time` into the window.
    pub fn clamp(&self, time: f64) -> f64 {
        time.clamp(self.start, self.end)
    }

    /// Check whether `time` lies within the window (inclusive).
    pub fn contains(&self, time: f64) -> bool {
        (self.start..=self.end).contains(&time)
    }
}

/// Coarse playback state as seen by a UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Nothing has been played yet, or playback was stopped
    Idle,
    /// A source is running
    Playing,
    /// Paused by the caller
    Paused,
    /// The last one-shot playback ran to its natural end
    Ended,
}

impl PlaybackStatus {
    /// Check if `play` would start playback from this status
    pub const fn can_play(self) -> bool {
        !matches!(self, Self::Playing)
    }

    /// Check if `pause` would have any effect from this status
    pub const fn can_pause(self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Mutable state owned by a single [`Player`](super::Player).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// True iff a source is actively running
    pub playing: bool,
    /// True iff the last one-shot playback reached its natural end
    pub ended: bool,
    /// True iff a source is attached to the audio graph
    pub connected: bool,
    /// True after `pause` until the next `play` or `stop`
    pub paused: bool,
    /// Approximate play-head position in seconds
    pub current_time: f64,
    /// Playback speed multiplier, always > 0
    pub rate: f64,
    /// Active loop window, if looping
    pub loop_window: Option<LoopWindow>,
    /// Clock reading (ms) of the last position update
    pub last_tick_ms: f64,
}

impl PlayerState {
    /// Fresh idle state at position zero.
    pub const fn new(rate: f64) -> Self {
        Self {
            playing: false,
            ended: false,
            connected: false,
            paused: false,
            current_time: 0.0,
            rate,
            loop_window: None,
            last_tick_ms: 0.0,
        }
    }

    /// Derive the coarse status from the flags.
    pub const fn status(&self) -> PlaybackStatus {
        if self.playing {
            PlaybackStatus::Playing
        } else if self.ended {
            PlaybackStatus::Ended
        } else if self.paused {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Idle
        }
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_window_spans_all_regions() {
        let regions = [Region::new(2.0, 5.0), Region::new(3.0, 8.0)];
        let window = LoopWindow::spanning(&regions, 10.0).unwrap();
        assert_eq!(window, LoopWindow { start: 2.0, end: 8.0 });
        assert_eq!(window.length(), 6.0);
    }

    #[test]
    fn test_loop_window_empty_selection() {
        assert!(LoopWindow::spanning(&[], 10.0).is_none());
    }

    #[test]
    fn test_loop_window_bounded_by_duration() {
        let regions = [Region::new(-1.0, 4.0), Region::new(6.0, 14.0)];
        let window = LoopWindow::spanning(&regions, 10.0).unwrap();
        assert_eq!(window, LoopWindow { start: 0.0, end: 10.0 });
    }

    #[test]
    fn test_loop_window_zero_length_is_not_a_loop() {
        let regions = [Region::new(4.0, 4.0)];
        assert!(LoopWindow::spanning(&regions, 10.0).is_none());

        // Entirely past the end of the audio.
        let regions = [Region::new(12.0, 15.0)];
        assert!(LoopWindow::spanning(&regions, 10.0).is_none());
    }

    #[test]
    fn test_loop_window_clamp() {
        let window = LoopWindow { start: 2.0, end: 8.0 };
        assert_eq!(window.clamp(1.0), 2.0);
        assert_eq!(window.clamp(5.5), 5.5);
        assert_eq!(window.clamp(9.0), 8.0);
        assert!(window.contains(8.0));
        assert!(!window.contains(8.1));
    }

    #[test]
    fn test_status_derivation() {
        let mut state = PlayerState::default();
        assert_eq!(state.status(), PlaybackStatus::Idle);

        state.paused = true;
        assert_eq!(state.status(), PlaybackStatus::Paused);

        state.ended = true;
        assert_eq!(state.status(), PlaybackStatus::Ended);

        state.playing = true;
        assert_eq!(state.status(), PlaybackStatus::Playing);
        assert!(!state.status().can_play());
        assert!(state.status().can_pause());
    }
}
