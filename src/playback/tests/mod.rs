//! Scenario tests for the player.
//!
//! The fixtures here stand in for the waveform: a graph that records every call
//! made on it, a shared selection, a manual clock and a frame queue delivered by
//! [`Harness::tick`].

use super::{
    AudioGraph, EndedListener, EventLog, FrameQueue, ManualClock, OneShotSource, PlaybackConfig,
    Player, PlayerContext, PlayerEvent, Region,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::Arc;

mod loop_tests;

/// Arguments of one `start` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StartCall {
    pub when: f64,
    pub offset: f64,
    pub duration: f64,
}

#[derive(Debug)]
pub(crate) struct GraphLog {
    pub duration: f64,
    pub volume: f64,
    pub muted: bool,
    pub connects: usize,
    pub disconnects: usize,
    pub stops: usize,
    pub starts: Vec<StartCall>,
    pub native_rate: f64,
    pub listener: Option<EndedListener>,
    pub calls: Vec<&'static str>,
}

/// Audio graph that records what the player does to it.
#[derive(Debug, Clone)]
pub(crate) struct RecordingGraph {
    log: Arc<Mutex<GraphLog>>,
}

impl RecordingGraph {
    pub(crate) fn new(duration: f64) -> Self {
        Self {
            log: Arc::new(Mutex::new(GraphLog {
                duration,
                volume: 1.0,
                muted: false,
                connects: 0,
                disconnects: 0,
                stops: 0,
                starts: Vec::new(),
                native_rate: 1.0,
                listener: None,
                calls: Vec::new(),
            })),
        }
    }

    pub(crate) fn log(&self) -> MutexGuard<'_, GraphLog> {
        self.log.lock()
    }

    /// Simulate the live source running out. Returns false if no listener was attached.
    pub(crate) fn fire_ended(&self) -> bool {
        let listener = self.log.lock().listener.clone();
        listener.map(|l| l.notify()).is_some()
    }

    pub(crate) fn last_start(&self) -> Option<StartCall> {
        self.log.lock().starts.last().copied()
    }
}

impl AudioGraph for RecordingGraph {
    type Source = RecordingSource;

    fn duration(&self) -> f64 {
        self.log.lock().duration
    }

    fn volume(&self) -> f64 {
        self.log.lock().volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.log.lock().volume = volume;
    }

    fn is_muted(&self) -> bool {
        self.log.lock().muted
    }

    fn mute(&mut self) {
        self.log.lock().muted = true;
    }

    fn unmute(&mut self) {
        self.log.lock().muted = false;
    }

    fn connect(&mut self) -> RecordingSource {
        let mut log = self.log.lock();
        log.connects += 1;
        log.native_rate = 1.0;
        log.listener = None;
        log.calls.push("connect");
        RecordingSource {
            log: Arc::clone(&self.log),
        }
    }

    fn disconnect(&mut self) {
        let mut log = self.log.lock();
        log.disconnects += 1;
        log.calls.push("disconnect");
    }
}

#[derive(Debug)]
pub(crate) struct RecordingSource {
    log: Arc<Mutex<GraphLog>>,
}

impl OneShotSource for RecordingSource {
    fn start(&mut self, when: f64, offset: f64, duration: f64) {
        let mut log = self.log.lock();
        log.starts.push(StartCall {
            when,
            offset,
            duration,
        });
        log.calls.push("start");
    }

    fn stop(&mut self, _when: f64) {
        let mut log = self.log.lock();
        log.stops += 1;
        log.calls.push("stop");
    }

    fn playback_rate(&self) -> f64 {
        self.log.lock().native_rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.log.lock().native_rate = rate;
    }

    fn add_ended_listener(&mut self, listener: EndedListener) {
        let mut log = self.log.lock();
        log.listener = Some(listener);
        log.calls.push("add_listener");
    }

    fn remove_ended_listener(&mut self) {
        let mut log = self.log.lock();
        log.listener = None;
        log.calls.push("remove_listener");
    }
}

/// A player wired to recording collaborators.
pub(crate) struct Harness {
    pub player: Player<RecordingGraph>,
    pub graph: RecordingGraph,
    pub events: EventLog,
    pub frames: FrameQueue,
    pub clock: ManualClock,
    pub selection: Arc<RwLock<Vec<Region>>>,
}

impl Harness {
    /// Bound player over `duration` seconds of audio.
    pub(crate) fn new(duration: f64) -> Self {
        Self::with_config(PlaybackConfig::default(), duration)
    }

    pub(crate) fn with_config(config: PlaybackConfig, duration: f64) -> Self {
        let mut harness = Self::unbound(config);
        harness.graph = RecordingGraph::new(duration);
        harness.player.init(harness.graph.clone());
        harness
    }

    /// Player that has not been given any audio.
    pub(crate) fn unbound(config: PlaybackConfig) -> Self {
        let events = EventLog::new();
        let frames = FrameQueue::new();
        let clock = ManualClock::default();
        let selection = Arc::new(RwLock::new(Vec::new()));
        let context = PlayerContext::new(
            events.clone(),
            Arc::clone(&selection),
            frames.clone(),
            clock.clone(),
        );

        Self {
            player: Player::new(config, context).unwrap(),
            graph: RecordingGraph::new(0.0),
            events,
            frames,
            clock,
            selection,
        }
    }

    /// Advance the clock by `ms` and deliver every pending frame.
    pub(crate) fn tick(&mut self, ms: f64) {
        self.clock.advance(ms);
        for frame in self.frames.take_due() {
            self.player.on_frame(frame);
        }
    }

    /// Replace the selection.
    pub(crate) fn select(&self, regions: &[Region]) {
        *self.selection.write() = regions.to_vec();
    }

    /// Let the live source run out and deliver the notification.
    pub(crate) fn finish_source(&mut self) -> bool {
        let fired = self.graph.fire_ended();
        self.player.dispatch_notifications();
        fired
    }

    /// Positions published on `playing`, oldest first.
    pub(crate) fn playing_positions(&self) -> Vec<f64> {
        self.events
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::Playing(t) => Some(t),
                _ => None,
            })
            .collect()
    }
}
