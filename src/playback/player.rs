//! The playback engine.
//!
//! [`Player`] keeps an approximate play-head in step with an audio graph whose
//! clock it cannot read. Position is advanced on every animation frame from the
//! measured elapsed time and the current rate, which trades a few milliseconds
//! of drift for an update that never allocates or touches the audio thread.
//!
//! Each play cycle connects exactly one single-use source. Seeking while
//! playing, and every loop restart, tears that source down and connects a new
//! one rather than repositioning it.

use super::{
    config::{PlaybackConfig, is_valid_rate, is_valid_volume},
    events::PlayerEvent,
    notify::{CycleId, EndedInbox},
    state::{LoopWindow, PlaybackStatus, PlayerState},
    traits::{
        AudioGraph, Clock, EventSink, FrameId, FrameScheduler, OneShotSource, RegionSelection,
    },
};
use crate::error::PlaybackResult;
use tracing::{debug, info, trace, warn};

/// The waveform-side collaborators a [`Player`] is constructed with.
pub struct PlayerContext {
    events: Box<dyn EventSink>,
    selection: Box<dyn RegionSelection>,
    scheduler: Box<dyn FrameScheduler>,
    clock: Box<dyn Clock>,
}

impl PlayerContext {
    /// Bundle the collaborators.
    pub fn new(
        events: impl EventSink + 'static,
        selection: impl RegionSelection + 'static,
        scheduler: impl FrameScheduler + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            events: Box::new(events),
            selection: Box::new(selection),
            scheduler: Box::new(scheduler),
            clock: Box::new(clock),
        }
    }
}

/// Range handed to a fresh source: start offset and length, both in seconds.
#[derive(Debug, Clone, Copy)]
struct PlayRange {
    offset: f64,
    length: Option<f64>,
}

/// Playback engine with region looping for a waveform viewer.
///
/// Every operation is a silent no-op when it cannot apply: after
/// [`destroy`](Self::destroy), before [`init`](Self::init) has bound audio, or
/// from the wrong state (e.g. [`pause`](Self::pause) while not playing).
pub struct Player<G: AudioGraph> {
    config: PlaybackConfig,
    context: PlayerContext,
    graph: Option<G>,
    source: Option<G::Source>,
    state: PlayerState,
    frame: Option<FrameId>,
    cycle: Option<CycleId>,
    cycles_started: u64,
    inbox: EndedInbox,
    destroyed: bool,
}

impl<G: AudioGraph> Player<G> {
    /// Create an unbound player.
    pub fn new(config: PlaybackConfig, context: PlayerContext) -> PlaybackResult<Self> {
        config.validate()?;

        Ok(Self {
            state: PlayerState::new(config.rate),
            config,
            context,
            graph: None,
            source: None,
            frame: None,
            cycle: None,
            cycles_started: 0,
            inbox: EndedInbox::new(),
            destroyed: false,
        })
    }

    /// Bind decoded audio. Rebinding stops whatever the previous graph was doing.
    pub fn init(&mut self, mut graph: G) {
        if self.destroyed {
            debug!("init ignored: player destroyed");
            return;
        }
        if self.graph.is_some() {
            self.stop();
        }

        graph.set_volume(self.config.volume);
        if self.config.muted {
            graph.mute();
        }

        info!(duration = graph.duration(), "audio bound to player");
        self.graph = Some(graph);
        self.state.current_time = 0.0;
        self.state.ended = false;
        self.state.paused = false;
    }

    // ---- Time & rate ----

    /// Length of the bound audio in seconds, 0 when unbound.
    pub fn duration(&self) -> f64 {
        self.graph.as_ref().map_or(0.0, G::duration)
    }

    /// Approximate position in seconds as of the last update.
    pub const fn current_time(&self) -> f64 {
        self.state.current_time
    }

    /// Set the position directly, optionally publishing a `seek` event.
    ///
    /// The value is bounded to `[0, duration]`. While a loop is playing, a
    /// position outside the loop window moves to the loop start, as
    /// [`seek`](Self::seek) does. The running source is not restarted.
    pub fn set_current_time(&mut self, value: f64, notify: bool) {
        if self.destroyed {
            return;
        }
        if !value.is_finite() {
            warn!(value, "ignoring non-finite position");
            return;
        }

        let mut target = value.clamp(0.0, self.duration());
        let playing = self.state.playing;
        let outside = self
            .state
            .loop_window
            .filter(|window| playing && !window.contains(target));
        if let Some(window) = outside {
            debug!(target, start = window.start, "position outside loop, moving to loop start");
            target = window.start;
        }
        self.assign_time(target, notify);
    }

    /// Tracked playback rate.
    ///
    /// If the live source's native rate has drifted from it, the tracked value
    /// is written back to the source first.
    pub fn rate(&mut self) -> f64 {
        let rate = self.state.rate;
        if let Some(source) = self.source.as_mut() {
            let native = source.playback_rate();
            if native != rate {
                trace!(native, rate, "restoring native playback rate");
                source.set_playback_rate(rate);
            }
        }
        rate
    }

    /// Change the playback rate without interrupting playback.
    ///
    /// Publishes `rateChanged` only when the value actually changes.
    pub fn set_rate(&mut self, value: f64) {
        if self.destroyed {
            debug!("set_rate ignored: player destroyed");
            return;
        }
        if !is_valid_rate(value) {
            warn!(value, "ignoring invalid playback rate");
            return;
        }

        // Bank the time played so far at the old rate.
        if self.state.playing {
            self.advance_position();
        }

        let changed = self.state.rate != value;
        self.state.rate = value;

        if let Some(source) = self.source.as_mut() {
            source.set_playback_rate(value);
        }
        if changed {
            self.emit(PlayerEvent::RateChanged(value));
        }
    }

    /// Current gain, 1 when unbound.
    pub fn volume(&self) -> f64 {
        self.graph.as_ref().map_or(1.0, G::volume)
    }

    /// Change the gain, publishing `volumeChange` only on an actual change.
    pub fn set_volume(&mut self, value: f64) {
        if self.destroyed {
            return;
        }
        if !is_valid_volume(value) {
            warn!(value, "ignoring invalid volume");
            return;
        }
        let Some(graph) = self.graph.as_mut() else {
            return;
        };

        let changed = graph.volume() != value;
        graph.set_volume(value);
        if changed {
            self.emit(PlayerEvent::VolumeChange(value));
        }
    }

    /// Whether output is muted. Independent of the volume.
    pub fn is_muted(&self) -> bool {
        self.graph.as_ref().is_some_and(G::is_muted)
    }

    /// Mute or unmute, publishing `muted` only on an actual change.
    pub fn set_muted(&mut self, muted: bool) {
        if self.destroyed {
            return;
        }
        let Some(graph) = self.graph.as_mut() else {
            return;
        };
        if graph.is_muted() == muted {
            return;
        }

        if muted {
            graph.mute();
        } else {
            graph.unmute();
        }
        let now_muted = graph.is_muted();
        self.emit(PlayerEvent::Muted(now_muted));
    }

    // ---- State machine ----

    /// Start playback.
    ///
    /// With a non-empty selection, playback loops over the span of the selected
    /// regions starting from the current position clamped into it. Otherwise it
    /// plays from `from` (or the current position) to `to` (or the end).
    /// After a natural end, playback restarts from `from` or zero.
    pub fn play(&mut self, from: Option<f64>, to: Option<f64>) {
        if self.destroyed || !self.status().can_play() || self.graph.is_none() {
            debug!(
                destroyed = self.destroyed,
                playing = self.state.playing,
                bound = self.graph.is_some(),
                "play ignored"
            );
            return;
        }

        if self.state.ended {
            self.reposition(from.unwrap_or(0.0));
        }

        let range = self.play_selection(from, to);
        self.play_range(range);
    }

    /// Pause playback, keeping the position. Clears the active loop.
    pub fn pause(&mut self) {
        if self.destroyed || !self.status().can_pause() || self.graph.is_none() {
            debug!(playing = self.state.playing, "pause ignored");
            return;
        }

        self.cancel_frame();
        self.disconnect_source();
        self.state.playing = false;
        self.state.paused = true;
        self.state.loop_window = None;

        self.emit(PlayerEvent::Pause);
        self.emit(PlayerEvent::Seek(self.state.current_time));
    }

    /// Halt playback silently. Clears the active loop.
    pub fn stop(&mut self) {
        if self.destroyed {
            return;
        }

        self.cancel_frame();
        self.disconnect_source();
        self.state.playing = false;
        self.state.paused = false;
        self.state.loop_window = None;
    }

    /// Move the play-head, restarting the source when playing.
    pub fn seek(&mut self, time: f64) {
        if self.destroyed || self.graph.is_none() {
            debug!("seek ignored");
            return;
        }
        if !time.is_finite() {
            warn!(time, "ignoring non-finite seek target");
            return;
        }

        let target = time.clamp(0.0, self.duration());
        self.reposition(target);

        if self.state.playing {
            self.update_playback();
        }
    }

    /// Tear down the active source and release the audio for good.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.stop();
        self.disconnect_source();
        self.source = None;
        self.graph = None;
        while self.inbox.pop().is_some() {}
        self.destroyed = true;

        info!("player destroyed");
    }

    // ---- Host re-entry points ----

    /// Deliver an animation frame previously requested from the scheduler.
    ///
    /// Queued end-of-source notifications are handled first, so a host that
    /// only delivers frames still sees playback end. Frames that were
    /// cancelled, or that belong to an earlier request, are ignored.
    pub fn on_frame(&mut self, id: FrameId) {
        if self.frame != Some(id) {
            trace!(frame = id.0, "ignoring stale frame");
            return;
        }
        self.frame = None;

        if self.destroyed {
            return;
        }
        self.dispatch_notifications();
        self.watch();
    }

    /// React to the source of `cycle` reaching the end of its range.
    ///
    /// Only the live cycle counts. While a loop is active the notification is
    /// dropped, since loop restarts are driven by the position check.
    pub fn handle_source_ended(&mut self, cycle: CycleId) {
        if self.destroyed || self.cycle != Some(cycle) {
            trace!(cycle = cycle.get(), "ignoring ended notification from stale cycle");
            return;
        }
        if self.state.loop_window.is_some() {
            return;
        }

        self.state.ended = true;
        self.update_current_time(true);
        self.pause();
        self.emit(PlayerEvent::PlayEnd);
    }

    /// Feed every queued end-of-source notification to
    /// [`handle_source_ended`](Self::handle_source_ended).
    pub fn dispatch_notifications(&mut self) {
        while let Some(cycle) = self.inbox.pop() {
            self.handle_source_ended(cycle);
        }
    }

    // ---- Introspection ----

    /// Whether a source is running.
    pub const fn is_playing(&self) -> bool {
        self.state.playing
    }

    /// Whether the last one-shot playback ran to its end.
    pub const fn is_ended(&self) -> bool {
        self.state.ended
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether audio is bound.
    pub const fn is_bound(&self) -> bool {
        self.graph.is_some()
    }

    /// Coarse playback status.
    pub const fn status(&self) -> PlaybackStatus {
        self.state.status()
    }

    /// The loop window in effect, if looping.
    pub const fn active_loop(&self) -> Option<LoopWindow> {
        self.state.loop_window
    }

    /// The live play cycle, if a source is connected.
    pub const fn current_cycle(&self) -> Option<CycleId> {
        self.cycle
    }

    /// Full engine state.
    pub const fn state(&self) -> &PlayerState {
        &self.state
    }

    /// The bound graph.
    pub const fn graph(&self) -> Option<&G> {
        self.graph.as_ref()
    }

    // ---- Loop controller ----

    fn play_selection(&mut self, from: Option<f64>, to: Option<f64>) -> PlayRange {
        let duration = self.duration();
        let selected = self.context.selection.selected();
        self.state.loop_window = LoopWindow::spanning(&selected, duration);

        match self.state.loop_window {
            Some(window) => {
                let offset = window.clamp(self.state.current_time);
                trace!(start = window.start, end = window.end, offset, "looping selection");
                PlayRange {
                    offset,
                    length: Some(window.end - offset),
                }
            }
            None => {
                let offset = from.unwrap_or(self.state.current_time).clamp(0.0, duration);
                PlayRange {
                    offset,
                    length: to.map(|to| (to - offset).max(0.0)),
                }
            }
        }
    }

    fn update_loop(&mut self, time: f64) {
        if self.destroyed {
            return;
        }
        let Some(window) = self.state.loop_window else {
            return;
        };

        if time >= window.end {
            trace!(start = window.start, end = window.end, "loop restart");
            self.reposition(window.start);
            self.state.playing = false;
            self.play(None, None);
        }
    }

    // ---- Playback internals ----

    fn update_playback(&mut self) {
        let range = self.play_selection(None, None);
        self.play_source(range);
    }

    fn play_range(&mut self, range: PlayRange) {
        if range.offset != self.state.current_time {
            self.reposition(range.offset);
        }
        self.play_source(range);
        self.emit(PlayerEvent::Play);
    }

    fn play_source(&mut self, range: PlayRange) {
        self.cancel_frame();
        self.state.last_tick_ms = self.context.clock.now_ms();
        self.recreate_source();

        if self.source.is_none() {
            return;
        }
        self.state.playing = true;
        self.state.paused = false;

        let (offset, length) = match self.state.loop_window {
            Some(window) => {
                if !window.contains(self.state.current_time) {
                    self.reposition(window.start);
                }
                let offset = window.clamp(self.state.current_time);
                (offset, window.end - offset)
            }
            None => {
                let remaining = self.duration() - range.offset;
                (range.offset, range.length.unwrap_or(remaining))
            }
        };

        let rate = self.state.rate;
        let listener = self.cycle.map(|cycle| self.inbox.listener(cycle));
        if let Some(source) = self.source.as_mut() {
            source.set_playback_rate(rate);
            source.start(0.0, offset, length.max(0.0));
            if let Some(listener) = listener {
                source.add_ended_listener(listener);
            }
        }
        trace!(offset, length, rate, "source started");

        self.watch();
    }

    fn watch(&mut self) {
        if !self.state.playing {
            return;
        }

        self.update_current_time(false);
        self.update_loop(self.state.current_time);

        // A loop restart inside update_loop has already scheduled its own frame.
        if self.state.playing && self.frame.is_none() {
            self.frame = Some(self.context.scheduler.request_frame());
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(id) = self.frame.take() {
            self.context.scheduler.cancel_frame(id);
        }
    }

    /// Position setter used by transport operations: clears `ended` and
    /// publishes `seek`.
    fn reposition(&mut self, value: f64) {
        self.state.ended = false;
        self.assign_time(value.clamp(0.0, self.duration()), true);
    }

    fn assign_time(&mut self, value: f64, notify: bool) {
        self.state.current_time = value;
        if notify {
            self.emit(PlayerEvent::Seek(value));
        }
    }

    fn advance_position(&mut self) {
        let now = self.context.clock.now_ms();
        let rate = self.rate();
        let elapsed = ((now - self.state.last_tick_ms) / 1000.0 * rate).max(0.0);
        self.state.last_tick_ms = now;

        let end = self
            .state
            .loop_window
            .map_or_else(|| self.duration(), |window| window.end);
        self.state.current_time = (self.state.current_time + elapsed).clamp(0.0, end);
    }

    fn update_current_time(&mut self, force_to_end: bool) {
        if force_to_end {
            self.state.last_tick_ms = self.context.clock.now_ms();
            self.state.current_time = self.duration();
        } else {
            self.advance_position();
        }
        trace!(position = self.state.current_time, "tick");
        self.emit(PlayerEvent::Playing(self.state.current_time));
    }

    // ---- Audio graph lifecycle ----

    fn recreate_source(&mut self) {
        if self.state.connected {
            self.disconnect_source();
        }
        self.connect_source();
    }

    fn connect_source(&mut self) {
        if self.destroyed || self.state.connected {
            return;
        }
        let Some(graph) = self.graph.as_mut() else {
            return;
        };

        self.source = Some(graph.connect());
        self.state.connected = true;
        self.cycles_started += 1;
        self.cycle = Some(CycleId(self.cycles_started));
        trace!(cycle = self.cycles_started, "source connected");
    }

    fn disconnect_source(&mut self) {
        if self.destroyed || !self.state.connected {
            return;
        }
        let Some(graph) = self.graph.as_mut() else {
            return;
        };

        self.state.connected = false;
        self.cycle = None;
        if let Some(mut source) = self.source.take() {
            source.remove_ended_listener();
            source.stop(0.0);
        }
        graph.disconnect();
        trace!("source disconnected");
    }

    fn emit(&self, event: PlayerEvent) {
        self.context.events.emit(&event);
    }
}

impl<G: AudioGraph> Drop for Player<G> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<G: AudioGraph> std::fmt::Debug for Player<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("state", &self.state)
            .field("bound", &self.graph.is_some())
            .field("cycle", &self.cycle)
            .field("frame", &self.frame)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
