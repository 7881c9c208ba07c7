//! In-memory software audio graph.
//!
//! [`BufferGraph`] holds decoded interleaved `f32` PCM and plays it through a
//! gain stage, one [`BufferSource`] voice at a time. Output is pulled with
//! [`BufferGraph::render`], from a device callback or from a test.

use super::{
    notify::EndedListener,
    traits::{AudioGraph, OneShotSource},
};
use crate::error::{PlaybackError, PlaybackResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoiceState {
    /// Connected, not started yet
    Pending,
    /// Waiting out the `when` delay, in output frames
    Scheduled,
    Running,
    /// Range exhausted or stopped; the handle is spent
    Finished,
}

#[derive(Debug)]
struct Voice {
    id: u64,
    state: VoiceState,
    /// Read position in source frames
    cursor: f64,
    /// Source frame at which the started range ends
    end_frame: f64,
    rate: f64,
    delay_secs: f64,
    stop_after_secs: Option<f64>,
    listener: Option<EndedListener>,
}

impl Voice {
    const fn new(id: u64) -> Self {
        Self {
            id,
            state: VoiceState::Pending,
            cursor: 0.0,
            end_frame: 0.0,
            rate: 1.0,
            delay_secs: 0.0,
            stop_after_secs: None,
            listener: None,
        }
    }

    fn finish(&mut self, notify: bool) {
        self.state = VoiceState::Finished;
        if let Some(listener) = self.listener.take() {
            if notify {
                listener.notify();
            }
        }
    }
}

#[derive(Debug)]
struct GraphShared {
    samples: Arc<[f32]>,
    channels: usize,
    sample_rate: u32,
    gain: f64,
    muted: bool,
    connected: bool,
    voice: Option<Voice>,
    voices_created: u64,
}

impl GraphShared {
    fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    fn live_voice(&mut self, id: u64) -> Option<&mut Voice> {
        self.voice.as_mut().filter(|v| v.id == id)
    }

    /// Linearly interpolated sample of `channel` at fractional `frame`.
    fn sample_at(&self, frame: f64, channel: usize) -> f32 {
        let frames = self.frames();
        let index = frame.floor() as usize;
        if index >= frames {
            return 0.0;
        }
        let frac = (frame - index as f64) as f32;
        let a = self.samples[index * self.channels + channel];
        let b = if index + 1 < frames {
            self.samples[(index + 1) * self.channels + channel]
        } else {
            a
        };
        a + (b - a) * frac
    }
}

/// A decoded buffer behind a gain stage, playable through single-use sources.
///
/// Clones are handles to the same graph; an output device keeps one to render
/// while the player owns another.
#[derive(Debug, Clone)]
pub struct BufferGraph {
    shared: Arc<Mutex<GraphShared>>,
}

impl BufferGraph {
    /// Wrap interleaved samples.
    ///
    /// # Errors
    /// Fails if `channels` or `sample_rate` is zero, or if `samples` does not
    /// hold a whole number of frames.
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> PlaybackResult<Self> {
        if channels == 0 {
            return Err(PlaybackError::invalid_buffer("channel count must be > 0"));
        }
        if sample_rate == 0 {
            return Err(PlaybackError::invalid_buffer("sample rate must be > 0"));
        }
        if samples.len() % channels != 0 {
            return Err(PlaybackError::invalid_buffer(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self {
            shared: Arc::new(Mutex::new(GraphShared {
                samples: samples.into(),
                channels,
                sample_rate,
                gain: 1.0,
                muted: false,
                connected: false,
                voice: None,
                voices_created: 0,
            })),
        })
    }

    /// Mono buffer convenience constructor.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> PlaybackResult<Self> {
        Self::new(samples, 1, sample_rate)
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.shared.lock().channels
    }

    /// Sample rate of the buffer.
    pub fn sample_rate(&self) -> u32 {
        self.shared.lock().sample_rate
    }

    /// Whether a source is currently attached.
    pub fn is_connected(&self) -> bool {
        self.shared.lock().connected
    }

    /// Whether the live voice is producing sound.
    pub fn is_voice_running(&self) -> bool {
        self.shared
            .lock()
            .voice
            .as_ref()
            .is_some_and(|v| v.state == VoiceState::Running)
    }

    /// Fill `output` with interleaved frames of `out_channels` channels at
    /// `out_rate` Hz, advancing the live voice.
    ///
    /// Source channels are mapped onto output channels by wrapping, so mono
    /// feeds every output channel.
    pub fn render(&self, output: &mut [f32], out_channels: usize, out_rate: u32) {
        output.fill(0.0);
        if out_channels == 0 || out_rate == 0 {
            return;
        }

        let mut shared = self.shared.lock();
        if !shared.connected {
            return;
        }

        let gain = if shared.muted { 0.0 } else { shared.gain as f32 };
        let src_channels = shared.channels;
        let ratio = f64::from(shared.sample_rate) / f64::from(out_rate);
        let out_frame_secs = 1.0 / f64::from(out_rate);

        let Some(mut voice) = shared.voice.take() else {
            return;
        };

        for frame in output.chunks_mut(out_channels) {
            match voice.state {
                VoiceState::Pending | VoiceState::Finished => break,
                VoiceState::Scheduled => {
                    voice.delay_secs -= out_frame_secs;
                    if voice.delay_secs <= 0.0 {
                        voice.state = VoiceState::Running;
                    }
                    continue;
                }
                VoiceState::Running => {}
            }

            if let Some(remaining) = voice.stop_after_secs.as_mut() {
                *remaining -= out_frame_secs;
                if *remaining <= 0.0 {
                    voice.finish(false);
                    break;
                }
            }

            if voice.cursor >= voice.end_frame {
                trace!(voice = voice.id, "buffer source reached end of range");
                voice.finish(true);
                break;
            }

            for (ch, out) in frame.iter_mut().enumerate() {
                *out = shared.sample_at(voice.cursor, ch % src_channels) * gain;
            }
            voice.cursor += voice.rate * ratio;
        }

        // A voice that ran out exactly on the last frame reports on this pass.
        if voice.state == VoiceState::Running && voice.cursor >= voice.end_frame {
            voice.finish(true);
        }

        shared.voice = Some(voice);
    }
}

impl AudioGraph for BufferGraph {
    type Source = BufferSource;

    fn duration(&self) -> f64 {
        let shared = self.shared.lock();
        shared.frames() as f64 / f64::from(shared.sample_rate)
    }

    fn volume(&self) -> f64 {
        self.shared.lock().gain
    }

    fn set_volume(&mut self, volume: f64) {
        self.shared.lock().gain = volume;
    }

    fn is_muted(&self) -> bool {
        self.shared.lock().muted
    }

    fn mute(&mut self) {
        self.shared.lock().muted = true;
    }

    fn unmute(&mut self) {
        self.shared.lock().muted = false;
    }

    fn connect(&mut self) -> BufferSource {
        let mut shared = self.shared.lock();
        shared.voices_created += 1;
        let id = shared.voices_created;

        // Replacing the voice invalidates any handle still pointing at the old one.
        shared.voice = Some(Voice::new(id));
        shared.connected = true;

        BufferSource {
            id,
            shared: Arc::clone(&self.shared),
            rate: 1.0,
            used: false,
        }
    }

    fn disconnect(&mut self) {
        let mut shared = self.shared.lock();
        shared.connected = false;
        shared.voice = None;
    }
}

/// Single-use voice handle created by [`BufferGraph::connect`].
#[derive(Debug)]
pub struct BufferSource {
    id: u64,
    shared: Arc<Mutex<GraphShared>>,
    rate: f64,
    used: bool,
}

impl OneShotSource for BufferSource {
    fn start(&mut self, when: f64, offset: f64, duration: f64) {
        if self.used {
            warn!(voice = self.id, "buffer source started twice");
            return;
        }
        self.used = true;

        let mut shared = self.shared.lock();
        let sample_rate = f64::from(shared.sample_rate);
        let frames = shared.frames() as f64;
        let rate = self.rate;
        let Some(voice) = shared.live_voice(self.id) else {
            return;
        };

        voice.cursor = (offset.max(0.0) * sample_rate).min(frames);
        voice.end_frame = (voice.cursor + duration.max(0.0) * sample_rate).min(frames);
        voice.rate = rate;
        voice.delay_secs = when.max(0.0);
        voice.state = if when > 0.0 {
            VoiceState::Scheduled
        } else {
            VoiceState::Running
        };
    }

    fn stop(&mut self, when: f64) {
        self.used = true;
        let mut shared = self.shared.lock();
        let Some(voice) = shared.live_voice(self.id) else {
            return;
        };
        if when > 0.0 && voice.state == VoiceState::Running {
            voice.stop_after_secs = Some(when);
        } else {
            voice.finish(false);
        }
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
        if let Some(voice) = self.shared.lock().live_voice(self.id) {
            voice.rate = rate;
        }
    }

    fn add_ended_listener(&mut self, listener: EndedListener) {
        if let Some(voice) = self.shared.lock().live_voice(self.id) {
            voice.listener = Some(listener);
        }
    }

    fn remove_ended_listener(&mut self) {
        if let Some(voice) = self.shared.lock().live_voice(self.id) {
            voice.listener = None;
        }
    }
}
