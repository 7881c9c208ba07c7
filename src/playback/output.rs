//! Device output for a [`BufferGraph`] using CPAL.

use super::buffer::BufferGraph;
use crate::error::{PlaybackError, PlaybackResult};
use tracing::{info, warn};

use cpal::{
    Device, SampleFormat, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};

/// A running output stream that pulls audio from a [`BufferGraph`].
///
/// The stream lives as long as this value; dropping it closes the device.
pub struct CpalOutput {
    stream: Stream,
    config: StreamConfig,
    device_name: String,
}

impl CpalOutput {
    /// Open the host's default output device.
    pub fn open_default(graph: BufferGraph) -> PlaybackResult<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(PlaybackError::NoDevicesAvailable)?;
        Self::open_device(device, graph)
    }

    /// Open the output device whose name matches `device_name`.
    pub fn open_named(device_name: &str, graph: BufferGraph) -> PlaybackResult<Self> {
        let device = cpal::default_host()
            .output_devices()?
            .find(|d| d.name().is_ok_and(|name| name == device_name))
            .ok_or_else(|| PlaybackError::device_not_found(device_name))?;
        Self::open_device(device, graph)
    }

    fn open_device(device: Device, graph: BufferGraph) -> PlaybackResult<Self> {
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        let supported = device.default_output_config()?;
        let config = supported.config();
        let channels = usize::from(config.channels);
        let rate = config.sample_rate.0;

        let on_error = |err: cpal::StreamError| warn!("audio stream error: {}", err);

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    graph.render(data, channels, rate);
                },
                on_error,
                None,
            )?,
            SampleFormat::I16 => {
                let mut scratch: Vec<f32> = Vec::new();
                device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        scratch.resize(data.len(), 0.0);
                        graph.render(&mut scratch, channels, rate);
                        for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                            *out = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
                        }
                    },
                    on_error,
                    None,
                )?
            }
            other => {
                return Err(PlaybackError::backend(
                    "cpal",
                    format!("unsupported device sample format {:?}", other),
                ));
            }
        };

        stream.play()?;
        info!(device = %device_name, channels, rate, "output stream opened");

        Ok(Self {
            stream,
            config,
            device_name,
        })
    }

    /// Suspend the device stream.
    pub fn suspend(&self) -> PlaybackResult<()> {
        self.stream.pause()?;
        Ok(())
    }

    /// Resume a suspended device stream.
    pub fn resume(&self) -> PlaybackResult<()> {
        self.stream.play()?;
        Ok(())
    }

    /// Output sample rate in Hz.
    pub const fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Output channel count.
    pub const fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Name of the device being played to.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}
