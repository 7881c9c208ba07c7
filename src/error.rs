//! Error types and result utilities for playback setup.
//!
//! The engine's transport operations never fail: they are guarded no-ops. Errors
//! only surface from the paths that build things, such as configuration
//! validation, constructing a [`BufferGraph`](crate::playback::BufferGraph) or
//! opening an output device.

use thiserror::Error;

/// Convenience type alias for results that may contain a [`PlaybackError`].
pub type PlaybackResult<T> = Result<T, PlaybackError>;

/// Error types that can occur while configuring or wiring up playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Playback rate must be finite and strictly positive.
    #[error("Invalid playback rate: {0} (must be finite and > 0)")]
    InvalidRate(f64),

    /// Volume must be finite and non-negative.
    #[error("Invalid volume: {0} (must be finite and >= 0)")]
    InvalidVolume(f64),

    /// Sample buffer handed to a graph is unusable.
    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),

    /// No output device with the given name.
    #[error("Device not found: {device_name}")]
    DeviceNotFound {
        /// Name that was searched for
        device_name: String,
    },

    /// The host exposes no output devices at all.
    #[error("No audio output devices available")]
    NoDevicesAvailable,

    /// Backend-specific errors (cpal, etc.)
    #[error("Backend error: {backend} - {details}")]
    Backend {
        /// Backend that failed, e.g. `"cpal"`
        backend: &'static str,
        /// Backend error message
        details: String,
    },
}

impl PlaybackError {
    /// Create an invalid buffer error
    pub fn invalid_buffer(details: impl Into<String>) -> Self {
        Self::InvalidBuffer(details.into())
    }

    /// Create a device not found error
    pub fn device_not_found(device_name: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            device_name: device_name.into(),
        }
    }

    /// Create a backend error
    pub fn backend(backend: &'static str, details: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            details: details.into(),
        }
    }

    /// Check if retrying the same operation could succeed
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Backend { .. } | Self::NoDevicesAvailable)
    }

    /// Check if this error indicates a device problem
    pub const fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound { .. } | Self::NoDevicesAvailable | Self::Backend { .. }
        )
    }
}

#[cfg(feature = "playback")]
impl From<cpal::BuildStreamError> for PlaybackError {
    fn from(err: cpal::BuildStreamError) -> Self {
        Self::backend("cpal", format!("Failed to build stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PlayStreamError> for PlaybackError {
    fn from(err: cpal::PlayStreamError) -> Self {
        Self::backend("cpal", format!("Failed to play stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PauseStreamError> for PlaybackError {
    fn from(err: cpal::PauseStreamError) -> Self {
        Self::backend("cpal", format!("Failed to pause stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::DefaultStreamConfigError> for PlaybackError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        Self::backend(
            "cpal",
            format!("Failed to get default stream config: {}", err),
        )
    }
}

#[cfg(feature = "playback")]
impl From<cpal::DevicesError> for PlaybackError {
    fn from(err: cpal::DevicesError) -> Self {
        Self::backend("cpal", format!("Failed to enumerate devices: {}", err))
    }
}
