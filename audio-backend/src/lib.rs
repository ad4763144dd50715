//! Owns the OpenAL+EFX device/context and exposes it through the [`Device`]
//! trait so the rest of the workspace never depends directly on `alto`.
//!
//! The real implementation (`alto_backend`) opens an actual device; the
//! `mock` feature swaps in an in-memory simulation for tests and CI that
//! should not touch hardware, following the same real/mock split the
//! teacher crate used for its `cpal`-backed output.

use std::fmt;
use thiserror::Error;

pub mod device;

#[cfg(feature = "mock")]
pub mod mock_backend;

#[cfg(not(feature = "mock"))]
pub mod alto_backend;

pub use device::{BufferFormat, Device, EaxReverbParams, ReverbSlot, Source, SourceState};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no output device found")]
    DeviceNotFound,
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("device call failed: {0}")]
    DeviceCallFailed(String),
    #[error("{0}")]
    Other(String),
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceState::Initial => write!(f, "Initial"),
            SourceState::Playing => write!(f, "Playing"),
            SourceState::Paused => write!(f, "Paused"),
            SourceState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Opens the default output device, returning the real `alto`-backed
/// device unless this crate was built with `--features mock`.
#[cfg(not(feature = "mock"))]
pub fn open_default_device() -> Result<Box<dyn Device>, BackendError> {
    let dev = alto_backend::AltoDevice::open_default()?;
    tracing::info!(sample_rate = dev.output_sample_rate(), efx = dev.supports_efx(), "opened OpenAL device");
    Ok(Box::new(dev))
}

#[cfg(feature = "mock")]
pub fn open_default_device() -> Result<Box<dyn Device>, BackendError> {
    let dev = mock_backend::MockDevice::new();
    tracing::info!("opened mock audio device");
    Ok(Box::new(dev))
}

pub fn is_mock_backend_enabled() -> bool {
    cfg!(feature = "mock")
}
