//! The device-facing abstraction the rest of the workspace programs
//! against. One real implementation ([`crate::alto_backend::AltoDevice`])
//! wraps an actual OpenAL+EFX device via the `alto` crate; one
//! ([`crate::mock_backend::MockDevice`]) simulates device state entirely
//! in memory for tests that must not touch real hardware.

use crate::BackendError;

/// Playback state of a streaming source, mirroring OpenAL's `AL_SOURCE_STATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// PCM format of one queued buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFormat {
    pub channel_count: u16,
    pub bit_depth: u16,
    pub sample_rate: u32,
}

/// Reverb parameters as mapped by `audio-effects`; carried here as plain
/// data so this crate has no dependency on the effects crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaxReverbParams {
    pub diffusion: f32,
    pub gain: f32,
    pub gain_hf: f32,
    pub decay_time: f32,
    pub decay_hf_ratio: f32,
    pub reflections_gain: f32,
    pub reflections_delay: f32,
    pub late_reverb_gain: f32,
    pub late_reverb_delay: f32,
    pub room_rolloff_factor: f32,
    pub air_absorption_gain_hf: f32,
}

/// An output device and its current context: owns the handful of
/// device-wide objects the engine façade needs (listener properties,
/// source/effect-slot factories).
pub trait Device: Send + Sync {
    fn output_sample_rate(&self) -> u32;

    /// True when the device exposes the EFX auxiliary-send/effect-slot
    /// extension at all (gates whether the engine attempts reverb routing).
    fn supports_efx(&self) -> bool;

    /// True when the device additionally exposes the EAX-style extended
    /// reverb effect (vs. only the plain reverb effect).
    fn supports_eax_reverb(&self) -> bool;

    fn create_source(&self) -> Result<Box<dyn Source>, BackendError>;
    fn create_reverb_slot(&self) -> Result<Box<dyn ReverbSlot>, BackendError>;

    fn set_listener_gain(&self, gain: f32);
    fn set_listener_position(&self, position: [f32; 3]);
    fn set_listener_velocity(&self, velocity: [f32; 3]);
    fn set_listener_orientation(&self, at: [f32; 3], up: [f32; 3]);
    fn set_doppler_factor(&self, factor: f32);
}

/// One queueable, positionable playback voice on the device.
pub trait Source: Send {
    fn queue_buffer(&mut self, pcm: &[u8], format: BufferFormat) -> Result<(), BackendError>;
    fn unqueue_processed(&mut self) -> usize;
    fn buffers_queued(&self) -> usize;
    fn buffers_processed(&self) -> usize;

    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn state(&self) -> SourceState;

    fn set_gain(&mut self, gain: f32);
    fn gain(&self) -> f32;
    fn set_pitch(&mut self, pitch: f32);

    /// No-op on sources that are not spatialized (panning voices).
    fn set_position(&mut self, position: [f32; 3]);
    fn set_velocity(&mut self, velocity: [f32; 3]);
    fn set_direction(&mut self, direction: [f32; 3]);
    fn set_distance_range(&mut self, min_distance: f32, max_distance: f32);

    /// Panning voices are fully device-relative with spatialization off;
    /// spatial sources are relative to world space (device-relative off).
    fn set_relative(&mut self, relative: bool);

    /// Routes the source through the slot identified by `raw_handle`
    /// ([`ReverbSlot::raw_handle`]), or clears routing when `None`.
    fn route_through_slot(&mut self, slot_handle: Option<u32>);
}

/// The engine's single auxiliary effect slot, holding either a reverb
/// effect (EAX-style or plain) or the null effect.
pub trait ReverbSlot: Send {
    fn set_eax_reverb(&mut self, params: &EaxReverbParams) -> Result<(), BackendError>;
    fn set_plain_reverb(&mut self, params: &EaxReverbParams) -> Result<(), BackendError>;
    fn set_null(&mut self);

    /// The device-native handle `Source::route_through_slot` uses to route
    /// a source's dry signal into this slot.
    fn raw_handle(&self) -> u32;
}
