//! Real OpenAL+EFX device backing, via the `alto` crate's safe wrapper
//! over the native OpenAL API. One [`AltoDevice`] owns the `alto::Alto`
//! loader, the opened `OutputDevice`, and a current `Context`; sources and
//! effect slots borrow the context's lifetime through `Arc`.

use std::sync::Arc;

use alto::{
    Alto, Context, EaxReverbProperties, Mono, OutputDevice as AltoOutputDevice, ReverbProperties,
    Source as AltoSourceTrait, SourceState as AltoSourceState, Stereo, StreamingSource,
};

use crate::device::{BufferFormat, Device, EaxReverbParams, ReverbSlot, Source, SourceState};
use crate::BackendError;

fn alto_err(e: impl std::fmt::Display) -> BackendError {
    BackendError::DeviceCallFailed(e.to_string())
}

pub struct AltoDevice {
    _alto: Alto,
    _output: AltoOutputDevice,
    context: Arc<Context>,
    efx: bool,
    eax_reverb: bool,
}

impl AltoDevice {
    pub fn open_default() -> Result<Self, BackendError> {
        let alto = Alto::load_default().map_err(alto_err)?;
        let output = alto.open(None).map_err(|_| BackendError::DeviceNotFound)?;
        let context = output.new_context(None).map_err(alto_err)?;
        let context = Arc::new(context);

        let efx = context.device().is_extension_present(alto::ext::ALC_EXT_EFX);
        let eax_reverb = efx && context.device().is_extension_present(alto::ext::EAX_REVERB);

        Ok(AltoDevice {
            _alto: alto,
            _output: output,
            context,
            efx,
            eax_reverb,
        })
    }
}

impl Device for AltoDevice {
    fn output_sample_rate(&self) -> u32 {
        // alto does not expose the mixing frequency directly; OpenAL
        // implementations default to 44100 unless ALC_FREQUENCY was
        // requested at device-open time, which this engine does not pin.
        44_100
    }

    fn supports_efx(&self) -> bool {
        self.efx
    }

    fn supports_eax_reverb(&self) -> bool {
        self.eax_reverb
    }

    fn create_source(&self) -> Result<Box<dyn Source>, BackendError> {
        let src = self.context.new_streaming_source().map_err(alto_err)?;
        Ok(Box::new(AltoSource {
            context: self.context.clone(),
            source: src,
        }))
    }

    fn create_reverb_slot(&self) -> Result<Box<dyn ReverbSlot>, BackendError> {
        if !self.efx {
            return Err(BackendError::UnsupportedFormat("device has no EFX support".into()));
        }
        let slot = self.context.new_aux_effect_slot().map_err(alto_err)?;
        Ok(Box::new(AltoReverbSlot {
            context: self.context.clone(),
            slot,
            supports_eax: self.eax_reverb,
        }))
    }

    fn set_listener_gain(&self, gain: f32) {
        self.context.set_gain(gain).ok();
    }

    fn set_listener_position(&self, position: [f32; 3]) {
        self.context.set_position(position).ok();
    }

    fn set_listener_velocity(&self, velocity: [f32; 3]) {
        self.context.set_velocity(velocity).ok();
    }

    fn set_listener_orientation(&self, at: [f32; 3], up: [f32; 3]) {
        self.context.set_orientation((at, up)).ok();
    }

    fn set_doppler_factor(&self, factor: f32) {
        self.context.set_doppler_factor(factor).ok();
    }
}

struct AltoSource {
    context: Arc<Context>,
    source: StreamingSource,
}

impl Source for AltoSource {
    fn queue_buffer(&mut self, pcm: &[u8], format: BufferFormat) -> Result<(), BackendError> {
        let freq = format.sample_rate as i32;
        let buffer = match (format.channel_count, format.bit_depth) {
            (1, 16) => {
                let samples = bytes_to_i16(pcm);
                self.context.new_buffer::<Mono<i16>, _>(&samples, freq)
            }
            (2, 16) => {
                let samples = bytes_to_i16(pcm);
                self.context.new_buffer::<Stereo<i16>, _>(&samples, freq)
            }
            (1, 8) => self.context.new_buffer::<Mono<u8>, _>(pcm, freq),
            (2, 8) => self.context.new_buffer::<Stereo<u8>, _>(pcm, freq),
            _ => {
                return Err(BackendError::UnsupportedFormat(format!(
                    "{}ch {}bit not supported",
                    format.channel_count, format.bit_depth
                )))
            }
        }
        .map_err(alto_err)?;
        self.source.queue_buffer(buffer).map_err(|(_, e)| alto_err(e))
    }

    fn unqueue_processed(&mut self) -> usize {
        let mut n = 0;
        while self.source.buffers_processed() > 0 {
            if self.source.unqueue_buffer().is_err() {
                break;
            }
            n += 1;
        }
        n
    }

    fn buffers_queued(&self) -> usize {
        self.source.buffers_queued() as usize
    }

    fn buffers_processed(&self) -> usize {
        self.source.buffers_processed() as usize
    }

    fn play(&mut self) {
        self.source.play();
    }

    fn pause(&mut self) {
        self.source.pause();
    }

    fn stop(&mut self) {
        self.source.stop();
    }

    fn state(&self) -> SourceState {
        match self.source.state() {
            AltoSourceState::Initial => SourceState::Initial,
            AltoSourceState::Playing => SourceState::Playing,
            AltoSourceState::Paused => SourceState::Paused,
            AltoSourceState::Stopped => SourceState::Stopped,
        }
    }

    fn set_gain(&mut self, gain: f32) {
        self.source.set_gain(gain).ok();
    }

    fn gain(&self) -> f32 {
        self.source.gain().unwrap_or(1.0)
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.source.set_pitch(pitch).ok();
    }

    fn set_position(&mut self, position: [f32; 3]) {
        self.source.set_position(position).ok();
    }

    fn set_velocity(&mut self, velocity: [f32; 3]) {
        self.source.set_velocity(velocity).ok();
    }

    fn set_direction(&mut self, direction: [f32; 3]) {
        self.source.set_direction(direction).ok();
    }

    fn set_distance_range(&mut self, min_distance: f32, max_distance: f32) {
        self.source.set_reference_distance(min_distance).ok();
        self.source.set_max_distance(max_distance).ok();
    }

    fn set_relative(&mut self, relative: bool) {
        self.source.set_relative(relative).ok();
    }

    fn route_through_slot(&mut self, slot_handle: Option<u32>) {
        self.source.set_aux_send_raw(0, slot_handle.unwrap_or(0)).ok();
    }
}

fn bytes_to_i16(pcm: &[u8]) -> Vec<i16> {
    pcm.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect()
}

struct AltoReverbSlot {
    context: Arc<Context>,
    slot: alto::efx::AuxEffectSlot,
    supports_eax: bool,
}

impl ReverbSlot for AltoReverbSlot {
    fn set_eax_reverb(&mut self, params: &EaxReverbParams) -> Result<(), BackendError> {
        if !self.supports_eax {
            return self.set_plain_reverb(params);
        }
        let mut effect = self.context.new_effect::<alto::efx::EaxReverbEffect, _>().map_err(alto_err)?;
        effect
            .set_eax_reverb_properties(&EaxReverbProperties {
                density: 1.0,
                diffusion: params.diffusion,
                gain: params.gain,
                gain_hf: params.gain_hf,
                gain_lf: 1.0,
                decay_time: params.decay_time,
                decay_hf_ratio: params.decay_hf_ratio,
                decay_lf_ratio: 1.0,
                reflections_gain: params.reflections_gain,
                reflections_delay: params.reflections_delay,
                reflections_pan: [0.0, 0.0, 0.0],
                late_reverb_gain: params.late_reverb_gain,
                late_reverb_delay: params.late_reverb_delay,
                late_reverb_pan: [0.0, 0.0, 0.0],
                echo_time: 0.25,
                echo_depth: 0.0,
                modulation_time: 0.25,
                modulation_depth: 0.0,
                air_absorption_gain_hf: params.air_absorption_gain_hf,
                hf_reference: 5000.0,
                lf_reference: 250.0,
                room_rolloff_factor: params.room_rolloff_factor,
                decay_hf_limit: true,
            })
            .map_err(alto_err)?;
        self.slot.set_effect(&effect).map_err(alto_err)
    }

    fn set_plain_reverb(&mut self, params: &EaxReverbParams) -> Result<(), BackendError> {
        let mut effect = self.context.new_effect::<alto::efx::ReverbEffect, _>().map_err(alto_err)?;
        effect
            .set_reverb_properties(&ReverbProperties {
                density: 1.0,
                diffusion: params.diffusion,
                gain: params.gain,
                gain_hf: params.gain_hf,
                decay_time: params.decay_time,
                decay_hf_ratio: params.decay_hf_ratio,
                reflections_gain: params.reflections_gain,
                reflections_delay: params.reflections_delay,
                late_reverb_gain: params.late_reverb_gain,
                late_reverb_delay: params.late_reverb_delay,
                air_absorption_gain_hf: params.air_absorption_gain_hf,
                room_rolloff_factor: params.room_rolloff_factor,
                decay_hf_limit: true,
            })
            .map_err(alto_err)?;
        self.slot.set_effect(&effect).map_err(alto_err)
    }

    fn set_null(&mut self) {
        self.slot.disable_effect().ok();
    }

    fn raw_handle(&self) -> u32 {
        self.slot.as_raw()
    }
}
