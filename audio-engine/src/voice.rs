//! The mixing unit every game-audio handle ultimately refers to: one of
//! `Panning` (software-panned stereo out), `SpatialSource` (3D-positioned
//! mono in, device-spatialized) or `SpatialListener` (singleton, never
//! queues buffers). `mix()` runs the per-pass fill protocol and is called
//! only by the mixer worker; every other method is call-site locked by
//! the façade that owns the voice's list.

use asset_manager::PcmDecoder;
use audio_backend::{BufferFormat, Device, Source, SourceState};

use crate::listener;
use crate::wave::WaveFormat;
use crate::EngineError;

pub const POOL_SIZE: usize = 3;
pub const MIX_SIZE_MS: u32 = 20;

const MIN_VOLUME: i32 = -10000;
const MAX_VOLUME: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceKind {
    Panning,
    SpatialSource,
    SpatialListener,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    None,
    InternalBuffer,
    Decoder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    None,
    Stopped,
    Playing,
    Failed,
}

/// The discriminated `open()` parameter union. Exactly one of these is
/// supplied per call; the file/mmap-opening step itself is the caller's
/// responsibility (the PCM Producer is a black-box external collaborator),
/// so this crate only ever receives bytes already resident in memory or a
/// decoder already wired up to its source.
pub enum OpenParams {
    /// Raw PCM copied directly into the voice's resident buffer.
    MemoryPcm {
        bytes: Vec<u8>,
        wave_format: WaveFormat,
        requested_rate: Option<u32>,
    },
    /// A packaged asset blob, already fully decoded into PCM bytes by the
    /// caller's mmap/package helper.
    MappedBuffer {
        bytes: Vec<u8>,
        wave_format: WaveFormat,
        requested_rate: Option<u32>,
    },
    /// A streamed decoder pulled sequentially by the fill loop.
    Decoded {
        decoder: Box<dyn PcmDecoder>,
        requested_rate: Option<u32>,
    },
}

enum Storage {
    None,
    InternalBuffer(Vec<u8>),
    Decoder(Box<dyn PcmDecoder>),
}

struct FillOutcome {
    partial: bool,
}

pub struct StreamingVoice {
    kind: VoiceKind,
    storage_kind: StorageKind,
    wave_format: Option<WaveFormat>,
    status: Status,
    is_playing: bool,

    storage: Storage,
    data_size: usize,
    data_offset: usize,

    is_looping: bool,
    has_loop_block: bool,
    loop_begin: usize,
    loop_end: usize,

    mix_size_bytes: usize,
    mix_sample_count: usize,
    mono_scratch: Vec<u8>,
    stereo_scratch: Vec<u8>,

    source: Option<Box<dyn Source>>,

    volume: i32,
    pan: i32,
    gain: f32,
    left_pan: f32,
    right_pan: f32,
    pitch: f32,

    min_distance: f32,
    max_distance: f32,
    position: [f32; 3],
    velocity: [f32; 3],
    direction: [f32; 3],
    orientation: ([f32; 3], [f32; 3]),
    doppler_factor: f32,
    master_listener_volume: i32,
    is_listener_muted: bool,

    user_data: [i32; 8],
    route_handle: Option<u32>,
    last_error: Option<String>,

    /// True when `self.gain` must reach the device via `Source::set_gain`
    /// (stereo-in `Panning` voices and `SpatialSource`). False for
    /// mono-in `Panning` voices, where `expand_to_stereo` already bakes
    /// gain and pan into the software-mixed samples — applying it again
    /// at the device would double it.
    device_gain_applies: bool,
}

impl StreamingVoice {
    /// Allocates the device source (Panning/SpatialSource) up front. A
    /// device failure here drops the voice into `Failed` permanently,
    /// matching "failure drops the voice into Failed" at construction.
    pub fn new(kind: VoiceKind, device: &dyn Device) -> Self {
        let source = match kind {
            VoiceKind::SpatialListener => None,
            _ => match device.create_source() {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::error!(?kind, error = %e, "failed to allocate device source");
                    None
                }
            },
        };
        let status = if source.is_none() && !matches!(kind, VoiceKind::SpatialListener) {
            Status::Failed
        } else {
            Status::Stopped
        };

        StreamingVoice {
            kind,
            storage_kind: StorageKind::None,
            wave_format: None,
            status,
            is_playing: false,
            storage: Storage::None,
            data_size: 0,
            data_offset: 0,
            is_looping: false,
            has_loop_block: false,
            loop_begin: 0,
            loop_end: 0,
            mix_size_bytes: 0,
            mix_sample_count: 0,
            mono_scratch: Vec::new(),
            stereo_scratch: Vec::new(),
            source,
            volume: 0,
            pan: 64,
            gain: 1.0,
            left_pan: 1.0,
            right_pan: 1.0,
            pitch: 1.0,
            min_distance: 1.0,
            max_distance: 100.0,
            position: [0.0, 0.0, 0.0],
            velocity: [0.0, 0.0, 0.0],
            direction: [0.0, 0.0, 0.0],
            orientation: ([0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            doppler_factor: 1.0,
            master_listener_volume: 0,
            is_listener_muted: false,
            user_data: [0; 8],
            route_handle: None,
            last_error: None,
            device_gain_applies: false,
        }
    }

    pub fn kind(&self) -> VoiceKind {
        self.kind
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage_kind
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.status, Status::Stopped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, Status::Failed)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Marks the voice `Failed` without touching the device; used by the
    /// mixer worker when a voice's `mix()` call panics, so one bad voice
    /// cannot be retried into repeating the panic.
    pub fn mark_failed(&mut self) {
        self.status = Status::Failed;
        self.is_playing = false;
    }

    pub fn open(&mut self, params: OpenParams, reverb_route: Option<u32>) -> Result<(), EngineError> {
        match self.open_inner(params, reverb_route) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.status = Status::Failed;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn open_inner(&mut self, params: OpenParams, reverb_route: Option<u32>) -> Result<(), EngineError> {
        let (storage, data_size, wave_format, requested_rate) = match params {
            OpenParams::MemoryPcm {
                bytes,
                wave_format,
                requested_rate,
            } => {
                let wf = wave_format.validate()?;
                let size = bytes.len();
                (Storage::InternalBuffer(bytes), size, wf, requested_rate)
            }
            OpenParams::MappedBuffer {
                bytes,
                wave_format,
                requested_rate,
            } => {
                let wf = wave_format.validate()?;
                let size = bytes.len();
                (Storage::InternalBuffer(bytes), size, wf, requested_rate)
            }
            OpenParams::Decoded { mut decoder, requested_rate } => {
                let fmt = decoder.format();
                let wf = WaveFormat {
                    channel_count: fmt.channel_count,
                    bit_depth: fmt.bit_depth,
                    sample_rate: fmt.sample_rate,
                }
                .validate()?;
                let size = decoder.total_bytes_estimate() as usize;
                (Storage::Decoder(decoder), size, wf, requested_rate)
            }
        };

        if matches!(self.kind, VoiceKind::SpatialSource) && wave_format.channel_count != 1 {
            return Err(EngineError::Configuration("spatial source requires mono input".into()));
        }

        let pitch = match requested_rate {
            Some(rate) if rate > 0 && rate != wave_format.sample_rate => rate as f32 / wave_format.sample_rate as f32,
            _ => 1.0,
        };
        let pitch = pitch.max(f32::MIN_POSITIVE);

        let mix_sample_count = ((pitch * MIX_SIZE_MS as f32 * wave_format.sample_rate as f32) / 1000.0)
            .round()
            .max(1.0) as usize;
        let mix_size_bytes = mix_sample_count * wave_format.block_align();

        let stereo_needed = matches!(self.kind, VoiceKind::Panning) && wave_format.channel_count == 1;
        self.device_gain_applies = !stereo_needed;

        self.storage_kind = match storage {
            Storage::InternalBuffer(_) => StorageKind::InternalBuffer,
            Storage::Decoder(_) => StorageKind::Decoder,
            Storage::None => StorageKind::None,
        };
        self.storage = storage;
        self.data_size = data_size;
        self.data_offset = 0;
        self.wave_format = Some(wave_format);
        self.mix_sample_count = mix_sample_count;
        self.mix_size_bytes = mix_size_bytes;
        self.mono_scratch = vec![0u8; mix_size_bytes];
        self.stereo_scratch = if stereo_needed { vec![0u8; mix_size_bytes * 2] } else { Vec::new() };
        self.pitch = pitch;
        self.is_looping = false;
        self.has_loop_block = false;
        self.loop_begin = 0;
        self.loop_end = data_size;
        self.is_playing = false;
        self.status = Status::Stopped;
        self.volume = 0;
        self.pan = 64;
        self.route_handle = reverb_route;
        self.last_error = None;
        self.recompute_pan_gain();

        if let Some(source) = self.source.as_mut() {
            source.set_pitch(pitch);
            source.set_relative(matches!(self.kind, VoiceKind::Panning));
            if matches!(self.kind, VoiceKind::SpatialSource) {
                source.route_through_slot(reverb_route);
            }
        }

        tracing::trace!(kind = ?self.kind, sample_rate = self.wave_format.unwrap().sample_rate, "voice opened");
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(source) = self.source.as_mut() {
            source.stop();
        }
        self.storage = Storage::None;
        self.storage_kind = StorageKind::None;
        self.wave_format = None;
        self.data_size = 0;
        self.data_offset = 0;
        self.is_playing = false;
        self.status = Status::None;
        tracing::trace!(kind = ?self.kind, "voice closed");
    }

    pub fn start(&mut self) {
        self.rewind();
        self.resume();
    }

    pub fn stop(&mut self) {
        self.rewind();
    }

    fn rewind(&mut self) {
        self.is_playing = false;
        self.data_offset = if self.is_looping && self.has_loop_block { self.loop_begin } else { 0 };
        if let Storage::Decoder(dec) = &mut self.storage {
            let block_align = self.wave_format.map(|w| w.block_align()).unwrap_or(1).max(1);
            let _ = dec.seek_to_sample((self.data_offset / block_align) as u64);
        }
        tracing::trace!(kind = ?self.kind, "voice stopped");
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
        tracing::trace!(kind = ?self.kind, "voice paused");
    }

    pub fn resume(&mut self) {
        if matches!(self.status, Status::Failed) {
            return;
        }
        self.is_playing = true;
        tracing::trace!(kind = ?self.kind, "voice resumed");
    }

    pub fn set_volume(&mut self, volume: i32) {
        self.volume = volume.clamp(MIN_VOLUME, MAX_VOLUME);
        self.recompute_pan_gain();
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn set_pan(&mut self, pan: i32) {
        self.pan = pan.clamp(0, 127);
        self.recompute_pan_gain();
    }

    pub fn pan(&self) -> i32 {
        self.pan
    }

    fn recompute_pan_gain(&mut self) {
        self.gain = centibel_to_gain(self.volume);
        if self.pan == 64 {
            self.left_pan = 1.0;
            self.right_pan = 1.0;
        } else if self.pan < 64 {
            self.left_pan = 1.0;
            self.right_pan = (self.pan as f32 / 64.0).clamp(0.0, 1.0);
        } else {
            self.right_pan = 1.0;
            self.left_pan = ((127 - self.pan) as f32 / 63.0).clamp(0.0, 1.0);
        }
        if self.device_gain_applies {
            if let Some(source) = self.source.as_mut() {
                source.set_gain(self.gain);
            }
        }
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.is_looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.is_looping
    }

    pub fn set_loop_block(&mut self, begin: usize, end: Option<usize>, enable: bool) {
        let Some(wf) = self.wave_format else { return };
        let block_align = wf.block_align().max(1);
        let begin = (begin / block_align) * block_align;
        let end = match end {
            Some(e) if e > 0 => (e / block_align) * block_align,
            _ => self.data_size,
        }
        .min(self.data_size);
        let begin = begin.min(end);
        self.loop_begin = begin;
        self.loop_end = end;
        self.has_loop_block = enable && begin <= end && !(begin == 0 && end == self.data_size);
    }

    pub fn loop_block(&self) -> (usize, usize, bool) {
        (self.loop_begin, self.loop_end, self.has_loop_block)
    }

    pub fn set_ms_position(&mut self, ms: u32) {
        let Some(wf) = self.wave_format else { return };
        let block_align = wf.block_align().max(1);
        let byte = (ms as u64 * wf.sample_rate as u64 / 1000) as usize * block_align;
        if byte <= self.data_size {
            self.data_offset = byte;
            if let Storage::Decoder(dec) = &mut self.storage {
                let _ = dec.seek_to_sample((byte / block_align) as u64);
            }
        }
    }

    pub fn set_user_data(&mut self, index: usize, value: i32) {
        if let Some(slot) = self.user_data.get_mut(index) {
            *slot = value;
        }
    }

    pub fn user_data(&self, index: usize) -> i32 {
        self.user_data.get(index).copied().unwrap_or(0)
    }

    pub fn set_distance_range(&mut self, min_distance: f32, max_distance: f32) -> Result<(), EngineError> {
        if min_distance.is_nan() || max_distance.is_nan() {
            return Err(EngineError::Configuration("distance is NaN".into()));
        }
        if !(min_distance < max_distance) {
            return Err(EngineError::Configuration("min_distance must be < max_distance".into()));
        }
        self.min_distance = min_distance;
        self.max_distance = max_distance;
        if let Some(source) = self.source.as_mut() {
            source.set_distance_range(min_distance, max_distance);
        }
        Ok(())
    }

    pub fn distance_range(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    pub fn set_position(&mut self, position: [f32; 3]) -> Result<(), EngineError> {
        reject_nan(&position)?;
        self.position = position;
        if let Some(source) = self.source.as_mut() {
            source.set_position(listener::to_device_space(position));
        }
        Ok(())
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn set_velocity(&mut self, velocity: [f32; 3]) -> Result<(), EngineError> {
        reject_nan(&velocity)?;
        self.velocity = velocity;
        if let Some(source) = self.source.as_mut() {
            source.set_velocity(listener::to_device_space(velocity));
        }
        Ok(())
    }

    pub fn velocity(&self) -> [f32; 3] {
        self.velocity
    }

    pub fn set_direction(&mut self, direction: [f32; 3]) -> Result<(), EngineError> {
        reject_nan(&direction)?;
        self.direction = direction;
        if let Some(source) = self.source.as_mut() {
            source.set_direction(listener::to_device_space(direction));
        }
        Ok(())
    }

    pub fn direction(&self) -> [f32; 3] {
        self.direction
    }

    pub fn set_orientation(&mut self, at: [f32; 3], up: [f32; 3]) -> Result<(), EngineError> {
        reject_nan(&at)?;
        reject_nan(&up)?;
        self.orientation = (at, up);
        Ok(())
    }

    pub fn orientation(&self) -> ([f32; 3], [f32; 3]) {
        self.orientation
    }

    pub fn set_doppler_factor(&mut self, factor: f32) -> Result<(), EngineError> {
        if factor.is_nan() {
            return Err(EngineError::Configuration("doppler factor is NaN".into()));
        }
        self.doppler_factor = factor.clamp(0.0, 10.0);
        Ok(())
    }

    pub fn doppler_factor(&self) -> f32 {
        self.doppler_factor
    }

    pub fn set_master_listener_volume(&mut self, volume: i32) {
        self.master_listener_volume = volume.clamp(MIN_VOLUME, MAX_VOLUME);
    }

    pub fn master_listener_volume(&self) -> i32 {
        self.master_listener_volume
    }

    pub fn set_listener_muted(&mut self, muted: bool) {
        self.is_listener_muted = muted;
    }

    pub fn is_listener_muted(&self) -> bool {
        self.is_listener_muted
    }

    /// The effective gain the device listener should be set to, combining
    /// master listener volume with the mute flag.
    pub fn effective_listener_gain(&self) -> f32 {
        listener::effective_listener_gain(1.0, centibel_to_gain(self.master_listener_volume), self.is_listener_muted)
    }

    /// Runs one mix pass. Returns whether anything was pushed or drained.
    /// Called only by the mixer worker.
    pub fn mix(&mut self) -> bool {
        if matches!(self.kind, VoiceKind::SpatialListener) {
            return false;
        }
        if matches!(self.status, Status::Failed) {
            return false;
        }
        let mut source = match self.source.take() {
            Some(s) => s,
            None => return false,
        };
        let advanced = self.mix_with_source(&mut source);
        self.source = Some(source);
        advanced
    }

    fn mix_with_source(&mut self, source: &mut Box<dyn Source>) -> bool {
        if !self.is_playing {
            if source.state() == SourceState::Playing {
                source.pause();
            }
            self.status = Status::Stopped;
            return false;
        }

        let processed = source.unqueue_processed();
        let queued_before = source.buffers_queued();

        if !self.is_looping && self.data_offset >= self.data_size {
            if queued_before == 0 {
                source.pause();
                self.is_playing = false;
                self.status = Status::Stopped;
                return false;
            }
            return true;
        }

        let wf = match self.wave_format {
            Some(wf) => wf,
            None => return processed > 0,
        };

        let mut queued_this_pass = 0usize;
        loop {
            if queued_before + queued_this_pass >= POOL_SIZE {
                break;
            }

            let outcome = self.fill_mono_block(wf);
            let expand = matches!(self.kind, VoiceKind::Panning) && wf.channel_count == 1;
            if expand {
                self.expand_to_stereo(wf);
            }
            let (payload, channel_count): (&[u8], u16) =
                if expand { (&self.stereo_scratch[..], 2) } else { (&self.mono_scratch[..], wf.channel_count) };

            let format = BufferFormat {
                channel_count,
                bit_depth: wf.bit_depth,
                sample_rate: wf.sample_rate,
            };
            if let Err(e) = source.queue_buffer(payload, format) {
                tracing::error!(kind = ?self.kind, error = %e, "device error queueing buffer; voice failed");
                self.status = Status::Failed;
                self.is_playing = false;
                self.last_error = Some(e.to_string());
                source.stop();
                return false;
            }
            queued_this_pass += 1;

            if outcome.partial || (!self.is_looping && self.data_offset >= self.data_size) {
                break;
            }
        }

        if queued_this_pass > 0 && source.state() != SourceState::Playing {
            source.play();
            self.status = Status::Playing;
        }

        processed > 0 || queued_this_pass > 0
    }

    fn fill_mono_block(&mut self, wf: WaveFormat) -> FillOutcome {
        let block_align = wf.block_align().max(1);
        let want = self.mix_size_bytes;
        let mut written = 0usize;

        while written < want {
            if self.data_offset >= self.data_size {
                if self.is_looping {
                    let rewind_to = if self.has_loop_block { self.loop_begin } else { 0 };
                    self.data_offset = rewind_to;
                    if let Storage::Decoder(dec) = &mut self.storage {
                        let _ = dec.seek_to_sample((rewind_to / block_align) as u64);
                    }
                    continue;
                }
                break;
            }

            let remaining = want - written;
            let n = match &mut self.storage {
                Storage::InternalBuffer(bytes) => {
                    let avail = (self.data_size - self.data_offset).min(remaining);
                    self.mono_scratch[written..written + avail].copy_from_slice(&bytes[self.data_offset..self.data_offset + avail]);
                    avail
                }
                Storage::Decoder(dec) => dec.read(&mut self.mono_scratch[written..written + remaining]).unwrap_or(0),
                Storage::None => 0,
            };

            if n == 0 {
                // Decoder hit its real end sooner than data_size claimed.
                self.data_size = self.data_offset;
                if self.is_looping {
                    continue;
                }
                break;
            }
            self.data_offset += n;
            written += n;
        }

        if written < want {
            let silence = wf.silence_byte();
            for b in &mut self.mono_scratch[written..want] {
                *b = silence;
            }
        }

        FillOutcome { partial: written < want }
    }

    fn expand_to_stereo(&mut self, wf: WaveFormat) {
        let n = self.mix_sample_count;
        match wf.bit_depth {
            16 => {
                for i in 0..n {
                    let s = i16::from_le_bytes([self.mono_scratch[i * 2], self.mono_scratch[i * 2 + 1]]) as f32;
                    let l = (s * self.gain * self.left_pan).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                    let r = (s * self.gain * self.right_pan).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                    self.stereo_scratch[i * 4..i * 4 + 2].copy_from_slice(&l.to_le_bytes());
                    self.stereo_scratch[i * 4 + 2..i * 4 + 4].copy_from_slice(&r.to_le_bytes());
                }
            }
            8 => {
                for i in 0..n {
                    let s = self.mono_scratch[i] as f32 - 128.0;
                    let l = ((s * self.gain * self.left_pan).clamp(-128.0, 127.0) + 128.0) as u8;
                    let r = ((s * self.gain * self.right_pan).clamp(-128.0, 127.0) + 128.0) as u8;
                    self.stereo_scratch[i * 2] = l;
                    self.stereo_scratch[i * 2 + 1] = r;
                }
            }
            _ => unreachable!("WaveFormat::validate rejects other bit depths"),
        }
    }
}

fn centibel_to_gain(centibel: i32) -> f32 {
    10f32.powf(centibel as f32 / 2000.0)
}

fn reject_nan(v: &[f32; 3]) -> Result<(), EngineError> {
    if v.iter().any(|c| c.is_nan()) {
        Err(EngineError::Configuration("vector contains NaN".into()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_backend::mock_backend::MockDevice;

    fn wf(channel_count: u16) -> WaveFormat {
        WaveFormat {
            channel_count,
            bit_depth: 8,
            sample_rate: 22_050,
        }
    }

    #[test]
    fn panning_mono_centered_produces_equal_channels() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::Panning, &device);
        let data = vec![0xFFu8; 100];
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: data,
                    wave_format: wf(1),
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        voice.set_volume(0);
        voice.set_pan(64);
        voice.start();

        let mut advanced = false;
        for _ in 0..10 {
            if voice.mix() {
                advanced = true;
            }
        }
        assert!(advanced);
        assert_eq!(voice.left_pan, voice.right_pan);
    }

    #[test]
    fn hard_left_pan_silences_right_channel() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::Panning, &device);
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0xFFu8; 100],
                    wave_format: wf(1),
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        voice.set_pan(0);
        assert_eq!(voice.right_pan, 0.0);
        assert_eq!(voice.left_pan, 1.0);
    }

    #[test]
    fn non_looping_voice_stops_after_drain() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::Panning, &device);
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0x80u8; 10],
                    wave_format: wf(1),
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        voice.start();
        for _ in 0..20 {
            voice.mix();
        }
        assert!(voice.is_stopped());
        assert!(!voice.is_playing());
    }

    #[test]
    fn data_offset_always_block_aligned_and_in_range() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::Panning, &device);
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0u8; 4410],
                    wave_format: WaveFormat {
                        channel_count: 2,
                        bit_depth: 16,
                        sample_rate: 44_100,
                    },
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        voice.set_loop_block(100, Some(200), true);
        voice.start();
        for _ in 0..10 {
            voice.mix();
            assert!(voice.data_offset() <= voice.data_size());
            assert_eq!(voice.data_offset() % 4, 0);
        }
    }

    #[test]
    fn loop_block_spanning_whole_data_disables_loop_block() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::Panning, &device);
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0u8; 100],
                    wave_format: wf(1),
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        voice.set_loop_block(0, Some(100), true);
        assert!(!voice.loop_block().2);
    }

    #[test]
    fn stereo_panning_volume_reaches_the_device_source() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::Panning, &device);
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0u8; 100],
                    wave_format: wf(2),
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        voice.set_volume(-10000);
        assert_eq!(voice.source.as_ref().unwrap().gain(), centibel_to_gain(-10000));
        voice.set_volume(0);
        assert_eq!(voice.source.as_ref().unwrap().gain(), 1.0);
    }

    #[test]
    fn spatial_source_volume_reaches_the_device_source() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::SpatialSource, &device);
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0u8; 100],
                    wave_format: wf(1),
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        voice.set_volume(-10000);
        assert_eq!(voice.source.as_ref().unwrap().gain(), centibel_to_gain(-10000));
    }

    #[test]
    fn mono_panning_volume_is_applied_in_software_not_at_the_device() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::Panning, &device);
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0u8; 100],
                    wave_format: wf(1),
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        voice.set_volume(-10000);
        assert_eq!(voice.source.as_ref().unwrap().gain(), 1.0);
    }

    #[test]
    fn spatial_source_rejects_stereo_input() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::SpatialSource, &device);
        let err = voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0u8; 100],
                    wave_format: wf(2),
                    requested_rate: None,
                },
                None,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert!(voice.is_failed());
    }

    #[test]
    fn unit_distance_source_submits_negated_z() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::SpatialSource, &device);
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0u8; 100],
                    wave_format: wf(1),
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        voice.set_position([0.0, 0.0, 1.0]).unwrap();
        assert_eq!(voice.position(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn nan_position_is_rejected() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::SpatialSource, &device);
        voice
            .open(
                OpenParams::MemoryPcm {
                    bytes: vec![0u8; 100],
                    wave_format: wf(1),
                    requested_rate: None,
                },
                None,
            )
            .unwrap();
        assert!(voice.set_position([f32::NAN, 0.0, 0.0]).is_err());
    }

    #[test]
    fn distance_range_requires_min_less_than_max() {
        let device = MockDevice::new();
        let mut voice = StreamingVoice::new(VoiceKind::SpatialSource, &device);
        assert!(voice.set_distance_range(10.0, 1.0).is_err());
        assert!(voice.set_distance_range(1.0, 10.0).is_ok());
    }
}
