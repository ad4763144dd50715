//! The external API surface: a single façade gathering the mixing engine,
//! the effect engine and the segment reader behind the operation names a
//! host runtime expects from this backend's dynamic-library entry points.
//!
//! There is exactly one engine per process, constructed explicitly by
//! `wave_out_open` and torn down by `wave_out_close`/`shutdown` — no lazy
//! static singleton, matching the "construct it explicitly at startup"
//! design note.

use std::path::Path;

use parking_lot::Mutex;
use thiserror::Error;

use asset_manager::PcmDecoder;
use audio_engine::{Engine, EngineConfig, OpenParams, Status, VoiceId, VoiceList, WaveFormat};
use audio_effects::EnvironmentSettings;

#[derive(Debug, Error)]
pub enum SoundSysError {
    #[error("device is not open")]
    NotOpen,
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Engine(#[from] audio_engine::EngineError),
    #[error(transparent)]
    Segment(#[from] segment_reader::SegmentError),
}

/// `LS_OK` / `LS_ERROR` at the Rust boundary: success carries no value,
/// failure carries a typed [`SoundSysError`] instead of an integer code.
pub type LsResult<T = ()> = Result<T, SoundSysError>;

pub type SampleHandle = VoiceId;
pub type StreamHandle = VoiceId;
pub type Sample3DHandle = VoiceId;

pub const USER_DATA_SLOTS: usize = 8;

pub fn sound_sys_desc() -> &'static str {
    "OpenAL"
}

pub fn sound_sys_make() -> Box<SoundSys> {
    Box::new(SoundSys::new())
}

pub struct SoundSys {
    engine: Mutex<Option<Engine>>,
}

impl Default for SoundSys {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundSys {
    pub fn new() -> Self {
        SoundSys { engine: Mutex::new(None) }
    }

    fn with_engine<R>(&self, f: impl FnOnce(&Engine) -> R) -> LsResult<R> {
        let guard = self.engine.lock();
        guard.as_ref().map(f).ok_or(SoundSysError::NotOpen)
    }

    // ---- Lifecycle ---------------------------------------------------

    pub fn startup(&self) -> LsResult {
        tracing::info!("SoundSys startup");
        Ok(())
    }

    pub fn shutdown(&self) {
        if let Some(engine) = self.engine.lock().take() {
            engine.shutdown();
        }
        tracing::info!("SoundSys shutdown");
    }

    pub fn wave_out_open(&self, _device_id: i32, config: EngineConfig) -> LsResult {
        let engine = Engine::start(config)?;
        *self.engine.lock() = Some(engine);
        Ok(())
    }

    pub fn wave_out_close(&self) {
        self.shutdown();
    }

    pub fn ms_count(&self) -> u32 {
        self.with_engine(|e| e.ms_count()).unwrap_or(0)
    }

    // ---- Master --------------------------------------------------------

    pub fn set_digital_master_volume(&self, volume: i32) -> LsResult {
        self.with_engine(|e| e.set_digital_master_volume(volume))
    }

    pub fn digital_master_volume(&self) -> LsResult<i32> {
        self.with_engine(|e| e.digital_master_volume())
    }

    pub fn handle_focus_lost(&self, lost: bool) -> LsResult {
        self.with_engine(|e| e.handle_focus_lost(lost))
    }

    // ---- Panning (in-memory) voice -------------------------------------

    pub fn allocate_sample_handle(&self) -> LsResult<SampleHandle> {
        self.with_engine(|e| e.allocate_voice(VoiceList::Panning))
    }

    pub fn release_sample_handle(&self, handle: SampleHandle) -> LsResult {
        self.with_engine(|e| e.release_voice(handle))
    }

    pub fn init_sample_from_address(&self, handle: SampleHandle, bytes: Vec<u8>, wave_format: WaveFormat) -> LsResult {
        self.with_engine(|e| {
            e.open_voice(
                handle,
                OpenParams::MemoryPcm {
                    bytes,
                    wave_format,
                    requested_rate: None,
                },
            )
        })?
        .map_err(SoundSysError::from)
    }

    pub fn init_sample_from_file(&self, handle: SampleHandle, decoded_bytes: Vec<u8>, wave_format: WaveFormat) -> LsResult {
        self.with_engine(|e| {
            e.open_voice(
                handle,
                OpenParams::MappedBuffer {
                    bytes: decoded_bytes,
                    wave_format,
                    requested_rate: None,
                },
            )
        })?
        .map_err(SoundSysError::from)
    }

    pub fn start_sample(&self, handle: SampleHandle) -> LsResult {
        self.with_engine(|e| e.start_voice(handle))
    }

    pub fn stop_sample(&self, handle: SampleHandle) -> LsResult {
        self.with_engine(|e| e.stop_voice(handle))
    }

    pub fn resume_sample(&self, handle: SampleHandle) -> LsResult {
        self.with_engine(|e| e.resume_voice(handle))
    }

    pub fn end_sample(&self, handle: SampleHandle) -> LsResult {
        self.with_engine(|e| {
            e.stop_voice(handle);
            e.release_voice(handle);
        })
    }

    pub fn sample_status(&self, handle: SampleHandle) -> LsResult<Status> {
        self.with_engine(|e| e.with_voice(handle, |v| v.status()).unwrap_or(Status::None))
    }

    pub fn set_sample_volume(&self, handle: SampleHandle, volume: i32) -> LsResult {
        self.with_engine(|e| {
            e.with_voice(handle, |v| v.set_volume(volume));
        })
    }

    pub fn set_sample_pan(&self, handle: SampleHandle, pan: i32) -> LsResult {
        self.with_engine(|e| {
            e.with_voice(handle, |v| v.set_pan(pan));
        })
    }

    pub fn sample_volume(&self, handle: SampleHandle) -> LsResult<i32> {
        self.with_engine(|e| e.with_voice(handle, |v| v.volume()).unwrap_or(0))
    }

    pub fn sample_pan(&self, handle: SampleHandle) -> LsResult<i32> {
        self.with_engine(|e| e.with_voice(handle, |v| v.pan()).unwrap_or(64))
    }

    pub fn set_sample_loop(&self, handle: SampleHandle, looping: bool) -> LsResult {
        self.with_engine(|e| {
            e.with_voice(handle, |v| v.set_loop(looping));
        })
    }

    pub fn set_sample_loop_block(&self, handle: SampleHandle, begin: usize, end: Option<usize>, enable: bool) -> LsResult {
        self.with_engine(|e| {
            e.with_voice(handle, |v| v.set_loop_block(begin, end, enable));
        })
    }

    pub fn set_sample_ms_position(&self, handle: SampleHandle, ms: u32) -> LsResult {
        self.with_engine(|e| {
            e.with_voice(handle, |v| v.set_ms_position(ms));
        })
    }

    pub fn set_sample_user_data(&self, handle: SampleHandle, index: usize, value: i32) -> LsResult {
        self.with_engine(|e| {
            e.with_voice(handle, |v| v.set_user_data(index, value));
        })
    }

    pub fn sample_user_data(&self, handle: SampleHandle, index: usize) -> LsResult<i32> {
        self.with_engine(|e| e.with_voice(handle, |v| v.user_data(index)).unwrap_or(0))
    }

    // ---- Streaming (file-backed panning) voice -------------------------

    pub fn open_stream(&self, decoder: Box<dyn PcmDecoder>) -> LsResult<StreamHandle> {
        let handle = self.with_engine(|e| e.allocate_voice(VoiceList::Stream))?;
        self.with_engine(|e| {
            e.open_voice(handle, OpenParams::Decoded { decoder, requested_rate: None })
        })??;
        Ok(handle)
    }

    pub fn close_stream(&self, handle: StreamHandle) -> LsResult {
        self.with_engine(|e| {
            e.stop_voice(handle);
            e.release_voice(handle);
        })
    }

    pub fn start_stream(&self, handle: StreamHandle) -> LsResult {
        self.with_engine(|e| e.start_voice(handle))
    }

    pub fn pause_stream(&self, handle: StreamHandle, on: bool) -> LsResult {
        self.with_engine(|e| {
            if on {
                e.pause_voice(handle);
            } else {
                e.resume_voice(handle);
            }
        })
    }

    pub fn set_stream_volume(&self, handle: StreamHandle, volume: i32) -> LsResult {
        self.set_sample_volume(handle, volume)
    }

    pub fn set_stream_pan(&self, handle: StreamHandle, pan: i32) -> LsResult {
        self.set_sample_pan(handle, pan)
    }

    pub fn set_stream_ms_position(&self, handle: StreamHandle, ms: u32) -> LsResult {
        self.set_sample_ms_position(handle, ms)
    }

    pub fn set_stream_user_data(&self, handle: StreamHandle, index: usize, value: i32) -> LsResult {
        self.set_sample_user_data(handle, index, value)
    }

    pub fn set_stream_loop(&self, handle: StreamHandle, looping: bool) -> LsResult {
        self.set_sample_loop(handle, looping)
    }

    pub fn stream_volume(&self, handle: StreamHandle) -> LsResult<i32> {
        self.sample_volume(handle)
    }

    pub fn stream_pan(&self, handle: StreamHandle) -> LsResult<i32> {
        self.sample_pan(handle)
    }

    pub fn stream_status(&self, handle: StreamHandle) -> LsResult<Status> {
        self.sample_status(handle)
    }

    pub fn stream_user_data(&self, handle: StreamHandle, index: usize) -> LsResult<i32> {
        self.sample_user_data(handle, index)
    }

    // ---- 3D listener ----------------------------------------------------

    pub fn open_3d_listener(&self) -> LsResult {
        self.with_engine(|e| e.open_3d_listener())?.map_err(SoundSysError::from)
    }

    pub fn close_3d_listener(&self) -> LsResult {
        self.with_engine(|e| e.close_3d_listener())?.map_err(SoundSysError::from)
    }

    pub fn set_listener_doppler(&self, factor: f32) -> LsResult {
        self.with_engine(|e| e.set_listener_doppler(factor))?.map_err(SoundSysError::from)
    }

    pub fn set_3d_listener_position(&self, position: [f32; 3]) -> LsResult {
        self.with_engine(|e| e.set_3d_listener_position(position))?.map_err(SoundSysError::from)
    }

    pub fn get_3d_listener_position(&self) -> LsResult<[f32; 3]> {
        self.with_engine(|e| e.get_3d_listener_position())?.map_err(SoundSysError::from)
    }

    pub fn set_3d_listener_velocity(&self, velocity: [f32; 3]) -> LsResult {
        self.with_engine(|e| e.set_3d_listener_velocity(velocity))?.map_err(SoundSysError::from)
    }

    pub fn get_3d_listener_velocity(&self) -> LsResult<[f32; 3]> {
        self.with_engine(|e| e.get_3d_listener_velocity())?.map_err(SoundSysError::from)
    }

    pub fn set_3d_orientation(&self, at: [f32; 3], up: [f32; 3]) -> LsResult {
        self.with_engine(|e| e.set_3d_orientation(at, up))?.map_err(SoundSysError::from)
    }

    pub fn get_3d_orientation(&self) -> LsResult<([f32; 3], [f32; 3])> {
        self.with_engine(|e| e.get_3d_orientation())?.map_err(SoundSysError::from)
    }

    // ---- 3D source --------------------------------------------------------

    pub fn allocate_3d_sample_handle(&self) -> LsResult<Sample3DHandle> {
        self.with_engine(|e| e.allocate_voice(VoiceList::Spatial))
    }

    pub fn release_3d_sample_handle(&self, handle: Sample3DHandle) -> LsResult {
        self.with_engine(|e| e.release_voice(handle))
    }

    pub fn init_3d_sample_from_address(&self, handle: Sample3DHandle, bytes: Vec<u8>, wave_format: WaveFormat) -> LsResult {
        self.with_engine(|e| {
            e.open_voice(
                handle,
                OpenParams::MemoryPcm {
                    bytes,
                    wave_format,
                    requested_rate: None,
                },
            )
        })?
        .map_err(SoundSysError::from)
    }

    pub fn init_3d_sample_from_file(&self, handle: Sample3DHandle, decoded_bytes: Vec<u8>, wave_format: WaveFormat) -> LsResult {
        self.with_engine(|e| {
            e.open_voice(
                handle,
                OpenParams::MappedBuffer {
                    bytes: decoded_bytes,
                    wave_format,
                    requested_rate: None,
                },
            )
        })?
        .map_err(SoundSysError::from)
    }

    pub fn start_3d_sample(&self, handle: Sample3DHandle) -> LsResult {
        self.with_engine(|e| e.start_voice(handle))
    }

    pub fn stop_3d_sample(&self, handle: Sample3DHandle) -> LsResult {
        self.with_engine(|e| e.stop_voice(handle))
    }

    pub fn resume_3d_sample(&self, handle: Sample3DHandle) -> LsResult {
        self.with_engine(|e| e.resume_voice(handle))
    }

    pub fn end_3d_sample(&self, handle: Sample3DHandle) -> LsResult {
        self.end_sample(handle)
    }

    pub fn set_3d_sample_volume(&self, handle: Sample3DHandle, volume: i32) -> LsResult {
        self.set_sample_volume(handle, volume)
    }

    pub fn set_3d_sample_distances(&self, handle: Sample3DHandle, min_distance: f32, max_distance: f32) -> LsResult {
        self.with_engine(|e| e.with_voice(handle, |v| v.set_distance_range(min_distance, max_distance)))?
            .ok_or(SoundSysError::Configuration("unknown voice handle".into()))?
            .map_err(SoundSysError::from)
    }

    pub fn set_3d_sample_loop_block(&self, handle: Sample3DHandle, begin: usize, end: Option<usize>, enable: bool) -> LsResult {
        self.set_sample_loop_block(handle, begin, end, enable)
    }

    pub fn set_3d_sample_loop(&self, handle: Sample3DHandle, looping: bool) -> LsResult {
        self.set_sample_loop(handle, looping)
    }

    pub fn set_3d_sample_ms_position(&self, handle: Sample3DHandle, ms: u32) -> LsResult {
        self.set_sample_ms_position(handle, ms)
    }

    pub fn set_3d_position(&self, handle: Sample3DHandle, position: [f32; 3]) -> LsResult {
        self.with_engine(|e| e.with_voice(handle, |v| v.set_position(position)))?
            .ok_or(SoundSysError::Configuration("unknown voice handle".into()))?
            .map_err(SoundSysError::from)
    }

    pub fn set_3d_velocity(&self, handle: Sample3DHandle, velocity: [f32; 3]) -> LsResult {
        self.with_engine(|e| e.with_voice(handle, |v| v.set_velocity(velocity)))?
            .ok_or(SoundSysError::Configuration("unknown voice handle".into()))?
            .map_err(SoundSysError::from)
    }

    pub fn set_3d_orientation_for_source(&self, handle: Sample3DHandle, direction: [f32; 3]) -> LsResult {
        self.with_engine(|e| e.with_voice(handle, |v| v.set_direction(direction)))?
            .ok_or(SoundSysError::Configuration("unknown voice handle".into()))?
            .map_err(SoundSysError::from)
    }

    pub fn get_3d_sample_status(&self, handle: Sample3DHandle) -> LsResult<Status> {
        self.sample_status(handle)
    }

    pub fn get_3d_sample_volume(&self, handle: Sample3DHandle) -> LsResult<i32> {
        self.sample_volume(handle)
    }

    // ---- Reverb ----------------------------------------------------------

    pub fn set_eax20_filter(&self, enable: bool, settings: EnvironmentSettings) -> LsResult {
        self.with_engine(|e| e.set_reverb(enable, settings))?.map_err(SoundSysError::from)
    }

    pub fn supports_eax20_filter(&self) -> bool {
        self.with_engine(|e| e.supports_eax20_filter()).unwrap_or(false)
    }

    /// Currently a no-op, matching the original ABI's stub behaviour.
    pub fn set_eax20_buffer_settings(&self, _handle: Sample3DHandle, _settings: EnvironmentSettings) -> LsResult {
        Ok(())
    }

    // ---- Decompression -----------------------------------------------------

    /// Delegates to an external MP3/ADPCM decoder. Not implemented here:
    /// format-conversion and compressed-audio decoding are explicitly out
    /// of scope for this engine.
    pub fn decompress_asi(&self, _src: &[u8], _ext: &str) -> LsResult<Vec<u8>> {
        Err(SoundSysError::Configuration(
            "DecompressASI delegates to an external decoder not included in this crate".into(),
        ))
    }

    // ---- Segment reading ---------------------------------------------------

    pub fn read_segment(&self, path: &Path) -> LsResult<segment_reader::Segment> {
        Ok(segment_reader::SegmentReader::open(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wf() -> WaveFormat {
        WaveFormat {
            channel_count: 1,
            bit_depth: 8,
            sample_rate: 22_050,
        }
    }

    #[test]
    fn operations_fail_cleanly_before_wave_out_open() {
        let sys = SoundSys::new();
        assert!(sys.allocate_sample_handle().is_err());
    }

    #[test]
    fn sample_lifecycle_end_to_end() {
        let sys = SoundSys::new();
        sys.startup().unwrap();
        sys.wave_out_open(0, EngineConfig::default()).unwrap();

        let handle = sys.allocate_sample_handle().unwrap();
        sys.init_sample_from_address(handle, vec![0xFFu8; 100], wf()).unwrap();
        sys.set_sample_volume(handle, 0).unwrap();
        sys.set_sample_pan(handle, 64).unwrap();
        sys.start_sample(handle).unwrap();

        for _ in 0..5 {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        sys.end_sample(handle).unwrap();
        sys.shutdown();
    }

    #[test]
    fn reverb_toggle_reports_availability() {
        let sys = SoundSys::new();
        sys.wave_out_open(0, EngineConfig::default()).unwrap();
        assert!(sys.supports_eax20_filter());
        sys.set_eax20_filter(true, EnvironmentSettings::default()).unwrap();
        sys.set_eax20_filter(false, EnvironmentSettings::default()).unwrap();
        sys.shutdown();
    }

    #[test]
    fn listener_open_close_roundtrip() {
        let sys = SoundSys::new();
        sys.wave_out_open(0, EngineConfig::default()).unwrap();
        sys.open_3d_listener().unwrap();
        assert!(sys.open_3d_listener().is_err());
        sys.close_3d_listener().unwrap();
        sys.shutdown();
    }

    #[test]
    fn listener_position_and_velocity_round_trip() {
        let sys = SoundSys::new();
        sys.wave_out_open(0, EngineConfig::default()).unwrap();
        sys.open_3d_listener().unwrap();
        sys.set_3d_listener_position([1.0, 2.0, 3.0]).unwrap();
        sys.set_3d_listener_velocity([0.0, 1.0, 0.0]).unwrap();
        assert_eq!(sys.get_3d_listener_position().unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(sys.get_3d_listener_velocity().unwrap(), [0.0, 1.0, 0.0]);
        sys.shutdown();
    }
}
