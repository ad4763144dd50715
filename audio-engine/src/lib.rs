//! The game-audio mixing engine: owns the device/context, the effect
//! engine, the three voice lists and their mutexes, the mixer worker
//! thread, the clock base and the master volume. One instance exists per
//! process, constructed explicitly at startup and destroyed at shutdown —
//! no lazy static singleton.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use thiserror::Error;

use audio_backend::Device;
use audio_effects::{EffectEngine, EnvironmentSettings};

pub mod listener;
pub mod slots;
pub mod voice;
pub mod wave;
pub mod worker;

pub use voice::{OpenParams, Status, StorageKind, StreamingVoice, VoiceKind};
pub use wave::WaveFormat;
pub use worker::{MixerWorker, VoiceLists, Wakeup};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("device error: {0}")]
    Device(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("listener already open")]
    ListenerAlreadyOpen,
    #[error("no listener is open")]
    NoListener,
    #[error(transparent)]
    Backend(#[from] audio_backend::BackendError),
    #[error(transparent)]
    Effect(#[from] audio_effects::EffectError),
}

/// The façade's configuration surface: `Startup`/`WaveOutOpen`-equivalent
/// parameters. No file-based config format is introduced; callers build
/// this struct directly (or take the defaults the original hardcodes).
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub mix_size_ms: u32,
    pub pool_size: usize,
    pub max_voices_per_kind: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            mix_size_ms: voice::MIX_SIZE_MS,
            pool_size: voice::POOL_SIZE,
            max_voices_per_kind: 32,
        }
    }
}

/// Which of the mixer worker's three lists a voice belongs to. Distinct
/// from [`VoiceKind`]: a `Stream` voice still mixes as `Panning` (software
/// stereo panning), it is simply backed by a streamed decoder and lives in
/// its own list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceList {
    Panning,
    Spatial,
    Stream,
}

/// A stable handle to a voice: which list it lives in plus its slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceId {
    pub list: VoiceList,
    pub index: usize,
}

pub struct Engine {
    device: Box<dyn Device>,
    effects: Mutex<EffectEngine>,
    lists: Arc<VoiceLists>,
    wakeup: Arc<Wakeup>,
    worker: Option<MixerWorker>,
    start_time: Instant,
    master_listener_volume: AtomicI32,
    listener: Mutex<Option<StreamingVoice>>,
    config: EngineConfig,
}

impl Engine {
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        let device = audio_backend::open_default_device()?;
        let effects = EffectEngine::new(device.as_ref())?;
        let lists = VoiceLists::new();
        let wakeup = Wakeup::new();
        let worker = MixerWorker::spawn(lists.clone(), wakeup.clone());

        tracing::info!(mix_size_ms = config.mix_size_ms, pool_size = config.pool_size, "engine started");

        Ok(Engine {
            device,
            effects: Mutex::new(effects),
            lists,
            wakeup,
            worker: Some(worker),
            start_time: Instant::now(),
            master_listener_volume: AtomicI32::new(0),
            listener: Mutex::new(None),
            config,
        })
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Wall-clock milliseconds since engine startup, wrapping at 2^32.
    pub fn ms_count(&self) -> u32 {
        self.start_time.elapsed().as_millis() as u32
    }

    fn list_mutex(&self, list: VoiceList) -> &Mutex<slots::SlotList<StreamingVoice>> {
        match list {
            VoiceList::Panning => &self.lists.panning,
            VoiceList::Spatial => &self.lists.spatial,
            VoiceList::Stream => &self.lists.streams,
        }
    }

    fn reverb_route(&self) -> Option<u32> {
        self.effects.lock().route_handle()
    }

    pub fn allocate_voice(&self, list: VoiceList) -> VoiceId {
        let kind = match list {
            VoiceList::Panning | VoiceList::Stream => VoiceKind::Panning,
            VoiceList::Spatial => VoiceKind::SpatialSource,
        };
        let voice = StreamingVoice::new(kind, self.device.as_ref());
        let index = self.list_mutex(list).lock().insert(voice);
        VoiceId { list, index }
    }

    pub fn release_voice(&self, id: VoiceId) {
        self.list_mutex(id.list).lock().remove(id.index);
    }

    pub fn with_voice<R>(&self, id: VoiceId, f: impl FnOnce(&mut StreamingVoice) -> R) -> Option<R> {
        let mut guard = self.list_mutex(id.list).lock();
        guard.get_mut(id.index).map(f)
    }

    pub fn open_voice(&self, id: VoiceId, params: OpenParams) -> Result<(), EngineError> {
        let route = self.reverb_route();
        let result = self
            .with_voice(id, |voice| voice.open(params, route))
            .ok_or_else(|| EngineError::Configuration("unknown voice handle".into()))?;
        self.wakeup.notify();
        result
    }

    pub fn start_voice(&self, id: VoiceId) {
        self.with_voice(id, |voice| voice.start());
        self.wakeup.notify();
    }

    pub fn stop_voice(&self, id: VoiceId) {
        self.with_voice(id, |voice| voice.stop());
        self.wakeup.notify();
    }

    pub fn pause_voice(&self, id: VoiceId) {
        self.with_voice(id, |voice| voice.pause());
        self.wakeup.notify();
    }

    pub fn resume_voice(&self, id: VoiceId) {
        self.with_voice(id, |voice| voice.resume());
        self.wakeup.notify();
    }

    pub fn set_digital_master_volume(&self, volume: i32) {
        let volume = volume.clamp(-10000, 0);
        self.master_listener_volume.store(volume, Ordering::SeqCst);
        let mut listener = self.listener.lock();
        match listener.as_mut() {
            Some(voice) => {
                voice.set_master_listener_volume(volume);
                self.sync_listener_gain(voice);
            }
            None => self.device.set_listener_gain(centibel_to_gain(volume)),
        }
    }

    pub fn digital_master_volume(&self) -> i32 {
        self.master_listener_volume.load(Ordering::SeqCst)
    }

    /// Mutes the listener on focus loss; restores on focus regain.
    pub fn handle_focus_lost(&self, lost: bool) {
        let mut listener = self.listener.lock();
        if let Some(voice) = listener.as_mut() {
            voice.set_listener_muted(lost);
            self.sync_listener_gain(voice);
        }
    }

    /// Opens the singleton listener voice. Only one may exist at a time.
    pub fn open_3d_listener(&self) -> Result<(), EngineError> {
        let mut listener = self.listener.lock();
        if listener.is_some() {
            return Err(EngineError::ListenerAlreadyOpen);
        }
        let mut voice = StreamingVoice::new(VoiceKind::SpatialListener, self.device.as_ref());
        voice.set_master_listener_volume(self.master_listener_volume.load(Ordering::SeqCst));
        *listener = Some(voice);
        Ok(())
    }

    pub fn close_3d_listener(&self) -> Result<(), EngineError> {
        let mut listener = self.listener.lock();
        if listener.take().is_none() {
            return Err(EngineError::NoListener);
        }
        Ok(())
    }

    pub fn set_listener_doppler(&self, factor: f32) -> Result<(), EngineError> {
        let mut listener = self.listener.lock();
        let voice = listener.as_mut().ok_or(EngineError::NoListener)?;
        voice.set_doppler_factor(factor)?;
        self.device.set_doppler_factor(voice.doppler_factor());
        Ok(())
    }

    pub fn set_3d_listener_position(&self, position: [f32; 3]) -> Result<(), EngineError> {
        let mut listener = self.listener.lock();
        let voice = listener.as_mut().ok_or(EngineError::NoListener)?;
        voice.set_position(position)?;
        self.device.set_listener_position(listener::to_device_space(position));
        Ok(())
    }

    pub fn get_3d_listener_position(&self) -> Result<[f32; 3], EngineError> {
        let listener = self.listener.lock();
        let voice = listener.as_ref().ok_or(EngineError::NoListener)?;
        Ok(voice.position())
    }

    pub fn set_3d_listener_velocity(&self, velocity: [f32; 3]) -> Result<(), EngineError> {
        let mut listener = self.listener.lock();
        let voice = listener.as_mut().ok_or(EngineError::NoListener)?;
        voice.set_velocity(velocity)?;
        self.device.set_listener_velocity(listener::to_device_space(velocity));
        Ok(())
    }

    pub fn get_3d_listener_velocity(&self) -> Result<[f32; 3], EngineError> {
        let listener = self.listener.lock();
        let voice = listener.as_ref().ok_or(EngineError::NoListener)?;
        Ok(voice.velocity())
    }

    pub fn set_3d_orientation(&self, at: [f32; 3], up: [f32; 3]) -> Result<(), EngineError> {
        let mut listener = self.listener.lock();
        let voice = listener.as_mut().ok_or(EngineError::NoListener)?;
        voice.set_orientation(at, up)?;
        let (dev_at, dev_up) = listener::orientation_to_device_space(at, up);
        self.device.set_listener_orientation(dev_at, dev_up);
        Ok(())
    }

    pub fn get_3d_orientation(&self) -> Result<([f32; 3], [f32; 3]), EngineError> {
        let listener = self.listener.lock();
        let voice = listener.as_ref().ok_or(EngineError::NoListener)?;
        Ok(voice.orientation())
    }

    fn sync_listener_gain(&self, voice: &StreamingVoice) {
        self.device.set_listener_gain(voice.effective_listener_gain());
    }

    /// Reconfigures the effect slot. Newly opened spatial voices route
    /// through it from that point on; voices already open keep whatever
    /// routing they were given at their own `open()` time (§4.1).
    pub fn set_reverb(&self, enable: bool, settings: EnvironmentSettings) -> Result<(), EngineError> {
        let mut effects = self.effects.lock();
        effects.set_environment(settings)?;
        effects.enable(enable)?;
        Ok(())
    }

    pub fn supports_eax20_filter(&self) -> bool {
        self.effects.lock().is_available()
    }

    pub fn shutdown(mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
        tracing::info!("engine shut down");
    }
}

fn centibel_to_gain(centibel: i32) -> f32 {
    10f32.powf(centibel as f32 / 2000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_is_a_singleton() {
        let engine = Engine::start(EngineConfig::default()).unwrap();
        engine.open_3d_listener().unwrap();
        assert!(engine.open_3d_listener().is_err());
        engine.close_3d_listener().unwrap();
        engine.open_3d_listener().unwrap();
        engine.shutdown();
    }

    #[test]
    fn ms_count_advances() {
        let engine = Engine::start(EngineConfig::default()).unwrap();
        let a = engine.ms_count();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = engine.ms_count();
        assert!(b >= a);
        engine.shutdown();
    }

    #[test]
    fn listener_position_and_velocity_round_trip() {
        let engine = Engine::start(EngineConfig::default()).unwrap();
        engine.open_3d_listener().unwrap();
        engine.set_3d_listener_position([1.0, 2.0, 3.0]).unwrap();
        engine.set_3d_listener_velocity([0.5, 0.0, -0.5]).unwrap();
        assert_eq!(engine.get_3d_listener_position().unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(engine.get_3d_listener_velocity().unwrap(), [0.5, 0.0, -0.5]);
        engine.close_3d_listener().unwrap();
        assert!(engine.get_3d_listener_position().is_err());
        engine.shutdown();
    }

    #[test]
    fn allocate_and_release_voice_reuses_slot() {
        let engine = Engine::start(EngineConfig::default()).unwrap();
        let id1 = engine.allocate_voice(VoiceList::Panning);
        engine.release_voice(id1);
        let id2 = engine.allocate_voice(VoiceList::Panning);
        assert_eq!(id1.index, id2.index);
        engine.shutdown();
    }
}
