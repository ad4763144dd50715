//! An in-memory device simulation used for tests and CI where no real
//! sound card is available. Tracks enough state (queued/processed
//! buffers, play state, listener/source parameters) to exercise the
//! mixer and effect engine logic without ever touching hardware.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::device::{BufferFormat, Device, EaxReverbParams, ReverbSlot, Source, SourceState};
use crate::BackendError;

pub struct MockDevice {
    sample_rate: u32,
    efx: AtomicBool,
    eax_reverb: AtomicBool,
    listener_gain: Mutex<f32>,
}

impl MockDevice {
    pub fn new() -> Self {
        MockDevice {
            sample_rate: 48_000,
            efx: AtomicBool::new(true),
            eax_reverb: AtomicBool::new(true),
            listener_gain: Mutex::new(1.0),
        }
    }

    /// Test hook: simulate a device that lacks EFX entirely.
    pub fn without_efx(self) -> Self {
        self.efx.store(false, Ordering::Relaxed);
        self.eax_reverb.store(false, Ordering::Relaxed);
        self
    }

    /// Test hook: simulate a device with plain-reverb-only EFX support.
    pub fn without_eax_reverb(self) -> Self {
        self.eax_reverb.store(false, Ordering::Relaxed);
        self
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for MockDevice {
    fn output_sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn supports_efx(&self) -> bool {
        self.efx.load(Ordering::Relaxed)
    }

    fn supports_eax_reverb(&self) -> bool {
        self.eax_reverb.load(Ordering::Relaxed)
    }

    fn create_source(&self) -> Result<Box<dyn Source>, BackendError> {
        Ok(Box::new(MockSource::default()))
    }

    fn create_reverb_slot(&self) -> Result<Box<dyn ReverbSlot>, BackendError> {
        Ok(Box::new(MockReverbSlot::default()))
    }

    fn set_listener_gain(&self, gain: f32) {
        *self.listener_gain.lock().unwrap() = gain;
    }

    fn set_listener_position(&self, _position: [f32; 3]) {}
    fn set_listener_velocity(&self, _velocity: [f32; 3]) {}
    fn set_listener_orientation(&self, _at: [f32; 3], _up: [f32; 3]) {}
    fn set_doppler_factor(&self, _factor: f32) {}
}

struct MockSource {
    queued: Vec<Vec<u8>>,
    processed: usize,
    state: SourceState,
    gain: f32,
    pitch: f32,
    position: [f32; 3],
    velocity: [f32; 3],
    direction: [f32; 3],
    relative: bool,
    distance_range: (f32, f32),
    routed: Arc<AtomicU32>,
}

impl Default for MockSource {
    fn default() -> Self {
        MockSource {
            queued: Vec::new(),
            processed: 0,
            state: SourceState::Initial,
            gain: 1.0,
            pitch: 1.0,
            position: [0.0, 0.0, 0.0],
            velocity: [0.0, 0.0, 0.0],
            direction: [0.0, 0.0, 0.0],
            relative: false,
            distance_range: (1.0, 100.0),
            routed: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl Source for MockSource {
    fn queue_buffer(&mut self, pcm: &[u8], _format: BufferFormat) -> Result<(), BackendError> {
        self.queued.push(pcm.to_vec());
        // A mock device finishes a buffer the instant the *next* one is
        // queued, so tests can exercise the unqueue path deterministically.
        if self.queued.len() > 1 {
            self.processed += 1;
        }
        Ok(())
    }

    fn unqueue_processed(&mut self) -> usize {
        let n = self.processed.min(self.queued.len().saturating_sub(1));
        for _ in 0..n {
            self.queued.remove(0);
        }
        self.processed -= n;
        n
    }

    fn buffers_queued(&self) -> usize {
        self.queued.len()
    }

    fn buffers_processed(&self) -> usize {
        self.processed
    }

    fn play(&mut self) {
        self.state = SourceState::Playing;
    }

    fn pause(&mut self) {
        if self.state == SourceState::Playing {
            self.state = SourceState::Paused;
        }
    }

    fn stop(&mut self) {
        self.state = SourceState::Stopped;
        self.queued.clear();
        self.processed = 0;
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    fn gain(&self) -> f32 {
        self.gain
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: [f32; 3]) {
        self.velocity = velocity;
    }

    fn set_direction(&mut self, direction: [f32; 3]) {
        self.direction = direction;
    }

    fn set_distance_range(&mut self, min_distance: f32, max_distance: f32) {
        self.distance_range = (min_distance, max_distance);
    }

    fn set_relative(&mut self, relative: bool) {
        self.relative = relative;
    }

    fn route_through_slot(&mut self, slot_handle: Option<u32>) {
        self.routed.store(slot_handle.unwrap_or(0), Ordering::Relaxed);
    }
}

struct MockReverbSlot {
    handle: u32,
    last_eax: Option<EaxReverbParams>,
    is_null: bool,
}

impl Default for MockReverbSlot {
    fn default() -> Self {
        use std::sync::atomic::AtomicU32 as Counter;
        static NEXT: Counter = Counter::new(1);
        MockReverbSlot {
            handle: NEXT.fetch_add(1, Ordering::Relaxed),
            last_eax: None,
            is_null: false,
        }
    }
}

impl ReverbSlot for MockReverbSlot {
    fn set_eax_reverb(&mut self, params: &EaxReverbParams) -> Result<(), BackendError> {
        self.last_eax = Some(*params);
        self.is_null = false;
        Ok(())
    }

    fn set_plain_reverb(&mut self, params: &EaxReverbParams) -> Result<(), BackendError> {
        self.last_eax = Some(*params);
        self.is_null = false;
        Ok(())
    }

    fn set_null(&mut self) {
        self.is_null = true;
        self.last_eax = None;
    }

    fn raw_handle(&self) -> u32 {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queueing_a_second_buffer_marks_the_first_processed() {
        let mut src = MockSource::default();
        let fmt = BufferFormat {
            channel_count: 1,
            bit_depth: 16,
            sample_rate: 44_100,
        };
        src.queue_buffer(&[0, 0], fmt).unwrap();
        assert_eq!(src.buffers_processed(), 0);
        src.queue_buffer(&[0, 0], fmt).unwrap();
        assert_eq!(src.buffers_processed(), 1);
        assert_eq!(src.unqueue_processed(), 1);
        assert_eq!(src.buffers_queued(), 1);
    }
}
