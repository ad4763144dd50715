//! End-to-end scenarios driving the full `soundsys` -> `audio-engine` ->
//! `audio-effects` -> `audio-backend` (mock) stack, mirroring the documented
//! panning/looping/spatial/reverb walkthroughs.

use std::thread;
use std::time::Duration;

use audio_engine::WaveFormat;
use audio_effects::EnvironmentSettings;
use soundsys::SoundSys;

fn mono_wave() -> WaveFormat {
    WaveFormat {
        channel_count: 1,
        bit_depth: 16,
        sample_rate: 22_050,
    }
}

fn samples(count: usize, value: i16) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(count * 2);
    for _ in 0..count {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn settle() {
    thread::sleep(Duration::from_millis(30));
}

#[test]
fn centered_panning_voice_plays_and_drains() {
    let sys = SoundSys::new();
    sys.wave_out_open(0, Default::default()).unwrap();

    let handle = sys.allocate_sample_handle().unwrap();
    sys.init_sample_from_address(handle, samples(4096, 1000), mono_wave()).unwrap();
    sys.set_sample_pan(handle, 64).unwrap();
    sys.set_sample_volume(handle, 0).unwrap();
    sys.start_sample(handle).unwrap();

    for _ in 0..10 {
        settle();
        if sys.sample_status(handle).unwrap() == audio_engine::Status::Stopped {
            break;
        }
    }

    assert_eq!(sys.sample_status(handle).unwrap(), audio_engine::Status::Stopped);
    sys.release_sample_handle(handle).unwrap();
    sys.shutdown();
}

#[test]
fn hard_left_pan_is_accepted_and_stored() {
    let sys = SoundSys::new();
    sys.wave_out_open(0, Default::default()).unwrap();

    let handle = sys.allocate_sample_handle().unwrap();
    sys.init_sample_from_address(handle, samples(512, 500), mono_wave()).unwrap();
    sys.set_sample_pan(handle, 0).unwrap();
    assert_eq!(sys.sample_pan(handle).unwrap(), 0);
    sys.release_sample_handle(handle).unwrap();
    sys.shutdown();
}

#[test]
fn looping_sample_keeps_playing_past_its_natural_end() {
    let sys = SoundSys::new();
    sys.wave_out_open(0, Default::default()).unwrap();

    let handle = sys.allocate_sample_handle().unwrap();
    sys.init_sample_from_address(handle, samples(1024, 777), mono_wave()).unwrap();
    sys.set_sample_loop(handle, true).unwrap();
    sys.start_sample(handle).unwrap();

    settle();
    settle();
    settle();

    // A looping voice never reaches Stopped on its own.
    assert_eq!(sys.sample_status(handle).unwrap(), audio_engine::Status::Playing);

    sys.stop_sample(handle).unwrap();
    assert_eq!(sys.sample_status(handle).unwrap(), audio_engine::Status::Stopped);
    sys.release_sample_handle(handle).unwrap();
    sys.shutdown();
}

#[test]
fn spatial_source_at_unit_distance_plays() {
    let sys = SoundSys::new();
    sys.wave_out_open(0, Default::default()).unwrap();
    sys.open_3d_listener().unwrap();

    let handle = sys.allocate_3d_sample_handle().unwrap();
    sys.init_3d_sample_from_address(handle, samples(2048, 300), mono_wave()).unwrap();
    sys.set_3d_sample_distances(handle, 1.0, 100.0).unwrap();
    sys.set_3d_position(handle, [0.0, 0.0, 1.0]).unwrap();
    sys.start_3d_sample(handle).unwrap();

    settle();
    assert_eq!(sys.get_3d_sample_status(handle).unwrap(), audio_engine::Status::Playing);

    sys.release_3d_sample_handle(handle).unwrap();
    sys.close_3d_listener().unwrap();
    sys.shutdown();
}

#[test]
fn spatial_source_rejects_stereo_input() {
    let sys = SoundSys::new();
    sys.wave_out_open(0, Default::default()).unwrap();

    let handle = sys.allocate_3d_sample_handle().unwrap();
    let stereo = WaveFormat {
        channel_count: 2,
        bit_depth: 16,
        sample_rate: 22_050,
    };
    assert!(sys.init_3d_sample_from_address(handle, samples(1024, 1), stereo).is_err());
    sys.shutdown();
}

#[test]
fn reverb_toggle_round_trips_through_the_effect_engine() {
    let sys = SoundSys::new();
    sys.wave_out_open(0, Default::default()).unwrap();

    assert!(sys.supports_eax20_filter());
    sys.set_eax20_filter(true, EnvironmentSettings::default()).unwrap();
    sys.set_eax20_filter(false, EnvironmentSettings::default()).unwrap();
    sys.shutdown();
}

#[test]
fn master_volume_mutes_while_focus_is_lost() {
    let sys = SoundSys::new();
    sys.wave_out_open(0, Default::default()).unwrap();
    sys.open_3d_listener().unwrap();

    sys.set_digital_master_volume(-500).unwrap();
    assert_eq!(sys.digital_master_volume().unwrap(), -500);

    sys.handle_focus_lost(true).unwrap();
    sys.handle_focus_lost(false).unwrap();

    sys.close_3d_listener().unwrap();
    sys.shutdown();
}
