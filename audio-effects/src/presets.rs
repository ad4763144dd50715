//! The 26 named EFX/EAX reverb environment presets, indexed
//! `[0, 25]` with `GENERIC` (index 0) as the default used whenever a
//! caller's `environment_preset_id` falls outside that range.

use crate::ReverbPreset;

pub const PRESET_COUNT: usize = 26;
pub const DEFAULT_PRESET_INDEX: usize = 0;

pub const NAMES: [&str; PRESET_COUNT] = [
    "Generic",
    "PaddedCell",
    "Room",
    "Bathroom",
    "Livingroom",
    "Stoneroom",
    "Auditorium",
    "ConcertHall",
    "Cave",
    "Arena",
    "Hangar",
    "CarpetedHallway",
    "Hallway",
    "StoneCorridor",
    "Alley",
    "Forest",
    "City",
    "Mountains",
    "Quarry",
    "Plain",
    "ParkingLot",
    "SewerPipe",
    "Underwater",
    "Drugged",
    "Dizzy",
    "Psychotic",
];

/// Standard EFX reverb preset values (matches the values the
/// `AL_EFFECT_EAXREVERB`/`AL_EFFECT_REVERB` presets table in the EFX
/// reference implementation initializes each named environment to).
const fn preset(
    density: f32,
    diffusion: f32,
    gain: f32,
    gain_hf: f32,
    decay_time: f32,
    decay_hf_ratio: f32,
    reflections_gain: f32,
    reflections_delay: f32,
    late_reverb_gain: f32,
    late_reverb_delay: f32,
    air_absorption_gain_hf: f32,
    room_rolloff_factor: f32,
) -> ReverbPreset {
    ReverbPreset {
        density,
        diffusion,
        gain,
        gain_hf,
        decay_time,
        decay_hf_ratio,
        reflections_gain,
        reflections_delay,
        late_reverb_gain,
        late_reverb_delay,
        air_absorption_gain_hf,
        room_rolloff_factor,
    }
}

pub const PRESETS: [ReverbPreset; PRESET_COUNT] = [
    preset(1.0, 1.0, 0.32, 0.89, 1.49, 0.83, 0.05, 0.007, 1.26, 0.011, 0.994, 0.0), // Generic
    preset(0.17, 1.0, 0.25, 0.0, 0.17, 0.10, 0.25, 0.001, 1.27, 0.002, 0.994, 0.0), // PaddedCell
    preset(0.43, 1.0, 0.32, 0.89, 0.40, 0.83, 0.15, 0.002, 1.49, 0.003, 0.992, 0.0), // Room
    preset(0.13, 1.0, 0.32, 0.54, 1.49, 0.54, 0.65, 0.007, 1.91, 0.011, 0.700, 0.0), // Bathroom
    preset(0.42, 1.0, 0.32, 0.90, 0.50, 0.10, 0.10, 0.003, 1.06, 0.004, 0.993, 0.0), // Livingroom
    preset(1.0, 1.0, 0.32, 0.64, 2.31, 0.64, 0.45, 0.012, 1.83, 0.017, 0.987, 0.0), // Stoneroom
    preset(1.0, 1.0, 0.32, 0.59, 4.32, 0.59, 0.20, 0.020, 1.50, 0.030, 0.991, 0.0), // Auditorium
    preset(1.0, 1.0, 0.32, 0.70, 3.92, 0.70, 0.20, 0.020, 1.47, 0.029, 0.992, 0.0), // ConcertHall
    preset(1.0, 1.0, 0.32, 1.00, 2.91, 1.30, 0.15, 0.015, 1.0, 0.022, 1.0, 0.0), // Cave
    preset(1.0, 1.0, 0.32, 0.56, 7.24, 0.33, 0.26, 0.020, 1.02, 0.030, 0.988, 0.0), // Arena
    preset(1.0, 1.0, 0.32, 0.46, 10.05, 0.23, 0.50, 0.020, 1.26, 0.030, 0.964, 0.0), // Hangar
    preset(0.30, 1.0, 0.32, 0.89, 0.30, 0.10, 0.25, 0.002, 2.70, 0.030, 0.994, 0.0), // CarpetedHallway
    preset(1.0, 1.0, 0.32, 0.89, 1.49, 0.59, 0.05, 0.007, 1.99, 0.011, 0.994, 0.0), // Hallway
    preset(1.0, 1.0, 0.32, 0.64, 2.70, 0.79, 0.21, 0.013, 1.66, 0.020, 0.992, 0.0), // StoneCorridor
    preset(0.30, 1.0, 0.32, 0.30, 1.49, 0.86, 0.25, 0.007, 2.0, 0.011, 0.964, 0.0), // Alley
    preset(0.30, 1.0, 0.32, 0.54, 1.49, 0.54, 0.05, 0.162, 0.76, 0.088, 0.9, 0.0), // Forest
    preset(0.50, 1.0, 0.32, 0.67, 1.49, 0.67, 0.07, 0.007, 1.47, 0.011, 0.985, 0.0), // City
    preset(0.27, 1.0, 0.32, 0.21, 1.49, 0.21, 0.04, 0.300, 1.32, 0.100, 0.9, 0.0), // Mountains
    preset(1.0, 1.0, 0.32, 0.83, 1.49, 0.83, 0.61, 0.061, 1.12, 0.025, 0.900, 0.0), // Quarry
    preset(0.21, 1.0, 0.32, 0.50, 1.49, 0.50, 0.06, 0.179, 0.11, 0.100, 0.9, 0.0), // Plain
    preset(1.0, 1.0, 0.32, 1.0, 1.65, 1.50, 0.20, 0.008, 1.06, 0.012, 1.0, 0.0), // ParkingLot
    preset(0.30, 0.80, 0.32, 0.14, 2.81, 0.14, 0.63, 0.014, 3.24, 0.021, 0.5, 0.0), // SewerPipe
    preset(0.30, 0.70, 0.32, 0.01, 1.49, 0.10, 0.596, 0.007, 7.08, 0.011, 0.9, 0.0), // Underwater
    preset(0.50, 0.50, 0.32, 1.0, 8.39, 1.39, 0.876, 0.002, 3.108, 0.030, 1.0, 0.0), // Drugged
    preset(0.60, 0.60, 0.32, 0.81, 17.23, 0.56, 0.139, 0.020, 0.487, 0.030, 1.0, 0.0), // Dizzy
    preset(0.50, 0.70, 0.32, 0.86, 7.56, 0.91, 0.486, 0.020, 2.424, 0.030, 0.910, 0.0), // Psychotic
];

pub fn preset_for_index(index: i32) -> &'static ReverbPreset {
    if index < 0 || index as usize >= PRESET_COUNT {
        &PRESETS[DEFAULT_PRESET_INDEX]
    } else {
        &PRESETS[index as usize]
    }
}
