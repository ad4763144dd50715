//! Coordinate-system and gain helpers for the listener/3D model.
//!
//! Game-world coordinates are left-handed (`+z` forward); the output
//! device expects right-handed coordinates, so every position, velocity,
//! direction and orientation axis pair is `z`-negated at the moment it is
//! submitted to the backend.

pub fn to_device_space(v: [f32; 3]) -> [f32; 3] {
    [v[0], v[1], -v[2]]
}

pub fn orientation_to_device_space(at: [f32; 3], up: [f32; 3]) -> ([f32; 3], [f32; 3]) {
    (to_device_space(at), to_device_space(up))
}

/// Combines a per-voice listener gain with the master listener gain,
/// forcing silence when the listener is muted.
pub fn effective_listener_gain(voice_gain: f32, master_gain: f32, muted: bool) -> f32 {
    if muted {
        0.0
    } else {
        voice_gain * master_gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_distance_source_negates_z() {
        assert_eq!(to_device_space([0.0, 0.0, 1.0]), [0.0, 0.0, -1.0]);
    }

    #[test]
    fn muted_listener_is_silent_regardless_of_gain() {
        assert_eq!(effective_listener_gain(1.0, 1.0, true), 0.0);
    }
}
