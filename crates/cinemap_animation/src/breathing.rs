//! Idle "breathing" motion
//!
//! Three incommensurate sine waves so the offsets never visibly repeat in
//! lock-step. All three start at zero, so starting breathing never jumps.

use std::f64::consts::TAU;

/// Base oscillation frequency in Hz
pub const BREATHING_FREQUENCY_HZ: f64 = 0.12;

pub const BREATHING_PITCH_AMPLITUDE: f64 = 1.5;
pub const BREATHING_BEARING_AMPLITUDE: f64 = 2.0;
pub const BREATHING_ZOOM_AMPLITUDE: f64 = 0.04;

/// Offsets to add on top of a baseline camera
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BreathingOffsets {
    pub pitch: f64,
    pub bearing: f64,
    pub zoom: f64,
}

impl BreathingOffsets {
    /// Scale every offset by `weight` (used to fade breathing in)
    pub fn scaled(self, weight: f64) -> Self {
        Self {
            pitch: self.pitch * weight,
            bearing: self.bearing * weight,
            zoom: self.zoom * weight,
        }
    }
}

/// Breathing offsets at `elapsed_ms` since breathing started.
///
/// Pure in its input: the same time always yields the same offsets, and each
/// component stays within its amplitude constant.
pub fn breathing_motion(elapsed_ms: f64) -> BreathingOffsets {
    let phase = elapsed_ms / 1000.0 * BREATHING_FREQUENCY_HZ * TAU;
    BreathingOffsets {
        pitch: BREATHING_PITCH_AMPLITUDE * phase.sin(),
        bearing: BREATHING_BEARING_AMPLITUDE * (phase * 0.7).sin(),
        zoom: BREATHING_ZOOM_AMPLITUDE * (phase * 1.3).sin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breathing_is_pure() {
        for t in [0.0, 16.7, 1234.5, 98_765.4] {
            assert_eq!(breathing_motion(t), breathing_motion(t));
        }
    }

    #[test]
    fn test_breathing_stays_in_bounds() {
        let mut t = 0.0;
        while t < 120_000.0 {
            let b = breathing_motion(t);
            assert!(b.pitch.abs() <= BREATHING_PITCH_AMPLITUDE);
            assert!(b.bearing.abs() <= BREATHING_BEARING_AMPLITUDE);
            assert!(b.zoom.abs() <= BREATHING_ZOOM_AMPLITUDE);
            t += 13.3;
        }
    }

    #[test]
    fn test_breathing_actually_moves() {
        let a = breathing_motion(0.0);
        let b = breathing_motion(2_000.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_breathing_starts_at_rest() {
        assert_eq!(breathing_motion(0.0), BreathingOffsets::default());
        let early = breathing_motion(16.0);
        assert!(early.bearing.abs() < 0.02);
        assert!(early.pitch.abs() < 0.02);
    }

    #[test]
    fn test_scaled_zero_is_still() {
        assert_eq!(breathing_motion(500.0).scaled(0.0), BreathingOffsets::default());
    }
}
