//! Camera state and the rendering surface seam

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Lowest zoom the engine will ever write to a surface
pub const MIN_ZOOM: f64 = 0.0;

/// Highest zoom the engine will ever write to a surface
pub const MAX_ZOOM: f64 = 22.0;

/// Steepest camera tilt in degrees
pub const MAX_PITCH: f64 = 85.0;

/// Planar degrees-to-meters factor, used for display telemetry only
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// A geographic position in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    /// Linear interpolation between two positions
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            lng: self.lng + (other.lng - self.lng) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }
}

impl From<(f64, f64)> for LngLat {
    fn from((lng, lat): (f64, f64)) -> Self {
        Self { lng, lat }
    }
}

/// The full description of a map view
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl CameraState {
    pub const fn new(center: LngLat, zoom: f64, pitch: f64, bearing: f64) -> Self {
        Self {
            center,
            zoom,
            pitch,
            bearing,
        }
    }

    /// All four fields are finite numbers and zoom lies in `[MIN_ZOOM, MAX_ZOOM]`
    pub fn is_valid(&self) -> bool {
        self.center.is_finite()
            && self.pitch.is_finite()
            && self.bearing.is_finite()
            && self.zoom.is_finite()
            && (MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom)
    }

    /// Clamp zoom and pitch into range and wrap bearing into `[0, 360)`.
    ///
    /// Returns `None` when any field is not a finite number; such a state is
    /// never safe to hand to a surface.
    pub fn sanitized(&self) -> Option<Self> {
        if !(self.center.is_finite()
            && self.zoom.is_finite()
            && self.pitch.is_finite()
            && self.bearing.is_finite())
        {
            return None;
        }
        Some(Self {
            center: LngLat {
                lng: self.center.lng,
                lat: self.center.lat.clamp(-85.0, 85.0),
            },
            zoom: self.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            pitch: self.pitch.clamp(0.0, MAX_PITCH),
            bearing: self.bearing.rem_euclid(360.0),
        })
    }
}

/// A live camera on an already-initialized map surface.
///
/// Implementations wrap whatever the host renders with. The engine reads the
/// camera at the start of every shot and writes one complete state per frame.
pub trait CameraHandle {
    /// Current camera as displayed by the surface
    fn camera(&self) -> CameraState;

    /// Write a complete camera state to the surface
    fn apply(&mut self, state: &CameraState) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_wraps_and_clamps() {
        let state = CameraState::new(LngLat::new(10.0, 50.0), 30.0, 120.0, -30.0);
        let clean = state.sanitized().unwrap();
        assert_eq!(clean.zoom, MAX_ZOOM);
        assert_eq!(clean.pitch, MAX_PITCH);
        assert!((clean.bearing - 330.0).abs() < 1e-9);
        assert!(clean.is_valid());
    }

    #[test]
    fn test_sanitized_rejects_nan() {
        let state = CameraState::new(LngLat::new(f64::NAN, 0.0), 10.0, 0.0, 0.0);
        assert!(state.sanitized().is_none());
        assert!(!state.is_valid());
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = LngLat::new(0.0, 0.0).lerp(LngLat::new(2.0, -4.0), 0.5);
        assert_eq!(mid, LngLat::new(1.0, -2.0));
    }
}
