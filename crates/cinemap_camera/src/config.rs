//! Engine and shot configuration
//!
//! Every struct deserializes with `#[serde(default)]`, so a project file only
//! needs to name the fields it overrides.

use cinemap_animation::{Easing, OffsetSide};
use serde::{Deserialize, Serialize};

/// Engine-wide settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CinematicConfig {
    /// Blend idle breathing into the tail of every shot
    pub breathing_enabled: bool,
    /// Raw progress after which breathing starts fading in
    pub breathing_blend_start: f64,
    /// Multiplier on the breathing amplitudes (1.0 = library defaults)
    pub breathing_intensity: f64,
}

impl Default for CinematicConfig {
    fn default() -> Self {
        Self {
            breathing_enabled: true,
            breathing_blend_start: 0.8,
            breathing_intensity: 1.0,
        }
    }
}

/// High-altitude descent onto a target
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstablishingConfig {
    pub duration_ms: u32,
    /// Hold on the starting pose before descending
    pub setup_pause_ms: u32,
    pub start_zoom: f64,
    pub end_zoom: f64,
    pub start_pitch: f64,
    pub end_pitch: f64,
    /// Degrees of bearing drift over the descent
    pub orbit_angle: f64,
}

impl Default for EstablishingConfig {
    fn default() -> Self {
        Self {
            duration_ms: 6000,
            setup_pause_ms: 300,
            start_zoom: 3.5,
            end_zoom: 12.5,
            start_pitch: 0.0,
            end_pitch: 45.0,
            orbit_angle: 30.0,
        }
    }
}

/// Constant-speed flight along a route
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyConfig {
    /// Flight time per kilometre of camera path
    pub ms_per_km: f64,
    pub min_duration_ms: u32,
    pub max_duration_ms: u32,
    pub zoom: f64,
    pub pitch: f64,
    /// Upper bound on banking, degrees
    pub max_banking: f64,
    /// Pitch reduction per degree of banking
    pub banking_pitch_factor: f64,
    /// Lateral camera offset from the route line, degrees
    pub offset_distance: f64,
    pub offset_side: OffsetSide,
    /// Simplification tolerance, degrees
    pub simplify_tolerance: f64,
    /// Fraction of the route drawn ahead of the camera
    pub route_draw_ahead: f64,
    /// Blend rate of the camera bearing towards the path heading
    pub bearing_smoothing: f64,
    pub easing: Easing,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            ms_per_km: 2500.0,
            min_duration_ms: 4000,
            max_duration_ms: 20000,
            zoom: 14.5,
            pitch: 60.0,
            max_banking: 8.0,
            banking_pitch_factor: 0.6,
            offset_distance: 0.0006,
            offset_side: OffsetSide::Left,
            simplify_tolerance: 0.0001,
            route_draw_ahead: 0.05,
            bearing_smoothing: 0.15,
            easing: Easing::CinematicEaseInOut,
        }
    }
}

/// Approach then settle on a destination
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub approach_duration_ms: u32,
    pub settle_duration_ms: u32,
    pub zoom: f64,
    pub pitch: f64,
    /// Final bearing; keeps the current bearing when unset
    pub bearing: Option<f64>,
    /// Bearing drift during the settle phase
    pub settle_orbit: f64,
    /// Amplitude of the zoom micro-pulse while settling
    pub zoom_pulse: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            approach_duration_ms: 3500,
            settle_duration_ms: 1500,
            zoom: 16.0,
            pitch: 55.0,
            bearing: None,
            settle_orbit: 12.0,
            zoom_pulse: 0.12,
        }
    }
}

/// Curved approach, move onto an orbit, then circle a landmark
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkHighlightConfig {
    pub approach_duration_ms: u32,
    pub transition_duration_ms: u32,
    pub orbit_duration_ms: u32,
    pub zoom: f64,
    pub pitch: f64,
    /// Perpendicular control-point offset as a fraction of the approach length
    pub curve_intensity: f64,
    /// How far the zoom dips out at the middle of the approach
    pub parallax_zoom_out: f64,
    /// Orbit radius around the landmark, degrees
    pub orbit_radius: f64,
    /// Total rotation of the orbit phase, degrees
    pub orbit_angle: f64,
    pub orbit_pitch: f64,
    /// Amplitude of zoom breathing while orbiting
    pub orbit_zoom_breath: f64,
    /// Amplitude of pitch breathing while orbiting
    pub orbit_pitch_breath: f64,
}

impl Default for LandmarkHighlightConfig {
    fn default() -> Self {
        Self {
            approach_duration_ms: 4000,
            transition_duration_ms: 1200,
            orbit_duration_ms: 9000,
            zoom: 16.5,
            pitch: 60.0,
            curve_intensity: 0.3,
            parallax_zoom_out: 1.5,
            orbit_radius: 0.0012,
            orbit_angle: 360.0,
            orbit_pitch: 55.0,
            orbit_zoom_breath: 0.08,
            orbit_pitch_breath: 2.0,
        }
    }
}

/// Spiral outwards around a point while revealing labels
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextualOrbitConfig {
    pub duration_ms: u32,
    pub start_radius: f64,
    pub end_radius: f64,
    pub turns: f64,
    pub segments: usize,
    pub zoom: f64,
    pub pitch: f64,
    pub zoom_pulse: f64,
}

impl Default for ContextualOrbitConfig {
    fn default() -> Self {
        Self {
            duration_ms: 12000,
            start_radius: 0.001,
            end_radius: 0.004,
            turns: 1.0,
            segments: 120,
            zoom: 15.0,
            pitch: 50.0,
            zoom_pulse: 0.1,
        }
    }
}

/// Every shot's configuration in one place, for project files
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotConfigs {
    pub establishing: EstablishingConfig,
    pub journey: JourneyConfig,
    pub reveal: RevealConfig,
    pub landmark: LandmarkHighlightConfig,
    pub orbit: ContextualOrbitConfig,
}
