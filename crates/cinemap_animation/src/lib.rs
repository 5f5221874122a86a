//! Cinemap Animation Math
//!
//! Pure functions the camera engine composes into shots.
//!
//! # Features
//!
//! - **Easing**: cinematic, drone-landing, dramatic-reveal and orbit curves
//! - **Interpolation**: linear and shorter-arc bearing interpolation
//! - **Breathing**: small time-driven offsets that keep an idle camera alive
//! - **Camera paths**: simplification, lateral offsets, arc-length
//!   reparameterization, bearing/curvature/banking and spiral generation

pub mod breathing;
pub mod easing;
pub mod interpolate;
pub mod path;

pub use breathing::{breathing_motion, BreathingOffsets};
pub use easing::{gentle_pulse, Easing};
pub use interpolate::{lerp, lerp_bearing, normalize_bearing};
pub use path::{ArcLengthTable, OffsetSide};
