//! The built-in shot programs

mod establishing;
mod journey;
mod landmark;
mod orbit;
mod reveal;

pub(crate) use establishing::EstablishingShot;
pub(crate) use journey::JourneyShot;
pub(crate) use landmark::LandmarkHighlightShot;
pub(crate) use orbit::ContextualOrbitShot;
pub(crate) use reveal::RevealShot;

pub use landmark::{HighlightPhase, TravelProgress};

use cinemap_core::LngLat;

/// Receives the growing route slice during a journey
pub type RouteDrawCallback = Box<dyn FnMut(&[LngLat])>;

/// Receives travel progress during a landmark highlight
pub type TravelCallback = Box<dyn FnMut(TravelProgress)>;

/// Receives cumulative rotation degrees during a contextual orbit
pub type LabelRevealCallback = Box<dyn FnMut(f64)>;
