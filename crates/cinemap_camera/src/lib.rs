//! Cinemap Camera Engine
//!
//! Frame-driven cinematic shots over a live map camera.
//!
//! # Features
//!
//! - **Shots**: establishing descent, constant-speed route journey, reveal,
//!   three-phase landmark highlight, spiralling contextual orbit, and custom
//!   closure-driven shots
//! - **Single writer**: starting a shot retires the previous one before the new
//!   one writes a single frame
//! - **Cooperative cancellation**: every shot returns a [`ShotHandle`] future
//!   that resolves `Completed` or `Cancelled`
//! - **Breathing**: idle micro-motion, blended into the tail of every shot
//! - **Host agnostic**: frames come from any [`cinemap_core::FrameScheduler`]

pub mod config;
pub mod driver;
pub mod engine;
pub mod handle;
pub mod shots;

pub use config::{
    CinematicConfig, ContextualOrbitConfig, EstablishingConfig, JourneyConfig,
    LandmarkHighlightConfig, RevealConfig, ShotConfigs,
};
pub use driver::{FrameContext, Segment, ShotProgram};
pub use engine::{CameraTelemetry, CinematicCamera, EnginePhase, ProgressCallback};
pub use handle::{CancelToken, ShotHandle};
pub use shots::{
    HighlightPhase, LabelRevealCallback, RouteDrawCallback, TravelCallback, TravelProgress,
};
