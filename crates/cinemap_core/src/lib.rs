//! Cinemap Core
//!
//! Shared primitives for the cinematic map camera and its viewer sync layer:
//!
//! - **Camera state**: the four numbers describing a map view, plus the
//!   [`CameraHandle`] seam to a live rendering surface
//! - **Frame scheduling**: a host-agnostic per-frame callback interface with a
//!   hand-driven [`ManualScheduler`] for headless hosts and tests
//! - **Clocks**: wall-clock and manual millisecond time sources
//! - **Domain records**: landmarks and shot identifiers
//!
//! # Example
//!
//! ```rust
//! use cinemap_core::{FrameScheduler, ManualScheduler};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let scheduler = ManualScheduler::new();
//! let seen = Rc::new(Cell::new(0.0));
//! let seen_in_frame = seen.clone();
//! scheduler.schedule_frame(Box::new(move |ts| seen_in_frame.set(ts)));
//!
//! scheduler.run_frame(16.0);
//! assert_eq!(seen.get(), 16.0);
//! ```

pub mod camera;
pub mod clock;
pub mod error;
pub mod frame;
pub mod landmark;
pub mod shot;

pub use camera::{CameraHandle, CameraState, LngLat, MAX_PITCH, MAX_ZOOM, METERS_PER_DEGREE, MIN_ZOOM};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, SurfaceError};
pub use frame::{FrameCallback, FrameHandle, FrameScheduler, ManualScheduler};
pub use landmark::Landmark;
pub use shot::{ShotOutcome, ShotType};
