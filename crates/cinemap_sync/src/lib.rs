//! Cinemap Sync
//!
//! Keeps several viewers of one map in step: a single **receiver** (the shared
//! display) and any number of **controllers** exchange small JSON events over
//! a broadcast [`Transport`].
//!
//! There is no server-side arbitration. Conflicts are avoided with time
//! windows instead ([`TemporalGuards`]):
//!
//! - nothing guarded is sent or applied for 8 s after a session mounts
//! - outgoing camera updates pause for 1 s after a remote update is accepted
//! - camera updates are neither sent nor applied for 6 s after a landmark
//!   selection, while the camera flies the route
//!
//! Camera updates are additionally throttled to one per 300 ms with a trailing
//! update, and inbound cameras with zoom outside `[1, 22]` are dropped.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cinemap_core::{CameraState, LngLat, ManualClock};
//! use cinemap_sync::{LocalBus, RouteAnimationGate, SessionOptions, SyncSession};
//!
//! let bus = LocalBus::new();
//! let clock = Arc::new(ManualClock::new(0));
//! let mut receiver = SyncSession::new(
//!     bus.connect(),
//!     SessionOptions::receiver(),
//!     clock.clone(),
//!     RouteAnimationGate::new(),
//! );
//! let mut controller = SyncSession::new(
//!     bus.connect(),
//!     SessionOptions::controller(),
//!     clock.clone(),
//!     RouteAnimationGate::new(),
//! );
//!
//! clock.advance(9_000);
//! let camera = CameraState::new(LngLat::new(126.97, 37.56), 14.0, 45.0, 0.0);
//! assert!(controller.sync_camera(camera).is_sent());
//!
//! receiver.on_camera_update(|camera| assert_eq!(camera.zoom, 14.0));
//! receiver.pump();
//! assert_eq!(receiver.stats().applied, 1);
//! ```

pub mod channel;
pub mod error;
pub mod guards;
pub mod hooks;
pub mod protocol;
pub mod session;
pub mod throttle;
pub mod transport;

pub use channel::{Subscriber, SyncChannel};
pub use error::{Result, SyncError};
pub use guards::{DropReason, RouteAnimationGate, SyncTimings, TemporalGuards};
pub use hooks::AspectStatus;
pub use protocol::{
    AspectRatio, Empty, EventPolicy, FilterState, LandmarkSelection, PeerJoin, Priority,
    RouteCreated, SyncEvent, SyncMessage, SyncRole, ViewModeChange, DEFAULT_ASPECT_RATIO,
};
pub use session::{SendStatus, SessionOptions, SyncStats, SyncSession};
pub use throttle::TrailingThrottle;
pub use transport::{ConnectionState, LocalBus, LocalEndpoint, Transport};
