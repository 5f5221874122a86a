//! Temporal guards
//!
//! The only conflict avoidance between peers. Each guard is a time window:
//!
//! - **Initial block**: nothing guarded is sent or applied for a while after a
//!   session mounts, so the startup cinematic runs undisturbed.
//! - **Receive cooldown**: after accepting a remote message, outgoing camera
//!   updates are held back so two peers do not keep correcting each other.
//! - **Route-animation block**: after a landmark selection, camera updates are
//!   neither sent nor applied while the journey or reveal shot owns the camera.
//!
//! Plus the zoom validity filter for inbound cameras.

use std::sync::Arc;

use cinemap_core::LngLat;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Guard windows and limits, milliseconds unless noted
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncTimings {
    pub initial_block_ms: u64,
    pub receive_cooldown_ms: u64,
    pub route_animation_block_ms: u64,
    pub camera_throttle_ms: u64,
    pub aspect_broadcast_interval_ms: u64,
    pub aspect_fallback_timeout_ms: u64,
    /// Inbound camera zooms outside `[min_valid_zoom, max_valid_zoom]` are dropped
    pub min_valid_zoom: f64,
    pub max_valid_zoom: f64,
}

impl Default for SyncTimings {
    fn default() -> Self {
        Self {
            initial_block_ms: 8000,
            receive_cooldown_ms: 1000,
            route_animation_block_ms: 6000,
            camera_throttle_ms: 300,
            aspect_broadcast_interval_ms: 5000,
            aspect_fallback_timeout_ms: 3000,
            min_valid_zoom: 1.0,
            max_valid_zoom: 22.0,
        }
    }
}

/// Why a message was not sent or not applied
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    InitialBlock,
    Cooldown,
    RouteAnimation,
    /// Inbound zoom outside the valid range
    InvalidZoom,
    /// Inbound center off the globe, or a non-finite pitch or bearing
    InvalidCamera,
    /// Our own message coming back
    Echo,
    /// Missing or mistyped fields
    Malformed,
    UnknownEvent,
    /// Sent to the wrong side of the topology
    WrongRole,
}

/// Last landmark selection time, shared by every session that should honour
/// the same route-animation block.
///
/// Hand clones of one gate to sessions in the same process; give independent
/// engines their own.
#[derive(Clone, Debug, Default)]
pub struct RouteAnimationGate {
    last_select: Arc<Mutex<Option<u64>>>,
}

impl RouteAnimationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a landmark selection at `now`
    pub fn mark(&self, now: u64) {
        let mut last = self.last_select.lock();
        *last = Some(last.map_or(now, |prev| prev.max(now)));
    }

    pub fn last_select(&self) -> Option<u64> {
        *self.last_select.lock()
    }

    /// Whether `now` falls inside the block window
    pub fn is_blocking(&self, now: u64, window_ms: u64) -> bool {
        self.last_select()
            .is_some_and(|at| now.saturating_sub(at) < window_ms)
    }
}

/// One session's guard state
#[derive(Clone, Debug)]
pub struct TemporalGuards {
    timings: SyncTimings,
    mount_time: u64,
    last_remote_update: Option<u64>,
    gate: RouteAnimationGate,
}

impl TemporalGuards {
    pub fn new(timings: SyncTimings, mount_time: u64, gate: RouteAnimationGate) -> Self {
        Self {
            timings,
            mount_time,
            last_remote_update: None,
            gate,
        }
    }

    pub fn timings(&self) -> &SyncTimings {
        &self.timings
    }

    pub fn gate(&self) -> &RouteAnimationGate {
        &self.gate
    }

    pub fn mount_time(&self) -> u64 {
        self.mount_time
    }

    pub fn last_remote_update(&self) -> Option<u64> {
        self.last_remote_update
    }

    pub fn in_initial_block(&self, now: u64) -> bool {
        now.saturating_sub(self.mount_time) < self.timings.initial_block_ms
    }

    pub fn in_cooldown(&self, now: u64) -> bool {
        self.last_remote_update
            .is_some_and(|at| now.saturating_sub(at) < self.timings.receive_cooldown_ms)
    }

    pub fn route_blocked(&self, now: u64) -> bool {
        self.gate
            .is_blocking(now, self.timings.route_animation_block_ms)
    }

    pub fn center_valid(&self, center: LngLat) -> bool {
        center.is_finite() && (-90.0..=90.0).contains(&center.lat)
    }

    pub fn zoom_valid(&self, zoom: f64) -> bool {
        zoom.is_finite() && (self.timings.min_valid_zoom..=self.timings.max_valid_zoom).contains(&zoom)
    }

    /// Note an accepted inbound message
    pub fn record_remote(&mut self, now: u64) {
        self.last_remote_update = Some(now);
    }

    /// Whether an outgoing camera update may go out at `now`
    pub fn check_camera_send(&self, now: u64) -> Result<(), DropReason> {
        if self.in_initial_block(now) {
            Err(DropReason::InitialBlock)
        } else if self.route_blocked(now) {
            Err(DropReason::RouteAnimation)
        } else if self.in_cooldown(now) {
            Err(DropReason::Cooldown)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guards(mount: u64) -> TemporalGuards {
        TemporalGuards::new(SyncTimings::default(), mount, RouteAnimationGate::new())
    }

    #[test]
    fn test_initial_block_window() {
        let g = guards(1000);
        assert!(g.in_initial_block(1000));
        assert!(g.in_initial_block(8999));
        assert!(!g.in_initial_block(9000));
    }

    #[test]
    fn test_cooldown_follows_remote_update() {
        let mut g = guards(0);
        assert!(!g.in_cooldown(20_000));
        g.record_remote(20_000);
        assert!(g.in_cooldown(20_999));
        assert!(!g.in_cooldown(21_000));
    }

    #[test]
    fn test_gate_is_shared_between_clones() {
        let gate = RouteAnimationGate::new();
        let a = TemporalGuards::new(SyncTimings::default(), 0, gate.clone());
        let b = TemporalGuards::new(SyncTimings::default(), 0, gate.clone());

        a.gate().mark(10_000);
        assert!(b.route_blocked(15_999));
        assert!(!b.route_blocked(16_000));
    }

    #[test]
    fn test_separate_gates_do_not_interfere() {
        let a = guards(0);
        let b = guards(0);
        a.gate().mark(10_000);
        assert!(a.route_blocked(10_001));
        assert!(!b.route_blocked(10_001));
    }

    #[test]
    fn test_zoom_validity() {
        let g = guards(0);
        assert!(!g.zoom_valid(0.5));
        assert!(!g.zoom_valid(25.0));
        assert!(!g.zoom_valid(f64::NAN));
        assert!(g.zoom_valid(1.0));
        assert!(g.zoom_valid(14.0));
    }

    #[test]
    fn test_center_validity() {
        let g = guards(0);
        assert!(g.center_valid(LngLat::new(126.97, 37.56)));
        assert!(!g.center_valid(LngLat::new(0.0, 120.0)));
        assert!(!g.center_valid(LngLat::new(f64::NAN, 0.0)));
    }

    #[test]
    fn test_camera_send_reasons_in_order() {
        let mut g = guards(0);
        assert_eq!(g.check_camera_send(100), Err(DropReason::InitialBlock));
        assert_eq!(g.check_camera_send(9000), Ok(()));

        g.record_remote(9000);
        assert_eq!(g.check_camera_send(9500), Err(DropReason::Cooldown));

        g.gate().mark(9600);
        assert_eq!(g.check_camera_send(9700), Err(DropReason::RouteAnimation));
    }
}
