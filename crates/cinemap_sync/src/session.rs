//! One peer's view of the sync protocol
//!
//! [`SyncSession`] sits between UI code and a [`Transport`]. Outgoing calls go
//! through the hook methods (`sync_camera`, `sync_landmark_select`, ...);
//! inbound messages are pulled with [`SyncSession::pump`] and, once every
//! guard has passed, handed to the matching `on_*` callback. Time-driven work
//! (the trailing camera update, aspect broadcasts and the aspect fallback)
//! happens in [`SyncSession::tick`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cinemap_core::{CameraState, Clock};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::channel::SyncChannel;
use crate::error::SyncError;
use crate::guards::{DropReason, RouteAnimationGate, SyncTimings, TemporalGuards};
use crate::hooks::aspect::AspectTracker;
use crate::protocol::{
    AspectRatio, FilterState, LandmarkSelection, Priority, RouteCreated, SyncEvent, SyncMessage,
    SyncRole,
};
use crate::throttle::TrailingThrottle;
use crate::transport::{ConnectionState, Transport};

/// What happened to an outgoing event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendStatus {
    Sent,
    /// Held by the camera throttle; goes out from a later [`SyncSession::tick`]
    Queued,
    /// Held back by a guard
    Suppressed(DropReason),
    /// Transport not connected
    Skipped,
    /// Encoding or transport failure, already logged
    Failed,
}

impl SendStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendStatus::Sent)
    }
}

/// Counters for overlays and the demo report
#[derive(Clone, Debug, Default)]
pub struct SyncStats {
    pub sent: u64,
    pub queued: u64,
    pub skipped: u64,
    pub received: u64,
    pub applied: u64,
    dropped: FxHashMap<DropReason, u64>,
    suppressed: FxHashMap<DropReason, u64>,
}

impl SyncStats {
    /// Inbound messages dropped for `reason`
    pub fn dropped(&self, reason: DropReason) -> u64 {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped.values().sum()
    }

    /// Outgoing events held back for `reason`
    pub fn suppressed(&self, reason: DropReason) -> u64 {
        self.suppressed.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_suppressed(&self) -> u64 {
        self.suppressed.values().sum()
    }
}

/// Session construction options
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub role: SyncRole,
    /// Generated when unset
    pub session_id: Option<String>,
    pub timings: SyncTimings,
    /// Viewport size in pixels, reported in aspect broadcasts
    pub viewport: (f64, f64),
}

impl SessionOptions {
    pub fn new(role: SyncRole) -> Self {
        Self {
            role,
            session_id: None,
            timings: SyncTimings::default(),
            viewport: (1920.0, 1080.0),
        }
    }

    pub fn receiver() -> Self {
        Self::new(SyncRole::Receiver)
    }

    pub fn controller() -> Self {
        Self::new(SyncRole::Controller)
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_timings(mut self, timings: SyncTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self
    }
}

/// Inbound callbacks registered through the `on_*` methods
#[derive(Default)]
pub(crate) struct InboundHooks {
    pub(crate) camera: Option<Box<dyn FnMut(CameraState)>>,
    pub(crate) landmark_select: Option<Box<dyn FnMut(LandmarkSelection)>>,
    pub(crate) landmark_deselect: Option<Box<dyn FnMut()>>,
    pub(crate) route_create: Option<Box<dyn FnMut(RouteCreated)>>,
    pub(crate) route_clear: Option<Box<dyn FnMut()>>,
    pub(crate) filter: Option<Box<dyn FnMut(FilterState)>>,
    pub(crate) view_mode: Option<Box<dyn FnMut(String)>>,
    pub(crate) aspect: Option<Box<dyn FnMut(AspectRatio)>>,
}

fn generate_session_id(now: u64) -> String {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    format!(
        "{:x}-{:x}-{:x}",
        std::process::id(),
        now,
        NEXT.fetch_add(1, Ordering::Relaxed)
    )
}

/// A peer in the receiver/controller topology
pub struct SyncSession<T> {
    pub(crate) channel: SyncChannel<T>,
    pub(crate) role: SyncRole,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) guards: TemporalGuards,
    pub(crate) camera_throttle: TrailingThrottle<CameraState>,
    pub(crate) hooks: InboundHooks,
    pub(crate) aspect: AspectTracker,
    pub(crate) viewport: (f64, f64),
    pub(crate) local_camera: Option<CameraState>,
    pub(crate) camera_source: Option<Box<dyn Fn() -> CameraState>>,
    pub(crate) stats: SyncStats,
}

impl<T: Transport> SyncSession<T> {
    /// Mount a session. The initial block starts now.
    ///
    /// Sessions that share `gate` honour each other's landmark selections
    /// without a round trip through the transport.
    pub fn new(
        transport: T,
        options: SessionOptions,
        clock: Arc<dyn Clock>,
        gate: RouteAnimationGate,
    ) -> Self {
        let now = clock.now_ms();
        let session_id = options
            .session_id
            .unwrap_or_else(|| generate_session_id(now));
        tracing::debug!(session = %session_id, role = ?options.role, "sync session mounted");

        Self {
            channel: SyncChannel::new(transport, session_id),
            role: options.role,
            camera_throttle: TrailingThrottle::new(options.timings.camera_throttle_ms),
            guards: TemporalGuards::new(options.timings, now, gate),
            clock,
            hooks: InboundHooks::default(),
            aspect: AspectTracker::new(now),
            viewport: options.viewport,
            local_camera: None,
            camera_source: None,
            stats: SyncStats::default(),
        }
    }

    pub fn session_id(&self) -> &str {
        self.channel.session_id()
    }

    pub fn role(&self) -> SyncRole {
        self.role
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn guards(&self) -> &TemporalGuards {
        &self.guards
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.connection_state()
    }

    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    /// Raw subscription to accepted inbound messages of `event`
    pub fn subscribe<F>(&mut self, event: SyncEvent, handler: F)
    where
        F: FnMut(&SyncMessage) + 'static,
    {
        self.channel.subscribe(event, handler);
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Send a non-throttled event through the initial block and priority rules
    pub(crate) fn send_event<P: Serialize>(&mut self, event: SyncEvent, payload: &P) -> SendStatus {
        let now = self.now();
        let policy = event.policy();
        if policy.priority == Priority::High && self.camera_throttle.cancel().is_some() {
            tracing::trace!(%event, "discarded pending camera update");
        }
        if policy.guarded && self.guards.in_initial_block(now) {
            return self.suppress(event, DropReason::InitialBlock);
        }
        self.publish(event, payload, now)
    }

    pub(crate) fn publish<P: Serialize>(
        &mut self,
        event: SyncEvent,
        payload: &P,
        now: u64,
    ) -> SendStatus {
        match self.channel.publish(event, payload, now) {
            Ok(()) => {
                self.stats.sent += 1;
                tracing::trace!(%event, "sync message sent");
                SendStatus::Sent
            }
            Err(SyncError::Disconnected) => {
                self.stats.skipped += 1;
                tracing::debug!(%event, "transport not connected, send skipped");
                SendStatus::Skipped
            }
            Err(err) => {
                tracing::warn!(%event, %err, "sync send failed");
                SendStatus::Failed
            }
        }
    }

    pub(crate) fn suppress(&mut self, event: SyncEvent, reason: DropReason) -> SendStatus {
        *self.stats.suppressed.entry(reason).or_default() += 1;
        tracing::trace!(%event, ?reason, "outgoing sync suppressed");
        SendStatus::Suppressed(reason)
    }

    /// Drain the transport, applying every message the guards accept.
    ///
    /// Returns the number of frames read.
    pub fn pump(&mut self) -> usize {
        let mut frames = 0;
        while let Some(frame) = self.channel.recv() {
            frames += 1;
            self.stats.received += 1;
            match frame {
                Ok(message) => self.handle_message(&message),
                Err(err) => {
                    tracing::debug!(%err, "dropping undecodable frame");
                    self.record_drop(DropReason::Malformed);
                }
            }
        }
        frames
    }

    /// Run one inbound message through the guards and, if accepted, the hooks
    pub fn handle_message(&mut self, message: &SyncMessage) {
        let now = self.now();
        match self.accept(message, now) {
            Ok(()) => {
                self.stats.applied += 1;
                self.channel.dispatch(message);
            }
            Err(reason) => {
                if reason == DropReason::Echo {
                    tracing::trace!(event = %message.event, "ignoring own message");
                } else {
                    tracing::debug!(
                        event = %message.event,
                        from = %message.session_id,
                        ?reason,
                        "inbound sync message dropped"
                    );
                }
                self.record_drop(reason);
            }
        }
    }

    fn record_drop(&mut self, reason: DropReason) {
        *self.stats.dropped.entry(reason).or_default() += 1;
    }

    fn accept(&mut self, message: &SyncMessage, now: u64) -> Result<(), DropReason> {
        if message.session_id == self.channel.session_id() {
            return Err(DropReason::Echo);
        }
        let event = message.kind().ok_or(DropReason::UnknownEvent)?;
        let policy = event.policy();
        if policy.guarded && self.guards.in_initial_block(now) {
            return Err(DropReason::InitialBlock);
        }

        match event {
            SyncEvent::CameraUpdate => self.receive_camera(message, now)?,
            SyncEvent::LandmarkSelect => self.receive_landmark_select(message, now)?,
            SyncEvent::LandmarkDeselect => self.receive_landmark_deselect(),
            SyncEvent::RouteCreate => self.receive_route_create(message)?,
            SyncEvent::RouteClear => self.receive_route_clear(),
            SyncEvent::FilterChange => self.receive_filter(message)?,
            SyncEvent::ViewMode => self.receive_view_mode(message)?,
            SyncEvent::AspectRatio => self.receive_aspect(message)?,
            SyncEvent::PeerJoin => self.receive_peer_join(message)?,
        }

        if policy.guarded {
            self.guards.record_remote(now);
        }
        Ok(())
    }

    /// Time-driven work: flush the trailing camera update, broadcast the
    /// aspect ratio (receiver) or fall back to 16:9 (controller).
    pub fn tick(&mut self) {
        let now = self.now();
        self.flush_camera(now);
        self.tick_aspect(now);
    }
}

/// Parse a payload, mapping failure to [`DropReason::Malformed`]
pub(crate) fn payload<P: DeserializeOwned>(message: &SyncMessage) -> Result<P, DropReason> {
    message.parse_payload().map_err(|err| {
        tracing::debug!(event = %message.event, %err, "malformed sync payload");
        DropReason::Malformed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalBus;
    use cinemap_core::ManualClock;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_session_id(5);
        let b = generate_session_id(5);
        assert_ne!(a, b);
    }

    #[test]
    fn test_unknown_event_is_dropped() {
        let bus = LocalBus::new();
        let clock = ManualClock::new(100_000);
        let mut session = SyncSession::new(
            bus.connect(),
            SessionOptions::controller().with_session_id("c"),
            Arc::new(clock),
            RouteAnimationGate::new(),
        );
        let message = SyncMessage {
            event: "camera:teleport".into(),
            payload: serde_json::Value::Null,
            session_id: "other".into(),
            timestamp: 0,
        };
        session.handle_message(&message);
        assert_eq!(session.stats().dropped(DropReason::UnknownEvent), 1);
        assert_eq!(session.stats().applied, 0);
    }
}
