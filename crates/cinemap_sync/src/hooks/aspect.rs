//! Aspect-ratio sync
//!
//! The same camera shows different extents at different viewport shapes, so
//! the receiver periodically tells controllers its viewport and camera.
//! Controllers that hear nothing within the fallback timeout assume 16:9.

use crate::guards::DropReason;
use crate::protocol::{AspectRatio, PeerJoin, SyncEvent, SyncMessage, SyncRole, DEFAULT_ASPECT_RATIO};
use crate::session::{payload, SendStatus, SyncSession};
use crate::transport::Transport;

/// What a controller knows about the receiver's viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AspectStatus {
    /// Still waiting for the first broadcast
    Pending,
    Received(AspectRatio),
    /// Timed out; assuming 16:9
    Fallback,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct AspectTracker {
    status: AspectStatus,
    since: u64,
    last_broadcast: Option<u64>,
}

impl AspectTracker {
    pub(crate) fn new(now: u64) -> Self {
        Self {
            status: AspectStatus::Pending,
            since: now,
            last_broadcast: None,
        }
    }
}

impl<T: Transport> SyncSession<T> {
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }

    pub fn aspect_status(&self) -> AspectStatus {
        self.aspect.status
    }

    /// The receiver's aspect ratio, the 16:9 fallback, or `None` while pending
    pub fn effective_aspect_ratio(&self) -> Option<f64> {
        match self.aspect.status {
            AspectStatus::Pending => None,
            AspectStatus::Received(aspect) => Some(aspect.ratio),
            AspectStatus::Fallback => Some(DEFAULT_ASPECT_RATIO),
        }
    }

    pub fn on_aspect_ratio(&mut self, callback: impl FnMut(AspectRatio) + 'static) {
        self.hooks.aspect = Some(Box::new(callback));
    }

    /// Send the viewport and current camera to controllers (receiver only)
    pub fn broadcast_aspect_ratio(&mut self) -> SendStatus {
        if self.role != SyncRole::Receiver {
            return self.suppress(SyncEvent::AspectRatio, DropReason::WrongRole);
        }
        let now = self.now();
        let (width, height) = self.viewport;
        let aspect = AspectRatio::new(width, height, self.local_camera().unwrap_or_default());
        self.aspect.last_broadcast = Some(now);
        self.send_event(SyncEvent::AspectRatio, &aspect)
    }

    /// Announce this peer; a receiver answers with an immediate aspect broadcast
    pub fn announce(&mut self) -> SendStatus {
        let join = PeerJoin { role: self.role };
        self.send_event(SyncEvent::PeerJoin, &join)
    }

    pub(crate) fn tick_aspect(&mut self, now: u64) {
        let timings = self.guards.timings();
        match self.role {
            SyncRole::Receiver => {
                let interval = timings.aspect_broadcast_interval_ms;
                let due = self
                    .aspect
                    .last_broadcast
                    .map_or(true, |at| now.saturating_sub(at) >= interval);
                if due {
                    self.broadcast_aspect_ratio();
                }
            }
            SyncRole::Controller => {
                let timeout = timings.aspect_fallback_timeout_ms;
                if self.aspect.status == AspectStatus::Pending
                    && now.saturating_sub(self.aspect.since) >= timeout
                {
                    self.aspect.status = AspectStatus::Fallback;
                    tracing::debug!("no aspect ratio from receiver, assuming 16:9");
                }
            }
        }
    }

    pub(crate) fn receive_aspect(&mut self, message: &SyncMessage) -> Result<(), DropReason> {
        if self.role != SyncRole::Controller {
            return Err(DropReason::WrongRole);
        }
        let aspect: AspectRatio = payload(message)?;
        if !(aspect.ratio.is_finite() && aspect.ratio > 0.0) {
            return Err(DropReason::Malformed);
        }
        self.aspect.status = AspectStatus::Received(aspect);
        if let Some(callback) = self.hooks.aspect.as_mut() {
            callback(aspect);
        }
        Ok(())
    }

    pub(crate) fn receive_peer_join(&mut self, message: &SyncMessage) -> Result<(), DropReason> {
        let join: PeerJoin = payload(message)?;
        if self.role != SyncRole::Receiver {
            return Err(DropReason::WrongRole);
        }
        tracing::debug!(from = %message.session_id, role = ?join.role, "peer joined");
        self.broadcast_aspect_ratio();
        Ok(())
    }
}
