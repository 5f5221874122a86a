use cinemap_core::CameraState;

use crate::guards::DropReason;
use crate::protocol::{SyncEvent, SyncMessage};
use crate::session::{payload, SendStatus, SyncSession};
use crate::transport::Transport;

impl<T: Transport> SyncSession<T> {
    /// Share the local camera.
    ///
    /// Held back during the initial block, the route-animation block and the
    /// receive cooldown. Otherwise the first update in a quiet period goes out
    /// at once and later ones within the throttle interval are coalesced into
    /// a trailing update sent by [`SyncSession::tick`].
    pub fn sync_camera(&mut self, camera: CameraState) -> SendStatus {
        let now = self.now();
        self.local_camera = Some(camera);
        if let Err(reason) = self.guards.check_camera_send(now) {
            return self.suppress(SyncEvent::CameraUpdate, reason);
        }
        match self.camera_throttle.offer(camera, now) {
            Some(camera) => self.publish(SyncEvent::CameraUpdate, &camera, now),
            None => {
                self.stats.queued += 1;
                SendStatus::Queued
            }
        }
    }

    /// Called with every accepted remote camera
    pub fn on_camera_update(&mut self, callback: impl FnMut(CameraState) + 'static) {
        self.hooks.camera = Some(Box::new(callback));
    }

    /// Read the local camera from `source` instead of the last synced value
    pub fn set_camera_source(&mut self, source: impl Fn() -> CameraState + 'static) {
        self.camera_source = Some(Box::new(source));
    }

    /// The local camera as reported to peers
    pub fn local_camera(&self) -> Option<CameraState> {
        match self.camera_source.as_ref() {
            Some(source) => Some(source()),
            None => self.local_camera,
        }
    }

    /// Whether a trailing camera update is waiting for the throttle
    pub fn has_pending_camera(&self) -> bool {
        self.camera_throttle.has_pending()
    }

    pub(crate) fn flush_camera(&mut self, now: u64) {
        let Some(camera) = self.camera_throttle.poll(now) else {
            return;
        };
        match self.guards.check_camera_send(now) {
            Ok(()) => {
                self.publish(SyncEvent::CameraUpdate, &camera, now);
            }
            Err(reason) => {
                self.suppress(SyncEvent::CameraUpdate, reason);
            }
        }
    }

    pub(crate) fn receive_camera(
        &mut self,
        message: &SyncMessage,
        now: u64,
    ) -> Result<(), DropReason> {
        if self.guards.route_blocked(now) {
            return Err(DropReason::RouteAnimation);
        }
        let camera: CameraState = payload(message)?;
        if !self.guards.zoom_valid(camera.zoom) {
            return Err(DropReason::InvalidZoom);
        }
        if !self.guards.center_valid(camera.center)
            || !camera.pitch.is_finite()
            || !camera.bearing.is_finite()
        {
            return Err(DropReason::InvalidCamera);
        }
        if let Some(callback) = self.hooks.camera.as_mut() {
            callback(camera);
        }
        Ok(())
    }
}
