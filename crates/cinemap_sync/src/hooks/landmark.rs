use cinemap_core::Landmark;

use crate::guards::DropReason;
use crate::protocol::{Empty, LandmarkSelection, SyncEvent, SyncMessage};
use crate::session::{payload, SendStatus, SyncSession};
use crate::transport::Transport;

impl<T: Transport> SyncSession<T> {
    /// Share a landmark selection.
    ///
    /// Marks the route-animation gate first, so camera sync stays quiet while
    /// the local engine flies to the landmark even if the send is suppressed.
    pub fn sync_landmark_select(&mut self, landmark: &Landmark) -> SendStatus {
        let now = self.now();
        self.guards.gate().mark(now);
        let selection = LandmarkSelection {
            landmark_id: landmark.id.clone(),
            coordinates: landmark.coordinates,
        };
        self.send_event(SyncEvent::LandmarkSelect, &selection)
    }

    pub fn sync_landmark_deselect(&mut self) -> SendStatus {
        self.send_event(SyncEvent::LandmarkDeselect, &Empty {})
    }

    pub fn on_landmark_select(&mut self, callback: impl FnMut(LandmarkSelection) + 'static) {
        self.hooks.landmark_select = Some(Box::new(callback));
    }

    pub fn on_landmark_deselect(&mut self, callback: impl FnMut() + 'static) {
        self.hooks.landmark_deselect = Some(Box::new(callback));
    }

    pub(crate) fn receive_landmark_select(
        &mut self,
        message: &SyncMessage,
        now: u64,
    ) -> Result<(), DropReason> {
        let selection: LandmarkSelection = payload(message)?;
        self.guards.gate().mark(now);
        if let Some(callback) = self.hooks.landmark_select.as_mut() {
            callback(selection);
        }
        Ok(())
    }

    pub(crate) fn receive_landmark_deselect(&mut self) {
        if let Some(callback) = self.hooks.landmark_deselect.as_mut() {
            callback();
        }
    }
}
