use cinemap_core::LngLat;

use crate::guards::DropReason;
use crate::protocol::{Empty, RouteCreated, SyncEvent, SyncMessage};
use crate::session::{payload, SendStatus, SyncSession};
use crate::transport::Transport;

impl<T: Transport> SyncSession<T> {
    pub fn sync_route_create(
        &mut self,
        coordinates: &[LngLat],
        landmark_id: Option<&str>,
    ) -> SendStatus {
        let route = RouteCreated {
            coordinates: coordinates.to_vec(),
            landmark_id: landmark_id.map(str::to_string),
        };
        self.send_event(SyncEvent::RouteCreate, &route)
    }

    pub fn sync_route_clear(&mut self) -> SendStatus {
        self.send_event(SyncEvent::RouteClear, &Empty {})
    }

    pub fn on_route_create(&mut self, callback: impl FnMut(RouteCreated) + 'static) {
        self.hooks.route_create = Some(Box::new(callback));
    }

    pub fn on_route_clear(&mut self, callback: impl FnMut() + 'static) {
        self.hooks.route_clear = Some(Box::new(callback));
    }

    pub(crate) fn receive_route_create(&mut self, message: &SyncMessage) -> Result<(), DropReason> {
        let route: RouteCreated = payload(message)?;
        if let Some(callback) = self.hooks.route_create.as_mut() {
            callback(route);
        }
        Ok(())
    }

    pub(crate) fn receive_route_clear(&mut self) {
        if let Some(callback) = self.hooks.route_clear.as_mut() {
            callback();
        }
    }
}
