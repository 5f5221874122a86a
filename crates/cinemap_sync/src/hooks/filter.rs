use crate::guards::DropReason;
use crate::protocol::{FilterState, SyncEvent, SyncMessage, ViewModeChange};
use crate::session::{payload, SendStatus, SyncSession};
use crate::transport::Transport;

impl<T: Transport> SyncSession<T> {
    pub fn sync_filters(&mut self, filters: &FilterState) -> SendStatus {
        self.send_event(SyncEvent::FilterChange, filters)
    }

    pub fn sync_view_mode(&mut self, mode: impl Into<String>) -> SendStatus {
        let change = ViewModeChange { mode: mode.into() };
        self.send_event(SyncEvent::ViewMode, &change)
    }

    pub fn on_filter_change(&mut self, callback: impl FnMut(FilterState) + 'static) {
        self.hooks.filter = Some(Box::new(callback));
    }

    pub fn on_view_mode(&mut self, callback: impl FnMut(String) + 'static) {
        self.hooks.view_mode = Some(Box::new(callback));
    }

    pub(crate) fn receive_filter(&mut self, message: &SyncMessage) -> Result<(), DropReason> {
        let filters: FilterState = payload(message)?;
        if let Some(callback) = self.hooks.filter.as_mut() {
            callback(filters);
        }
        Ok(())
    }

    pub(crate) fn receive_view_mode(&mut self, message: &SyncMessage) -> Result<(), DropReason> {
        let change: ViewModeChange = payload(message)?;
        if let Some(callback) = self.hooks.view_mode.as_mut() {
            callback(change.mode);
        }
        Ok(())
    }
}
