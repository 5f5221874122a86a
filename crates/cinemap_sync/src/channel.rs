//! Typed publish/subscribe over a [`Transport`]

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::protocol::{SyncEvent, SyncMessage};
use crate::transport::{ConnectionState, Transport};

/// Raw subscriber invoked with every accepted message of its event
pub type Subscriber = Box<dyn FnMut(&SyncMessage)>;

/// Encodes outgoing events, decodes incoming frames and fans accepted
/// messages out to subscribers.
pub struct SyncChannel<T> {
    transport: T,
    session_id: String,
    subscribers: FxHashMap<SyncEvent, Vec<Subscriber>>,
}

impl<T: Transport> SyncChannel<T> {
    pub fn new(transport: T, session_id: impl Into<String>) -> Self {
        Self {
            transport,
            session_id: session_id.into(),
            subscribers: FxHashMap::default(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.connection_state()
    }

    /// Wrap `payload` in an envelope stamped with this session and send it
    pub fn publish<P: Serialize>(&self, event: SyncEvent, payload: &P, timestamp: u64) -> Result<()> {
        if self.transport.connection_state() != ConnectionState::Connected {
            return Err(SyncError::Disconnected);
        }
        let message = SyncMessage::new(event, payload, self.session_id.as_str(), timestamp)?;
        self.transport.send(message.encode()?)
    }

    /// Next waiting frame, decoded
    pub fn recv(&self) -> Option<Result<SyncMessage>> {
        self.transport
            .try_recv()
            .map(|frame| SyncMessage::decode(&frame))
    }

    /// Register a handler for `event`
    pub fn subscribe<F>(&mut self, event: SyncEvent, handler: F)
    where
        F: FnMut(&SyncMessage) + 'static,
    {
        self.subscribers
            .entry(event)
            .or_default()
            .push(Box::new(handler));
    }

    /// Hand `message` to every subscriber of its event. Returns how many ran.
    pub fn dispatch(&mut self, message: &SyncMessage) -> usize {
        let Some(event) = message.kind() else {
            return 0;
        };
        match self.subscribers.get_mut(&event) {
            Some(handlers) => {
                for handler in handlers.iter_mut() {
                    handler(message);
                }
                handlers.len()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalBus;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_publish_and_dispatch() {
        let bus = LocalBus::new();
        let sender = SyncChannel::new(bus.connect(), "a");
        let mut receiver = SyncChannel::new(bus.connect(), "b");

        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        receiver.subscribe(SyncEvent::ViewMode, move |msg| {
            assert_eq!(msg.session_id, "a");
            counter.set(counter.get() + 1);
        });

        sender
            .publish(SyncEvent::ViewMode, &serde_json::json!({"mode": "3d"}), 10)
            .unwrap();
        let message = receiver.recv().unwrap().unwrap();
        assert_eq!(receiver.dispatch(&message), 1);
        assert_eq!(hits.get(), 1);
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn test_publish_while_disconnected() {
        let bus = LocalBus::new();
        let channel = SyncChannel::new(bus.connect(), "a");
        channel.transport().disconnect();
        assert!(matches!(
            channel.publish(SyncEvent::RouteClear, &serde_json::json!({}), 0),
            Err(SyncError::Disconnected)
        ));
    }
}
