//! Transport seam and the in-process bus

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, SyncError};

/// Link state reported by a transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// A broadcast channel shared by every peer.
///
/// Frames are encoded [`crate::SyncMessage`]s. A frame sent by a peer is
/// delivered to every connected peer, the sender included; echo suppression
/// happens above this layer.
pub trait Transport {
    fn send(&self, frame: String) -> Result<()>;

    /// Next received frame, if one is waiting
    fn try_recv(&self) -> Option<String>;

    fn connection_state(&self) -> ConnectionState;
}

struct Peer {
    id: u64,
    tx: Sender<String>,
    connected: Arc<AtomicBool>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    peers: Vec<Peer>,
    /// Longest frame accepted, in bytes
    max_frame_len: Option<usize>,
}

/// In-memory broadcast bus for tests and the headless demo
#[derive(Clone, Default)]
pub struct LocalBus {
    inner: Arc<Mutex<BusInner>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus that refuses frames longer than `max_frame_len` bytes, like a
    /// relay with a message size limit
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        let bus = Self::default();
        bus.inner.lock().max_frame_len = Some(max_frame_len);
        bus
    }

    /// Join the bus as a new, connected peer
    pub fn connect(&self) -> LocalEndpoint {
        let (tx, rx) = mpsc::channel();
        let connected = Arc::new(AtomicBool::new(true));
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.peers.push(Peer {
            id,
            tx,
            connected: connected.clone(),
        });
        tracing::trace!(peer = id, "joined local bus");
        LocalEndpoint {
            id,
            bus: self.clone(),
            rx,
            connected,
        }
    }

    pub fn peer_count(&self) -> usize {
        self.inner.lock().peers.len()
    }

    fn broadcast(&self, frame: &str) -> Result<()> {
        let inner = self.inner.lock();
        if let Some(limit) = inner.max_frame_len.filter(|&limit| frame.len() > limit) {
            return Err(SyncError::Transport(format!(
                "frame of {} bytes exceeds the {limit} byte limit",
                frame.len()
            )));
        }
        for peer in inner.peers.iter().filter(|p| p.connected.load(Ordering::SeqCst)) {
            // A peer whose receiver is gone is about to be removed
            let _ = peer.tx.send(frame.to_string());
        }
        Ok(())
    }

    fn leave(&self, id: u64) {
        self.inner.lock().peers.retain(|peer| peer.id != id);
    }
}

/// One peer's connection to a [`LocalBus`]
pub struct LocalEndpoint {
    id: u64,
    bus: LocalBus,
    rx: Receiver<String>,
    connected: Arc<AtomicBool>,
}

impl LocalEndpoint {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop sending and receiving. Frames broadcast meanwhile are lost.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        while self.rx.try_recv().is_ok() {}
        tracing::debug!(peer = self.id, "disconnected from local bus");
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!(peer = self.id, "reconnected to local bus");
    }
}

impl Transport for LocalEndpoint {
    fn send(&self, frame: String) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SyncError::Disconnected);
        }
        self.bus.broadcast(&frame)
    }

    fn try_recv(&self) -> Option<String> {
        if !self.connected.load(Ordering::SeqCst) {
            return None;
        }
        self.rx.try_recv().ok()
    }

    fn connection_state(&self) -> ConnectionState {
        if self.connected.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

impl Drop for LocalEndpoint {
    fn drop(&mut self) {
        self.bus.leave(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_reaches_everyone_including_sender() {
        let bus = LocalBus::new();
        let a = bus.connect();
        let b = bus.connect();

        a.send("hello".into()).unwrap();
        assert_eq!(a.try_recv().as_deref(), Some("hello"));
        assert_eq!(b.try_recv().as_deref(), Some("hello"));
        assert_eq!(b.try_recv(), None);
    }

    #[test]
    fn test_oversized_frame_is_refused() {
        let bus = LocalBus::with_max_frame_len(8);
        let a = bus.connect();
        let b = bus.connect();

        assert!(matches!(
            a.send("much too long".into()),
            Err(SyncError::Transport(_))
        ));
        assert_eq!(b.try_recv(), None);

        a.send("short".into()).unwrap();
        assert_eq!(b.try_recv().as_deref(), Some("short"));
    }

    #[test]
    fn test_disconnected_peer_neither_sends_nor_receives() {
        let bus = LocalBus::new();
        let a = bus.connect();
        let b = bus.connect();

        b.disconnect();
        assert_eq!(b.connection_state(), ConnectionState::Disconnected);
        assert!(matches!(b.send("x".into()), Err(SyncError::Disconnected)));

        a.send("missed".into()).unwrap();
        b.reconnect();
        assert_eq!(b.try_recv(), None);

        a.send("seen".into()).unwrap();
        assert_eq!(b.try_recv().as_deref(), Some("seen"));
    }

    #[test]
    fn test_dropping_endpoint_leaves_bus() {
        let bus = LocalBus::new();
        let a = bus.connect();
        {
            let _b = bus.connect();
            assert_eq!(bus.peer_count(), 2);
        }
        assert_eq!(bus.peer_count(), 1);
        drop(a);
        assert_eq!(bus.peer_count(), 0);
    }
}
