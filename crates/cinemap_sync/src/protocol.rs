//! Event taxonomy, policy table and wire messages
//!
//! Every message on the wire is a JSON [`SyncMessage`] envelope:
//!
//! ```json
//! {"event":"camera:update","payload":{...},"sessionId":"a1b2","timestamp":1700000000000}
//! ```

use std::fmt;
use std::str::FromStr;

use cinemap_core::{CameraState, LngLat};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Every event the protocol knows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncEvent {
    CameraUpdate,
    LandmarkSelect,
    LandmarkDeselect,
    RouteCreate,
    RouteClear,
    FilterChange,
    ViewMode,
    AspectRatio,
    PeerJoin,
}

/// How urgently an event should reach peers
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    /// Session plumbing (aspect ratio, presence)
    Control,
}

/// Per-event handling rules
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventPolicy {
    pub priority: Priority,
    /// Coalesced by the trailing camera throttle
    pub throttled: bool,
    /// Subject to the initial block and receive cooldown
    pub guarded: bool,
    /// Marks the shared route-animation gate when sent or received
    pub starts_route_block: bool,
}

impl SyncEvent {
    pub const ALL: [SyncEvent; 9] = [
        SyncEvent::CameraUpdate,
        SyncEvent::LandmarkSelect,
        SyncEvent::LandmarkDeselect,
        SyncEvent::RouteCreate,
        SyncEvent::RouteClear,
        SyncEvent::FilterChange,
        SyncEvent::ViewMode,
        SyncEvent::AspectRatio,
        SyncEvent::PeerJoin,
    ];

    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::CameraUpdate => "camera:update",
            SyncEvent::LandmarkSelect => "landmark:select",
            SyncEvent::LandmarkDeselect => "landmark:deselect",
            SyncEvent::RouteCreate => "route:create",
            SyncEvent::RouteClear => "route:clear",
            SyncEvent::FilterChange => "filter:change",
            SyncEvent::ViewMode => "view:mode",
            SyncEvent::AspectRatio => "aspect:ratio",
            SyncEvent::PeerJoin => "peer:join",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.name() == name)
    }

    pub fn policy(&self) -> EventPolicy {
        let (priority, throttled, guarded, starts_route_block) = match self {
            SyncEvent::CameraUpdate => (Priority::Low, true, true, false),
            SyncEvent::LandmarkSelect => (Priority::High, false, true, true),
            SyncEvent::LandmarkDeselect => (Priority::High, false, true, false),
            SyncEvent::RouteCreate | SyncEvent::RouteClear => (Priority::High, false, true, false),
            SyncEvent::FilterChange | SyncEvent::ViewMode => (Priority::Medium, false, true, false),
            SyncEvent::AspectRatio | SyncEvent::PeerJoin => (Priority::Control, false, false, false),
        };
        EventPolicy {
            priority,
            throttled,
            guarded,
            starts_route_block,
        }
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SyncEvent {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| SyncError::UnknownEvent(s.to_string()))
    }
}

/// The envelope every peer sends and receives
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMessage {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub session_id: String,
    pub timestamp: u64,
}

impl SyncMessage {
    pub fn new<P: Serialize>(
        event: SyncEvent,
        payload: &P,
        session_id: impl Into<String>,
        timestamp: u64,
    ) -> Result<Self> {
        Ok(Self {
            event: event.name().to_string(),
            payload: serde_json::to_value(payload).map_err(SyncError::Encode)?,
            session_id: session_id.into(),
            timestamp,
        })
    }

    /// The event, if this peer knows it
    pub fn kind(&self) -> Option<SyncEvent> {
        SyncEvent::from_name(&self.event)
    }

    /// Deserialize the payload into the event's typed body
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.payload).map_err(SyncError::Decode)
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(SyncError::Encode)
    }

    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame).map_err(SyncError::Decode)
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// `landmark:select`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkSelection {
    pub landmark_id: String,
    #[serde(default)]
    pub coordinates: Option<LngLat>,
}

/// `route:create`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCreated {
    pub coordinates: Vec<LngLat>,
    #[serde(default)]
    pub landmark_id: Option<String>,
}

/// `filter:change`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub categories: Vec<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// `view:mode`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModeChange {
    pub mode: String,
}

/// `aspect:ratio`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: f64,
    pub height: f64,
    pub ratio: f64,
    pub camera: CameraState,
}

impl AspectRatio {
    pub fn new(width: f64, height: f64, camera: CameraState) -> Self {
        let ratio = if height > 0.0 { width / height } else { DEFAULT_ASPECT_RATIO };
        Self {
            width,
            height,
            ratio,
            camera,
        }
    }
}

/// Assumed by controllers that never hear from the receiver
pub const DEFAULT_ASPECT_RATIO: f64 = 16.0 / 9.0;

/// Which side of the sync topology a peer is on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRole {
    /// The authoritative shared display
    Receiver,
    Controller,
}

/// `peer:join`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerJoin {
    pub role: SyncRole,
}

/// `landmark:deselect` and `route:clear` carry no body
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_round_trip() {
        for event in SyncEvent::ALL {
            assert_eq!(event.name().parse::<SyncEvent>().unwrap(), event);
        }
        assert!(matches!(
            "camera:teleport".parse::<SyncEvent>(),
            Err(SyncError::UnknownEvent(_))
        ));
    }

    #[test]
    fn test_policy_table() {
        let camera = SyncEvent::CameraUpdate.policy();
        assert_eq!(camera.priority, Priority::Low);
        assert!(camera.throttled);

        assert!(SyncEvent::LandmarkSelect.policy().starts_route_block);
        assert!(!SyncEvent::LandmarkDeselect.policy().starts_route_block);
        assert_eq!(SyncEvent::RouteCreate.policy().priority, Priority::High);
        assert_eq!(SyncEvent::ViewMode.policy().priority, Priority::Medium);
        assert!(!SyncEvent::AspectRatio.policy().guarded);
        assert!(!SyncEvent::PeerJoin.policy().guarded);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let camera = CameraState::new(LngLat::new(1.0, 2.0), 12.0, 30.0, 90.0);
        let msg = SyncMessage::new(SyncEvent::CameraUpdate, &camera, "peer-a", 42).unwrap();
        let json: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(json["event"], "camera:update");
        assert_eq!(json["sessionId"], "peer-a");
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["payload"]["zoom"], 12.0);
    }

    #[test]
    fn test_missing_payload_fields_are_rejected() {
        let frame = r#"{"event":"camera:update","payload":{"zoom":12},"sessionId":"x","timestamp":1}"#;
        let msg = SyncMessage::decode(frame).unwrap();
        assert!(msg.parse_payload::<CameraState>().is_err());
    }

    #[test]
    fn test_truncated_frame_is_decode_error() {
        assert!(matches!(
            SyncMessage::decode(r#"{"event":"camera:update""#),
            Err(SyncError::Decode(_))
        ));
    }

    #[test]
    fn test_aspect_ratio_computes_ratio() {
        let aspect = AspectRatio::new(1920.0, 1080.0, CameraState::default());
        assert!((aspect.ratio - DEFAULT_ASPECT_RATIO).abs() < 1e-12);
        assert_eq!(AspectRatio::new(100.0, 0.0, CameraState::default()).ratio, DEFAULT_ASPECT_RATIO);
    }
}
