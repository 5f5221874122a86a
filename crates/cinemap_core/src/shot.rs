//! Shot identifiers and outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// The named camera motions the engine can run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    Establishing,
    Journey,
    Reveal,
    LandmarkHighlight,
    ContextualOrbit,
    Custom,
}

impl ShotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotType::Establishing => "establishing",
            ShotType::Journey => "journey",
            ShotType::Reveal => "reveal",
            ShotType::LandmarkHighlight => "landmark_highlight",
            ShotType::ContextualOrbit => "contextual_orbit",
            ShotType::Custom => "custom",
        }
    }
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a shot ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotOutcome {
    /// Ran to the end of its last segment
    Completed,
    /// Stopped, superseded, or rejected before it could run
    Cancelled,
}

impl ShotOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ShotOutcome::Cancelled)
    }
}
