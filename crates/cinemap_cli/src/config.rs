//! Cinemap project file handling

use anyhow::{Context, Result};
use cinemap_camera::{CinematicConfig, ShotConfigs};
use cinemap_core::{CameraState, Landmark, LngLat};
use cinemap_sync::SyncTimings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "cinemap.toml";

/// Top-level project configuration (cinemap.toml)
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CinemapConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub cinematic: CinematicConfig,
    #[serde(default)]
    pub shots: ShotConfigs,
    #[serde(default)]
    pub sync: SyncTimings,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

/// Project metadata
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Initial map view and viewport
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MapConfig {
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    /// Viewport size in pixels
    pub width: u32,
    pub height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: LngLat::new(126.978, 37.5665),
            zoom: 11.0,
            pitch: 0.0,
            bearing: 0.0,
            width: 1920,
            height: 1080,
        }
    }
}

impl MapConfig {
    /// The camera the map opens with
    pub fn camera(&self) -> CameraState {
        CameraState::new(self.center, self.zoom, self.pitch, self.bearing)
    }

    pub fn viewport(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }
}

impl CinemapConfig {
    /// Load configuration from a directory (looks for cinemap.toml)
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = if path.is_file() {
            path.to_path_buf()
        } else {
            path.join(CONFIG_FILE)
        };

        if !config_path.exists() {
            anyhow::bail!(
                "No {} found in {}. Run `cinemap init` to create one.",
                CONFIG_FILE,
                path.display()
            );
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Create a new configuration with the given project name and no landmarks
    pub fn new(name: &str) -> Self {
        Self {
            project: ProjectConfig {
                name: name.to_string(),
                version: default_version(),
                description: None,
            },
            map: MapConfig::default(),
            cinematic: CinematicConfig::default(),
            shots: ShotConfigs::default(),
            sync: SyncTimings::default(),
            landmarks: Vec::new(),
        }
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = CinemapConfig::from_toml(
            r#"
            [project]
            name = "harbour"

            [map]
            zoom = 9.5

            [shots.journey]
            ms_per_km = 900.0

            [sync]
            initial_block_ms = 2000

            [[landmarks]]
            id = "pier"
            title = "Old Pier"
            categoryName = "waterfront"
            coordinates = { lng = 129.04, lat = 35.10 }
            "#,
        )
        .unwrap();

        assert_eq!(config.project.version, "0.1.0");
        assert_eq!(config.map.zoom, 9.5);
        assert_eq!(config.map.width, 1920);
        assert_eq!(config.shots.journey.ms_per_km, 900.0);
        assert_eq!(config.shots.reveal, Default::default());
        assert_eq!(config.sync.initial_block_ms, 2000);
        assert_eq!(config.sync.receive_cooldown_ms, 1000);
        assert_eq!(config.landmarks.len(), 1);
        assert_eq!(config.landmarks[0].category_name.as_deref(), Some("waterfront"));
        assert_eq!(config.landmarks[0].coordinates, Some(LngLat::new(129.04, 35.10)));
    }

    #[test]
    fn test_missing_project_table_is_an_error() {
        assert!(CinemapConfig::from_toml("[map]\nzoom = 3.0\n").is_err());
    }

    #[test]
    fn test_missing_file_suggests_init() {
        let dir = std::env::temp_dir().join(format!("cinemap-missing-{}", std::process::id()));
        let err = CinemapConfig::load_from_dir(&dir).unwrap_err();
        assert!(err.to_string().contains("cinemap init"));
    }
}
