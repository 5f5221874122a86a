//! Landmark records consumed from the project store

use crate::camera::LngLat;
use serde::{Deserialize, Serialize};

/// A place the camera can travel to and highlight
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    pub id: String,
    pub title: String,
    /// Missing when the record was saved without a position
    #[serde(default)]
    pub coordinates: Option<LngLat>,
    #[serde(default)]
    pub category_name: Option<String>,
}

impl Landmark {
    pub fn new(id: impl Into<String>, title: impl Into<String>, coordinates: LngLat) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            coordinates: Some(coordinates),
            category_name: None,
        }
    }

    /// Builder: set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_name = Some(category.into());
        self
    }
}
