use std::{borrow::Borrow, collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Free-form per-plugin settings, persisted as `(id, key) -> value` rows.
pub type Properties = HashMap<String, String>;

/// Globally unique identifier of a plugin kind. Widget instances share the id of their kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PluginId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginCategory {
    Widget,
    App,
}

/// Saved layout of one plugin instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub enabled: bool,
    pub position: Point,
    #[serde(default)]
    pub properties: Properties,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            enabled: true,
            position: Point::ZERO,
            properties: Properties::new(),
        }
    }
}
