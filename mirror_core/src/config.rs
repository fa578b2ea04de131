//! Federation settings.
//!
//! Everything has a sensible default; a config file only needs the keys it
//! wants to change.
//!
//! ```toml
//! window_sizing = "query_count"
//! id_lookup_shortcut = true
//! id_field = "id"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::document::ID_FIELD;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// WindowSizing
// ============================================================================

/// How the two-slot merge learns the total match count of slot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSizing {
    /// Fetch every match of slot 0 and count them.
    #[default]
    FullScan,
    /// Ask slot 0 for its query count. Only correct when the backend's
    /// count agrees exactly with what its `query` returns.
    QueryCount,
}

// ============================================================================
// MirrorConfig
// ============================================================================

/// Settings of a [`MirrorConnector`](crate::federated::MirrorConnector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Slot 0 sizing strategy for windows that spill into slot 1.
    #[serde(default)]
    pub window_sizing: WindowSizing,

    /// Answer `id:<key>` single-row queries through the id lookup path.
    #[serde(default = "default_true")]
    pub id_lookup_shortcut: bool,

    /// Field name recognized by the id lookup shortcut.
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

fn default_true() -> bool {
    true
}

fn default_id_field() -> String {
    ID_FIELD.to_string()
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            window_sizing: WindowSizing::default(),
            id_lookup_shortcut: true,
            id_field: default_id_field(),
        }
    }
}

impl MirrorConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MirrorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Builder method to set the sizing strategy.
    pub fn with_window_sizing(mut self, sizing: WindowSizing) -> Self {
        self.window_sizing = sizing;
        self
    }

    /// Builder method to toggle the id lookup shortcut.
    pub fn with_id_lookup_shortcut(mut self, enabled: bool) -> Self {
        self.id_lookup_shortcut = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_field.is_empty() || self.id_field.contains(':') {
            return Err(ConfigError::Invalid(format!(
                "id_field must be a plain field name, got '{}'",
                self.id_field
            )));
        }
        Ok(())
    }
}
