//! Builder session configuration
//!
//! Settings are plain serde structs with defaults so a partial JSON file
//! only needs to name what it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AutomationError, Result};
use crate::types::Position;

/// Axis along which auto-layout stacks layers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
    /// Trigger at the top, layers flow downwards
    #[default]
    TopDown,
    /// Trigger on the left, layers flow to the right
    LeftRight,
}

/// Auto-layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub direction: LayoutDirection,
    /// Distance between consecutive layers
    pub layer_spacing: f64,
    /// Distance between nodes in the same layer
    pub node_spacing: f64,
    /// Position of the centre of layer 0
    pub origin: Position,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::TopDown,
            layer_spacing: 160.0,
            node_spacing: 260.0,
            origin: Position::new(0.0, 0.0),
        }
    }
}

/// Configuration for a builder session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Auto-layout settings
    pub layout: LayoutConfig,
    /// Offset applied to a duplicated node's position
    pub duplicate_offset: (f64, f64),
    /// Snapshots kept by an undo stack created for this session
    pub undo_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            duplicate_offset: (40.0, 40.0),
            undo_capacity: 100,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No session config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| AutomationError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        log::info!("Session config saved to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"layout": {"direction": "left_right", "layerSpacing": 300}, "undoCapacity": 5}"#,
        )
        .unwrap();

        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.layout.direction, LayoutDirection::LeftRight);
        assert_eq!(config.layout.layer_spacing, 300.0);
        assert_eq!(config.layout.node_spacing, 260.0);
        assert_eq!(config.undo_capacity, 5);
        assert_eq!(config.duplicate_offset, (40.0, 40.0));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let mut config = SessionConfig::default();
        config.duplicate_offset = (10.0, -10.0);
        config.save(&path).unwrap();

        assert_eq!(SessionConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SessionConfig::load(&path),
            Err(AutomationError::Config(_))
        ));
    }
}
