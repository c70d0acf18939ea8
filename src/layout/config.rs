//! Configuration for the layout heuristics
//!
//! Thresholds and per-check toggles, persisted as TOML. Every field has
//! a serde default, so a config file written by an older build merges
//! cleanly with the built-in defaults when new fields appear.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or saving a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_edge_proximity_ratio() -> f64 {
    0.1
}
fn default_fill_ratio() -> f64 {
    0.9
}
fn default_full_bleed_ratio() -> f64 {
    0.95
}
fn default_center_tolerance_px() -> f64 {
    2.0
}
fn default_true() -> bool {
    true
}

/// Tunable options for the layout mismatch scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// A node counts as "near" an edge when its gap is below this
    /// fraction of the container's inner dimension on that axis.
    #[serde(default = "default_edge_proximity_ratio")]
    pub edge_proximity_ratio: f64,

    /// A node counts as filling an axis when it occupies at least this
    /// fraction of the container's inner dimension.
    #[serde(default = "default_fill_ratio")]
    pub fill_ratio: f64,

    /// A node counts as full-bleed when it occupies at least this
    /// fraction of the container on both axes at once.
    #[serde(default = "default_full_bleed_ratio")]
    pub full_bleed_ratio: f64,

    /// Maximum midpoint offset, in pixels, for a node to count as
    /// visually centered.
    #[serde(default = "default_center_tolerance_px")]
    pub center_tolerance_px: f64,

    /// Only report nodes whose resize behavior is untouched from the
    /// host defaults, skipping anything the designer configured
    /// deliberately.
    #[serde(default)]
    pub only_defaults: bool,

    #[serde(default = "default_true")]
    pub check_corner: bool,
    #[serde(default = "default_true")]
    pub check_edge: bool,
    #[serde(default = "default_true")]
    pub check_stretch: bool,
    #[serde(default = "default_true")]
    pub check_fill: bool,
    #[serde(default = "default_true")]
    pub check_full_bleed: bool,
    #[serde(default = "default_true")]
    pub check_center: bool,
    #[serde(default = "default_true")]
    pub check_sibling_fill: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            edge_proximity_ratio: default_edge_proximity_ratio(),
            fill_ratio: default_fill_ratio(),
            full_bleed_ratio: default_full_bleed_ratio(),
            center_tolerance_px: default_center_tolerance_px(),
            only_defaults: false,
            check_corner: true,
            check_edge: true,
            check_stretch: true,
            check_fill: true,
            check_full_bleed: true,
            check_center: true,
            check_sibling_fill: true,
        }
    }
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a persisted config, merging missing fields with defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config from TOML. Missing fields fall back to their
    /// defaults, so stale files from older builds keep working.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Persist the config as TOML.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Set the edge proximity ratio.
    pub fn with_edge_proximity_ratio(mut self, ratio: f64) -> Self {
        self.edge_proximity_ratio = ratio;
        self
    }

    /// Set the fill ratio.
    pub fn with_fill_ratio(mut self, ratio: f64) -> Self {
        self.fill_ratio = ratio;
        self
    }

    /// Set the center tolerance in pixels.
    pub fn with_center_tolerance(mut self, px: f64) -> Self {
        self.center_tolerance_px = px;
        self
    }

    /// Restrict reporting to nodes with untouched resize behavior.
    pub fn with_only_defaults(mut self, only: bool) -> Self {
        self.only_defaults = only;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayoutConfig::default();
        assert_eq!(config.edge_proximity_ratio, 0.1);
        assert_eq!(config.fill_ratio, 0.9);
        assert_eq!(config.full_bleed_ratio, 0.95);
        assert_eq!(config.center_tolerance_px, 2.0);
        assert!(!config.only_defaults);
        assert!(config.check_corner);
        assert!(config.check_sibling_fill);
    }

    #[test]
    fn test_builder_pattern() {
        let config = LayoutConfig::new()
            .with_fill_ratio(0.8)
            .with_only_defaults(true);
        assert_eq!(config.fill_ratio, 0.8);
        assert!(config.only_defaults);
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        // A file from an older build that predates most fields.
        let config = LayoutConfig::from_toml(
            r#"
            edge_proximity_ratio = 0.25
            check_center = false
            "#,
        )
        .unwrap();
        assert_eq!(config.edge_proximity_ratio, 0.25);
        assert!(!config.check_center);
        // Everything the file does not mention takes its default.
        assert_eq!(config.fill_ratio, 0.9);
        assert_eq!(config.center_tolerance_px, 2.0);
        assert!(config.check_corner);
    }

    #[test]
    fn test_round_trip() {
        let config = LayoutConfig::new().with_center_tolerance(5.0);
        let toml = toml::to_string_pretty(&config).unwrap();
        let back = LayoutConfig::from_toml(&toml).unwrap();
        assert_eq!(back, config);
    }
}
