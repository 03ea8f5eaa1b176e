// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas settings.
//!
//! Every tunable constant of the flow canvas lives here: zoom behaviour,
//! grid snapping, seed layout spacing, edge lofting and the export frame.
//! Settings are stored as RON on disk.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "flow.ron";

/// Zoom behaviour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    /// Scale change per unit of wheel delta
    pub sensitivity: f32,
    /// Smallest allowed scale
    pub min_scale: f32,
    /// Largest allowed scale
    pub max_scale: f32,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            sensitivity: 0.001,
            min_scale: 0.1,
            max_scale: 3.0,
        }
    }
}

/// Seed layout and node geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Inset from the view border for randomly placed nodes
    pub padding: f32,
    /// Horizontal advance applied after each placed node
    pub advance: f32,
    /// Grid step used when dragging nodes
    pub snap: f32,
    /// Size assumed for nodes that have not been measured yet
    pub fallback_node_size: [f32; 2],
    /// Background grid spacing in world units
    pub grid_spacing: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            padding: 80.0,
            advance: 200.0,
            snap: 10.0,
            fallback_node_size: [220.0, 50.0],
            grid_spacing: 20.0,
        }
    }
}

/// Edge curve geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSettings {
    /// Lower bound for the control point distance
    pub min_loft: f32,
    /// Extra vertical slack before a node counts as above/below another
    pub level_threshold: f32,
    /// Distance of an edge label above the straight midpoint
    pub label_offset: f32,
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self {
            min_loft: 50.0,
            level_threshold: 10.0,
            label_offset: 5.0,
        }
    }
}

/// Fixed-resolution image export
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Margin kept free on every side
    pub padding: f32,
    /// Upper bound for the fit scale
    pub max_scale: f32,
    /// Size assumed for unmeasured nodes when computing bounds
    pub fallback_node_size: [f32; 2],
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 3840,
            height: 2160,
            padding: 100.0,
            max_scale: 4.0,
            fallback_node_size: [220.0, 100.0],
        }
    }
}

/// All flow canvas settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Zoom behaviour
    pub zoom: ZoomSettings,
    /// Layout and node geometry
    pub layout: LayoutSettings,
    /// Edge geometry
    pub edges: EdgeSettings,
    /// Image export
    pub export: ExportSettings,
}

impl FlowSettings {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Parse settings from RON text
    pub fn from_ron(contents: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load from `dir/flow.ron`, falling back to defaults when absent
    pub fn load_or_default(dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(SETTINGS_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if !(self.zoom.min_scale > 0.0 && self.zoom.min_scale <= self.zoom.max_scale) {
            return Err(SettingsError::Invalid(format!(
                "zoom range {}..{} is empty or non-positive",
                self.zoom.min_scale, self.zoom.max_scale
            )));
        }
        if self.layout.snap <= 0.0 {
            return Err(SettingsError::Invalid("grid snap must be positive".into()));
        }
        if self.export.width == 0 || self.export.height == 0 {
            return Err(SettingsError::Invalid("export frame must not be empty".into()));
        }
        Ok(())
    }
}

/// Errors reading or writing settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Values out of range
    #[error("Invalid settings: {0}")]
    Invalid(String),
}
