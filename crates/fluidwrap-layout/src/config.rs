//! Panel configuration consumed from the host.
//!
//! [`PanelConfig`] is a plain value: the host owns observing its own
//! property changes and re-running the layout with a new config.
//!
//! # Loading
//!
//! With the `panel-config` feature the config can be read from TOML or JSON:
//!
//! ```toml
//! cell_width = 120.0
//! cell_height = 80.0
//! orientation = "vertical"
//! optimize_child_placement = false
//! drag_scale = 1.2
//! ```
//!
//! ```rust,ignore
//! let config = PanelConfig::from_toml_file("panel.toml")?;
//! ```

#[cfg(feature = "panel-config")]
use std::path::Path;

use fluidwrap_core::geometry::Size;
use serde::{Deserialize, Serialize};

#[cfg(feature = "panel-config")]
use crate::error::PanelConfigError;
use crate::{LayoutError, Orientation};

/// Layout and drag parameters of a fluid wrap panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Width of one grid cell in pixels.
    pub cell_width: f64,
    /// Height of one grid cell in pixels.
    pub cell_height: f64,
    /// Flow direction.
    pub orientation: Orientation,
    /// When `false`, each item is searched for starting at the previous
    /// item's line, so placement never moves backwards along the flow.
    pub optimize_child_placement: bool,
    /// Scale applied to the dragged item; pointer offsets inside it are
    /// multiplied by this factor.
    pub drag_scale: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            cell_width: 10.0,
            cell_height: 10.0,
            orientation: Orientation::Horizontal,
            optimize_child_placement: true,
            drag_scale: 1.0,
        }
    }
}

impl PanelConfig {
    /// Config with the given cell size and defaults for everything else.
    #[must_use]
    pub fn new(cell_width: f64, cell_height: f64) -> Self {
        Self {
            cell_width,
            cell_height,
            ..Default::default()
        }
    }

    /// Set the flow direction.
    #[must_use]
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Enable or disable back-filling earlier lines.
    #[must_use]
    pub fn optimize_child_placement(mut self, optimize: bool) -> Self {
        self.optimize_child_placement = optimize;
        self
    }

    /// Set the drag scale factor.
    #[must_use]
    pub fn drag_scale(mut self, scale: f64) -> Self {
        self.drag_scale = scale;
        self
    }

    /// Cell size in pixels.
    #[inline]
    pub const fn cell_size(&self) -> Size {
        Size::new(self.cell_width, self.cell_height)
    }

    /// Fail on the first contract violation.
    pub fn check(&self) -> Result<(), LayoutError> {
        if !is_positive(self.cell_width) {
            return Err(LayoutError::InvalidCellSize {
                axis: "width",
                value: self.cell_width,
            });
        }
        if !is_positive(self.cell_height) {
            return Err(LayoutError::InvalidCellSize {
                axis: "height",
                value: self.cell_height,
            });
        }
        if !is_positive(self.drag_scale) {
            return Err(LayoutError::InvalidDragScale {
                value: self.drag_scale,
            });
        }
        Ok(())
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !is_positive(self.cell_width) {
            errors.push(format!(
                "cell_width must be positive and finite, got {}",
                self.cell_width
            ));
        }
        if !is_positive(self.cell_height) {
            errors.push(format!(
                "cell_height must be positive and finite, got {}",
                self.cell_height
            ));
        }
        if !is_positive(self.drag_scale) {
            errors.push(format!(
                "drag_scale must be positive and finite, got {}",
                self.drag_scale
            ));
        }
        errors
    }

    /// Load from a TOML string.
    #[cfg(feature = "panel-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, PanelConfigError> {
        let config: Self = toml::from_str(s).map_err(PanelConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "panel-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PanelConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PanelConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "panel-config")]
    pub fn from_json_str(s: &str) -> Result<Self, PanelConfigError> {
        let config: Self = serde_json::from_str(s).map_err(PanelConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "panel-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PanelConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PanelConfigError::Io)?;
        Self::from_json_str(&content)
    }

    #[cfg(feature = "panel-config")]
    fn validated(self) -> Result<Self, PanelConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(PanelConfigError::Validation(errors))
        }
    }
}

#[inline]
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
