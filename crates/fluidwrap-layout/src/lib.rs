#![forbid(unsafe_code)]

//! Fluid wrap-panel placement engine.
//!
//! Items with arbitrary pixel sizes are snapped to a grid of fixed-size cells
//! and packed first-fit into a [`BitMatrix`]. A [`FluidWrapPanel`] keeps the
//! item order between passes and turns pointer drags into reorders: unit-size
//! grids shift items by list index, mixed grids exchange equal footprints or
//! trial re-pack the whole panel before committing a move.
//!
//! The engine never renders or animates. Hosts feed it sizes and pointer
//! positions, then apply the returned placements and item order to their own
//! visual tree.
//!
//! # Example
//!
//! ```
//! use fluidwrap_layout::{FluidItem, PanelConfig, pack};
//! use fluidwrap_core::geometry::Size;
//!
//! let config = PanelConfig::new(50.0, 50.0);
//! let items = [
//!     FluidItem::new(1, 100.0, 50.0),
//!     FluidItem::new(2, 50.0, 50.0),
//!     FluidItem::new(3, 50.0, 50.0),
//! ];
//! let result = pack(&items, &config, Size::new(100.0, 500.0)).unwrap();
//! assert_eq!(result.placements()[2].row(), 1);
//! assert_eq!(result.panel_size(), Size::new(100.0, 100.0));
//! ```

pub mod bit_matrix;
pub mod cache;
pub mod config;
pub mod debug;
pub mod error;
pub mod item;
pub mod packer;
pub mod panel;

pub use bit_matrix::{BitMatrix, MAX_MATRIX_WORDS, MAX_REGION_WIDTH, MatrixCell};
pub use cache::{PackCache, PackCacheKey, PackCacheStats};
pub use config::PanelConfig;
pub use error::{LayoutError, PanelConfigError};
pub use fluidwrap_core::geometry::{CellRect, CellSize, Point, Size};
pub use item::{FluidItem, ItemId, ItemPlacement};
pub use packer::{PackResult, cells_for, cells_per_line, pack};
pub use panel::{DragOutcome, FluidWrapPanel, ReorderKind};

use serde::{Deserialize, Serialize};

/// The axis along which items flow before wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Left to right, wrapping top to bottom.
    #[default]
    Horizontal,
    /// Top to bottom, wrapping left to right.
    Vertical,
}

impl Orientation {
    /// The other orientation.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}
