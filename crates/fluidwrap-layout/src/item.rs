//! Managed items and their grid placements.

use fluidwrap_core::geometry::{CellRect, CellSize, Point, Size};
use serde::{Deserialize, Serialize};

use crate::bit_matrix::MatrixCell;

/// Stable host-provided identity of a managed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Wrap a raw host identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// An item as supplied by the host: identity plus desired pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidItem {
    pub id: ItemId,
    pub desired: Size,
}

impl FluidItem {
    /// Build an item from its id and desired pixel size.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            desired: Size::new(width, height),
        }
    }
}

/// Where the packer put an item, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemPlacement {
    pub id: ItemId,
    pub rect: CellRect,
}

impl ItemPlacement {
    pub(crate) fn new(id: ItemId, cell: MatrixCell, size: CellSize) -> Self {
        Self {
            id,
            rect: CellRect::new(cell.row, cell.col, size.width, size.height),
        }
    }

    #[inline]
    pub const fn row(&self) -> usize {
        self.rect.row
    }

    #[inline]
    pub const fn col(&self) -> usize {
        self.rect.col
    }

    #[inline]
    pub const fn width(&self) -> usize {
        self.rect.width
    }

    #[inline]
    pub const fn height(&self) -> usize {
        self.rect.height
    }

    /// Top-left cell.
    #[inline]
    pub const fn cell(&self) -> MatrixCell {
        MatrixCell::new(self.rect.row, self.rect.col)
    }

    /// Footprint in cells.
    #[inline]
    pub const fn size(&self) -> CellSize {
        self.rect.size()
    }

    /// `true` when the item occupies exactly one cell.
    #[inline]
    pub const fn is_unit_size(&self) -> bool {
        self.rect.width == 1 && self.rect.height == 1
    }

    /// Pixel rectangle origin for the host's arrange step.
    #[must_use]
    pub fn pixel_origin(&self, cell: Size) -> Point {
        Point::new(
            self.rect.col as f64 * cell.width,
            self.rect.row as f64 * cell.height,
        )
    }
}
