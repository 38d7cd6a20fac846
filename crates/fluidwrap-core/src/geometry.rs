#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Two coordinate spaces meet here: host pixels ([`Point`], [`Size`]) and
//! integer grid cells ([`CellRect`], [`CellSize`]).

use serde::{Deserialize, Serialize};

/// A position in host pixels, relative to the panel origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale both coordinates by `factor`.
    #[inline]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Component-wise difference `self - other`.
    #[inline]
    pub fn offset_by(self, other: Point) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// A size in host pixels.
///
/// Dimensions may be infinite when the host measures without a bound.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check if either dimension is zero or negative.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if `point` lies inside `[0, width) × [0, height)`.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x < self.width && point.y < self.height
    }

    /// Swap width and height.
    #[inline]
    pub const fn transpose(self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// A size measured in whole grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellSize {
    /// Width in cells (columns).
    pub width: usize,
    /// Height in cells (rows).
    pub height: usize,
}

impl CellSize {
    /// Create a new cell size.
    #[inline]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// `true` for a 1×1 footprint.
    #[inline]
    pub const fn is_unit(&self) -> bool {
        self.width == 1 && self.height == 1
    }

    /// Number of cells covered.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }

    /// Swap width and height.
    #[inline]
    pub const fn transpose(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// Convert to pixels given the size of one cell.
    #[inline]
    pub fn to_pixels(self, cell: Size) -> Size {
        Size::new(self.width as f64 * cell.width, self.height as f64 * cell.height)
    }
}

/// A rectangle of grid cells.
///
/// Uses grid coordinates (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellRect {
    /// Top row (inclusive).
    pub row: usize,
    /// Left column (inclusive).
    pub col: usize,
    /// Width in cells.
    pub width: usize,
    /// Height in cells.
    pub height: usize,
}

impl CellRect {
    /// Create a new cell rectangle.
    #[inline]
    pub const fn new(row: usize, col: usize, width: usize, height: usize) -> Self {
        Self {
            row,
            col,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> usize {
        self.col.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> usize {
        self.row.saturating_add(self.height)
    }

    /// Footprint of the rectangle.
    #[inline]
    pub const fn size(&self) -> CellSize {
        CellSize::new(self.width, self.height)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a cell is inside the rectangle.
    #[inline]
    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.row && row < self.bottom() && col >= self.col && col < self.right()
    }

    /// Check if the two rectangles share at least one cell.
    #[inline]
    pub fn intersects(&self, other: &CellRect) -> bool {
        self.intersection_opt(other).is_some()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &CellRect) -> Option<CellRect> {
        let row = self.row.max(other.row);
        let col = self.col.max(other.col);
        let bottom = self.bottom().min(other.bottom());
        let right = self.right().min(other.right());

        if row < bottom && col < right {
            Some(CellRect::new(row, col, right - col, bottom - row))
        } else {
            None
        }
    }

    /// Swap the row/column axes.
    #[inline]
    pub const fn transpose(self) -> Self {
        Self::new(self.col, self.row, self.height, self.width)
    }

    /// Iterate over every `(row, col)` covered by the rectangle, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row..self.bottom()).flat_map(move |r| (self.col..self.right()).map(move |c| (r, c)))
    }
}
