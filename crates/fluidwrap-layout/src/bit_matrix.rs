//! Packed occupancy grid with first-fit region search.
//!
//! [`BitMatrix`] stores one bit per grid cell, 64 cells to a `u64` word,
//! row-major. A matrix built for [`Orientation::Vertical`] is stored
//! transposed: every public call swaps row/column and width/height on the
//! way in and out, so the search below only ever walks rows.
//!
//! # Invariants
//!
//! 1. `words_per_row == ceil(columns / 64)` for the internal column count.
//! 2. Bits past the last internal column of a row are never set.
//! 3. A searchable region is at most [`MAX_REGION_WIDTH`] cells wide
//!    internally, so a region's span always fits one shifted word.

use std::fmt;
use std::ops::Range;

use fluidwrap_core::geometry::CellSize;
use serde::{Deserialize, Serialize};

use crate::Orientation;

/// Widest region (along the internal row) that [`BitMatrix::try_find_region`] accepts.
///
/// Four bits of headroom are left in the 64-bit word for the window shifts.
pub const MAX_REGION_WIDTH: usize = 60;

/// Largest backing store, in 64-bit words, that [`BitMatrix::try_new`] allocates (128 MiB).
pub const MAX_MATRIX_WORDS: usize = 1 << 24;

const WORD_BITS: usize = u64::BITS as usize;

/// A `(row, col)` grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct MatrixCell {
    pub row: usize,
    pub col: usize,
}

impl MatrixCell {
    /// Create a new cell coordinate.
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Swap row and column.
    #[inline]
    pub const fn transpose(self) -> Self {
        Self::new(self.col, self.row)
    }
}

/// Two-dimensional occupancy bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    orientation: Orientation,
    /// Internal (possibly transposed) row count.
    rows: usize,
    /// Internal (possibly transposed) column count.
    columns: usize,
    words_per_row: usize,
    data: Vec<u64>,
}

impl BitMatrix {
    /// Create an empty matrix of `rows × columns` logical cells.
    ///
    /// # Panics
    ///
    /// Panics if the backing store would overflow `usize`. Use
    /// [`BitMatrix::try_new`] for sizes derived from untrusted input.
    pub fn new(rows: usize, columns: usize, orientation: Orientation) -> Self {
        let (rows, columns) = match orientation {
            Orientation::Horizontal => (rows, columns),
            Orientation::Vertical => (columns, rows),
        };
        let words_per_row = columns.div_ceil(WORD_BITS);
        Self {
            orientation,
            rows,
            columns,
            words_per_row,
            data: vec![0; rows * words_per_row],
        }
    }

    /// Like [`BitMatrix::new`], but `None` when the matrix would need more
    /// than [`MAX_MATRIX_WORDS`] words.
    pub fn try_new(rows: usize, columns: usize, orientation: Orientation) -> Option<Self> {
        let words = columns.div_ceil(WORD_BITS).checked_mul(rows)?;
        (words <= MAX_MATRIX_WORDS).then(|| Self::new(rows, columns, orientation))
    }

    /// Orientation the matrix was built for.
    #[inline]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Logical row count.
    #[inline]
    pub const fn rows(&self) -> usize {
        match self.orientation {
            Orientation::Horizontal => self.rows,
            Orientation::Vertical => self.columns,
        }
    }

    /// Logical column count.
    #[inline]
    pub const fn columns(&self) -> usize {
        match self.orientation {
            Orientation::Horizontal => self.columns,
            Orientation::Vertical => self.rows,
        }
    }

    /// Logical size (`columns × rows`).
    #[inline]
    pub const fn size(&self) -> CellSize {
        CellSize::new(self.columns(), self.rows())
    }

    /// Search for the first free `width × height` region at or after `start_index`.
    ///
    /// `start_index` is measured along the growth axis: a row for horizontal
    /// matrices, a column for vertical ones. Candidates are tried
    /// left-to-right along a line, then line by line (transposed for
    /// vertical), and the first fit wins.
    ///
    /// Returns `None` when no region exists, or when the request is out of
    /// range: a zero extent, a start outside the matrix, a region running off
    /// the end, or a packed-axis extent above [`MAX_REGION_WIDTH`].
    pub fn try_find_region(
        &self,
        start_index: usize,
        width: usize,
        height: usize,
    ) -> Option<MatrixCell> {
        let (width, height) = self.internal_extent(width, height);

        if width < 1
            || height < 1
            || width > MAX_REGION_WIDTH
            || width > self.columns
            || start_index >= self.rows
            || start_index + height > self.rows
        {
            return None;
        }

        let found = if width == 1 && height == 1 {
            self.find_free_bit(start_index)
        } else {
            self.find_free_region(start_index, width, height)
        };
        found.map(|cell| self.to_logical(cell))
    }

    /// Mark every cell of the `width × height` region at `cell` as occupied.
    ///
    /// # Panics
    ///
    /// Panics if the region extends past the matrix bounds.
    pub fn set_region(&mut self, cell: MatrixCell, width: usize, height: usize) {
        let cell = self.to_internal(cell);
        let (width, height) = self.internal_extent(width, height);
        assert!(
            cell.row + height <= self.rows && cell.col + width <= self.columns,
            "region {width}x{height} at ({}, {}) exceeds {}x{} matrix",
            cell.row,
            cell.col,
            self.rows,
            self.columns,
        );

        if width == 1 && height == 1 {
            self.set_bit(cell.row, cell.col);
            return;
        }
        for row in cell.row..cell.row + height {
            self.fill_span(row, cell.col, width);
        }
    }

    /// `true` when no cell of the logical region is occupied.
    ///
    /// # Panics
    ///
    /// Panics if the region extends past the matrix bounds.
    pub fn is_region_free(&self, cell: MatrixCell, width: usize, height: usize) -> bool {
        let cell = self.to_internal(cell);
        let (width, height) = self.internal_extent(width, height);
        assert!(
            cell.row + height <= self.rows && cell.col + width <= self.columns,
            "region {width}x{height} at ({}, {}) exceeds {}x{} matrix",
            cell.row,
            cell.col,
            self.rows,
            self.columns,
        );
        !self.any_bits_set_in_region(cell.row..cell.row + height, cell.col, width)
    }

    /// Read one logical cell.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col)` lies outside the matrix.
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        let cell = self.to_internal(MatrixCell::new(row, col));
        self.bit(cell.row, cell.col)
    }

    /// Smallest `columns × rows` box (logical) holding every occupied cell.
    ///
    /// The packed axis always reports its full extent; only the growth axis
    /// shrinks to the last occupied line.
    pub fn filled_dimensions(&self) -> CellSize {
        let used_rows = (0..self.rows)
            .rev()
            .find(|&row| !self.row_is_empty(row))
            .map_or(0, |row| row + 1);
        let internal = CellSize::new(self.columns, used_rows);
        match self.orientation {
            Orientation::Horizontal => internal,
            Orientation::Vertical => internal.transpose(),
        }
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Clear every cell.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    // -----------------------------------------------------------------------
    // Internal coordinate space
    // -----------------------------------------------------------------------

    #[inline]
    fn internal_extent(&self, width: usize, height: usize) -> (usize, usize) {
        match self.orientation {
            Orientation::Horizontal => (width, height),
            Orientation::Vertical => (height, width),
        }
    }

    #[inline]
    fn to_internal(&self, cell: MatrixCell) -> MatrixCell {
        match self.orientation {
            Orientation::Horizontal => cell,
            Orientation::Vertical => cell.transpose(),
        }
    }

    #[inline]
    fn to_logical(&self, cell: MatrixCell) -> MatrixCell {
        // Transposition is its own inverse.
        self.to_internal(cell)
    }

    #[inline]
    fn row_words(&self, row: usize) -> &[u64] {
        let start = row * self.words_per_row;
        &self.data[start..start + self.words_per_row]
    }

    #[inline]
    fn row_is_empty(&self, row: usize) -> bool {
        self.row_words(row).iter().fold(0, |acc, w| acc | w) == 0
    }

    fn bit(&self, row: usize, col: usize) -> bool {
        assert!(
            row < self.rows && col < self.columns,
            "cell ({row}, {col}) outside {}x{} matrix",
            self.rows,
            self.columns,
        );
        let word = self.data[row * self.words_per_row + col / WORD_BITS];
        (word >> (col % WORD_BITS)) & 1 == 1
    }

    fn set_bit(&mut self, row: usize, col: usize) {
        assert!(
            row < self.rows && col < self.columns,
            "cell ({row}, {col}) outside {}x{} matrix",
            self.rows,
            self.columns,
        );
        self.data[row * self.words_per_row + col / WORD_BITS] |= 1 << (col % WORD_BITS);
    }

    /// Set `width` consecutive bits of `row` starting at `col`.
    fn fill_span(&mut self, row: usize, col: usize, width: usize) {
        let base = row * self.words_per_row;
        let end = col + width;
        let mut c = col;
        while c < end {
            let shift = c % WORD_BITS;
            let n = (WORD_BITS - shift).min(end - c);
            let mask = if n == WORD_BITS {
                u64::MAX
            } else {
                ((1u64 << n) - 1) << shift
            };
            self.data[base + c / WORD_BITS] |= mask;
            c += n;
        }
    }

    /// Bits `[col, col + width)` of `row`, shifted so `col` is bit 0.
    ///
    /// `width` must not exceed [`MAX_REGION_WIDTH`].
    fn span_bits(&self, row: usize, col: usize, width: usize) -> u64 {
        debug_assert!(width <= MAX_REGION_WIDTH && col + width <= self.columns);
        let index = row * self.words_per_row + col / WORD_BITS;
        let shift = col % WORD_BITS;
        let mut bits = self.data[index] >> shift;
        if shift + width > WORD_BITS {
            bits |= self.data[index + 1] << (WORD_BITS - shift);
        }
        bits & ((1u64 << width) - 1)
    }

    fn any_bits_set_in_region(&self, mut rows: Range<usize>, col: usize, width: usize) -> bool {
        rows.any(|row| {
            let end = col + width;
            let mut c = col;
            while c < end {
                let n = (end - c).min(MAX_REGION_WIDTH);
                if self.span_bits(row, c, n) != 0 {
                    return true;
                }
                c += n;
            }
            false
        })
    }

    fn find_free_bit(&self, start_row: usize) -> Option<MatrixCell> {
        for row in start_row..self.rows {
            if self.row_is_empty(row) {
                return Some(MatrixCell::new(row, 0));
            }
            for (i, word) in self.row_words(row).iter().enumerate() {
                let free = !word;
                if free == 0 {
                    continue;
                }
                let col = i * WORD_BITS + free.trailing_zeros() as usize;
                if col < self.columns {
                    return Some(MatrixCell::new(row, col));
                }
            }
        }
        None
    }

    fn find_free_region(
        &self,
        start_row: usize,
        width: usize,
        height: usize,
    ) -> Option<MatrixCell> {
        for row in start_row..=self.rows - height {
            let below = row + 1..row + height;

            if self.row_is_empty(row) {
                // The window is trivially clear; only the rows below can block.
                for col in 0..=self.columns - width {
                    if !self.any_bits_set_in_region(below.clone(), col, width) {
                        return Some(MatrixCell::new(row, col));
                    }
                }
                continue;
            }

            let mut window = self.span_bits(row, 0, width);
            let mut col = 0;
            loop {
                if window == 0 && !self.any_bits_set_in_region(below.clone(), col, width) {
                    return Some(MatrixCell::new(row, col));
                }
                if col + width >= self.columns {
                    break;
                }
                window = (window >> 1) | (u64::from(self.bit(row, col + width)) << (width - 1));
                col += 1;
            }
        }
        None
    }
}

impl fmt::Display for BitMatrix {
    /// Render the logical grid, `#` for occupied and `.` for free.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows() {
            for col in 0..self.columns() {
                let ch = if self.is_occupied(row, col) { '#' } else { '.' };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
