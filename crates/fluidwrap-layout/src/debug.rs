//! Pack debugging utilities.
//!
//! Provides introspection into layout passes:
//! - Recording of every pass a panel runs
//! - Utilization of the filled area (how many cells the packing left empty)
//! - ASCII occupancy grids for eyeballing holes
//!
//! # Feature Gating
//!
//! This module is always compiled (the types are useful for testing),
//! but recording is a no-op unless explicitly enabled at runtime.
//!
//! # Usage
//!
//! ```ignore
//! use fluidwrap_layout::debug::PackDebugger;
//!
//! let debugger = PackDebugger::new();
//! debugger.set_enabled(true);
//! panel.attach_debugger(debugger.clone());
//!
//! // ... measure, arrange, drag ...
//!
//! for record in debugger.snapshot() {
//!     println!("{}", record.summary());
//! }
//! ```

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fluidwrap_core::geometry::{CellSize, Size};

use crate::Orientation;
use crate::item::ItemPlacement;
use crate::packer::PackResult;

/// A record of a single layout pass.
#[derive(Debug, Clone)]
pub struct PackRecord {
    /// Name of the pass, e.g. `"measure"` or `"drag"`.
    pub name: String,
    /// Flow direction.
    pub orientation: Orientation,
    /// Pixel size of one cell.
    pub cell_size: Size,
    /// Available pixel size the pass ran against.
    pub available: Size,
    /// Cells per line along the flow axis.
    pub cells_per_line: usize,
    /// Logical matrix size.
    pub matrix_size: CellSize,
    /// Bounding box of all placements.
    pub filled_size: CellSize,
    /// Placements in list order.
    pub placements: Vec<ItemPlacement>,
    /// Whether the unit-size fast path applied.
    pub optimized: bool,
    /// Time taken to pack (if measured).
    pub solve_time: Option<Duration>,
}

impl PackRecord {
    /// Capture a finished pass.
    pub fn from_result(name: impl Into<String>, result: &PackResult, available: Size) -> Self {
        Self {
            name: name.into(),
            orientation: result.orientation(),
            cell_size: result.cell_size(),
            available,
            cells_per_line: result.cells_per_line(),
            matrix_size: result.matrix_size(),
            filled_size: result.filled_size(),
            placements: result.placements().to_vec(),
            optimized: result.is_optimized(),
            solve_time: None,
        }
    }

    /// Attach a measured solve time.
    #[must_use]
    pub fn with_solve_time(mut self, solve_time: Duration) -> Self {
        self.solve_time = Some(solve_time);
        self
    }

    /// Cells covered by placements.
    pub fn occupied_cells(&self) -> usize {
        self.placements.iter().map(|p| p.rect.area()).sum()
    }

    /// Percentage of the filled bounding box covered by items.
    pub fn utilization(&self) -> f32 {
        let area = self.filled_size.area();
        if area == 0 {
            return 0.0;
        }
        (self.occupied_cells() as f32 / area as f32).min(1.0) * 100.0
    }

    /// `true` when the packing left empty cells inside its bounding box.
    pub fn has_holes(&self) -> bool {
        self.occupied_cells() < self.filled_size.area()
    }

    /// Render the filled area as rows of `#` (occupied) and `.` (empty).
    pub fn occupancy_grid(&self) -> String {
        let CellSize { width, height } = self.filled_size;
        let mut grid = vec![vec![false; width]; height];
        for placement in &self.placements {
            for (row, col) in placement.rect.cells() {
                if let Some(cell) = grid.get_mut(row).and_then(|r| r.get_mut(col)) {
                    *cell = true;
                }
            }
        }
        let mut s = String::with_capacity(height * (width + 1));
        for row in grid {
            for occupied in row {
                s.push(if occupied { '#' } else { '.' });
            }
            s.push('\n');
        }
        s
    }

    /// Generate a human-readable summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "{} ({:?}):", self.name, self.orientation);
        let _ = writeln!(
            s,
            "  Available: {}x{} px, cell {}x{} px",
            self.available.width, self.available.height, self.cell_size.width, self.cell_size.height
        );
        let _ = writeln!(
            s,
            "  Matrix: {}x{} cells, {} per line",
            self.matrix_size.width, self.matrix_size.height, self.cells_per_line
        );
        for (i, p) in self.placements.iter().enumerate() {
            let origin = p.pixel_origin(self.cell_size);
            let _ = writeln!(
                s,
                "  [{i}] item {} -> ({},{} {}x{}) at {},{} px",
                p.id.get(),
                p.row(),
                p.col(),
                p.width(),
                p.height(),
                origin.x,
                origin.y
            );
        }
        let _ = writeln!(
            s,
            "  Filled: {}x{} cells, utilization {:.1}%",
            self.filled_size.width,
            self.filled_size.height,
            self.utilization()
        );
        if self.optimized {
            let _ = writeln!(s, "  Unit-size fast path");
        }
        if let Some(t) = self.solve_time {
            let _ = writeln!(s, "  Solve time: {:?}", t);
        }
        s
    }
}

/// Pack debugger.
///
/// Collects pack records for introspection. Thread-safe via internal
/// synchronization; can be shared across panels.
#[derive(Debug)]
pub struct PackDebugger {
    enabled: AtomicBool,
    records: Mutex<Vec<PackRecord>>,
}

impl PackDebugger {
    /// Create a new debugger wrapped in Arc (disabled by default).
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(false),
            records: Mutex::new(Vec::new()),
        })
    }

    /// Check if debugging is enabled.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable debugging.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Toggle debugging on/off.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    /// Clear all recorded data.
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }

    /// Record a pass.
    pub fn record(&self, record: PackRecord) {
        if !self.enabled() {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    /// Get a snapshot of all records.
    pub fn snapshot(&self) -> Vec<PackRecord> {
        self.records
            .lock()
            .ok()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<PackRecord> {
        self.records.lock().ok().and_then(|r| r.last().cloned())
    }

    /// Records whose packing left holes.
    pub fn sparse(&self) -> Vec<PackRecord> {
        self.snapshot()
            .into_iter()
            .filter(PackRecord::has_holes)
            .collect()
    }

    /// Generate a summary report of all recorded passes.
    pub fn report(&self) -> String {
        let records = self.snapshot();

        let mut s = String::new();
        let _ = writeln!(s, "=== Pack Debug Report ({} passes) ===", records.len());

        let sparse: Vec<_> = records.iter().filter(|r| r.has_holes()).collect();
        if !sparse.is_empty() {
            let _ = writeln!(s, "\n{} passes left holes:", sparse.len());
            for r in &sparse {
                let _ = writeln!(s, "  - {} ({:.1}% utilization)", r.name, r.utilization());
            }
        }

        for record in &records {
            let _ = write!(s, "\n{}", record.summary());
        }
        s
    }
}
