//! Panel state and drag-to-reorder.
//!
//! [`FluidWrapPanel`] owns the ordered item list, the last layout pass, and
//! at most one drag session. Hosts drive it with measure/arrange requests and
//! pointer events, then mirror the returned order into their own collection.
//!
//! # Drag lifecycle
//!
//! ```text
//! set_composing(true)
//!   begin_drag ─┬─ drag_move* ─┬─ end_drag
//!               │              └─ cancel_drag
//!               └─ cancel_drag
//! ```
//!
//! # Invariants
//!
//! 1. The stored layout always reflects the stored item order.
//! 2. A move that is rejected leaves order and placements untouched.
//! 3. Only one drag session exists at a time, and only in compose mode.
//! 4. An exchange partner is not exchanged again until the dragged region
//!    has fully left the partner's region.
//!
//! # Move resolution
//!
//! Unit-size grids reorder by list index: the cell under the pointer maps to
//! a list position and the dragged item is moved there. Mixed grids compute a
//! candidate region and either exchange it with one equal-footprint item or
//! trial re-pack every other item around it.

use std::sync::Arc;
use std::time::Instant;

use fluidwrap_core::geometry::{CellRect, CellSize, Point, Size};

use crate::bit_matrix::{BitMatrix, MatrixCell};
use crate::cache::{PackCache, PackCacheStats};
use crate::debug::{PackDebugger, PackRecord};
use crate::item::{FluidItem, ItemId, ItemPlacement};
use crate::packer::{PackResult, first_fit, pack};
use crate::{LayoutError, Orientation, PanelConfig};

/// How a drag step changed the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderKind {
    /// Unit-size grid: the item moved to the list index under the pointer.
    Shift,
    /// The item swapped list positions with one equal-footprint item.
    Exchange { partner: ItemId },
    /// A trial re-pack around the candidate region produced a new order.
    Repack,
}

/// Result of a drag step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// No session for this item, or the pointer maps to the current layout.
    Unchanged,
    /// The candidate position does not fit. State is untouched.
    Rejected,
    /// The order changed and the panel re-laid out.
    Reordered {
        /// Full item order for the host to mirror.
        order: Vec<ItemId>,
        kind: ReorderKind,
    },
}

impl DragOutcome {
    /// `true` when the order changed.
    #[inline]
    pub fn changed(&self) -> bool {
        matches!(self, Self::Reordered { .. })
    }

    /// The proposed new order, if any.
    pub fn order(&self) -> Option<&[ItemId]> {
        match self {
            Self::Reordered { order, .. } => Some(order),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    item: ItemId,
    /// Pointer offset inside the item, already multiplied by the drag scale.
    offset: Point,
    exchange_guard: Option<ItemId>,
}

/// A fluid wrap panel: ordered items, their packed layout, and drag state.
#[derive(Debug)]
pub struct FluidWrapPanel {
    config: PanelConfig,
    items: Vec<FluidItem>,
    available: Size,
    layout: PackResult,
    composing: bool,
    drag: Option<DragSession>,
    cache: PackCache,
    debugger: Option<Arc<PackDebugger>>,
}

impl FluidWrapPanel {
    /// Create an empty panel.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] when `config` has a non-positive cell size or
    /// drag scale.
    pub fn new(config: PanelConfig) -> Result<Self, LayoutError> {
        let available = Size::default();
        let layout = pack(&[], &config, available)?;
        Ok(Self {
            config,
            items: Vec::new(),
            available,
            layout,
            composing: false,
            drag: None,
            cache: PackCache::default(),
            debugger: None,
        })
    }

    /// Current configuration.
    #[inline]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Items in their current order.
    #[inline]
    pub fn items(&self) -> &[FluidItem] {
        &self.items
    }

    /// Item ids in their current order.
    pub fn order(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// The last layout pass.
    #[inline]
    pub fn layout(&self) -> &PackResult {
        &self.layout
    }

    /// Placements in list order.
    #[inline]
    pub fn placements(&self) -> &[ItemPlacement] {
        self.layout.placements()
    }

    /// Placement of one item.
    pub fn placement(&self, id: ItemId) -> Option<&ItemPlacement> {
        self.layout.placement(id)
    }

    /// `true` when every item is a single cell.
    #[inline]
    pub fn is_optimized(&self) -> bool {
        self.layout.is_optimized()
    }

    /// Replace the item list and re-lay out.
    ///
    /// An active drag is cancelled when its item is no longer present.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] for duplicate ids or over-wide items. The
    /// previous items stay in place on error.
    pub fn set_items(&mut self, items: Vec<FluidItem>) -> Result<(), LayoutError> {
        let layout = self.run_pass(&items, self.available, "items")?;
        self.items = items;
        self.layout = layout;
        if let Some(session) = self.drag
            && self.layout.position_of(session.item).is_none()
        {
            self.cancel_drag();
        }
        Ok(())
    }

    /// Replace the configuration and re-lay out.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] for an invalid config, or when the new cell
    /// size makes an item too wide. The previous config stays on error.
    pub fn set_config(&mut self, config: PanelConfig) -> Result<(), LayoutError> {
        config.check()?;
        let previous = std::mem::replace(&mut self.config, config);
        match self.run_pass(&self.items.clone(), self.available, "config") {
            Ok(layout) => {
                self.layout = layout;
                Ok(())
            }
            Err(err) => {
                self.config = previous;
                Err(err)
            }
        }
    }

    /// Whether the panel accepts drags.
    #[inline]
    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Enter or leave compose mode. Leaving cancels any active drag.
    pub fn set_composing(&mut self, composing: bool) {
        self.composing = composing;
        if !composing {
            self.cancel_drag();
        }
    }

    /// Record every pass into `debugger` while it is enabled.
    pub fn attach_debugger(&mut self, debugger: Arc<PackDebugger>) {
        self.debugger = Some(debugger);
    }

    /// Stop recording passes.
    pub fn detach_debugger(&mut self) -> Option<Arc<PackDebugger>> {
        self.debugger.take()
    }

    /// Pack cache statistics.
    pub fn cache_stats(&self) -> PackCacheStats {
        self.cache.stats()
    }

    /// Lay out against `available` and return the size the panel needs.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::MatrixTooLarge`] when `available` or the item
    /// sizes are too large to grid, or [`LayoutError::PlacementFailed`] on a
    /// matrix sizing bug.
    pub fn measure(&mut self, available: Size) -> Result<Size, LayoutError> {
        self.resize(available, "measure")?;
        Ok(self.layout.panel_size())
    }

    /// Lay out against the final size and return the placements.
    ///
    /// # Errors
    ///
    /// Same as [`FluidWrapPanel::measure`].
    pub fn arrange(&mut self, final_size: Size) -> Result<&PackResult, LayoutError> {
        self.resize(final_size, "arrange")?;
        Ok(&self.layout)
    }

    /// Item being dragged, if any.
    pub fn dragged_item(&self) -> Option<ItemId> {
        self.drag.map(|session| session.item)
    }

    /// Scaled pointer offset of the active drag.
    pub fn drag_offset(&self) -> Option<Point> {
        self.drag.map(|session| session.offset)
    }

    /// Whether a drag session is active.
    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start dragging `id` with the pointer at `offset` inside the item.
    ///
    /// Returns `false` without side effects when the panel is not composing,
    /// another drag is active, or the item is unknown.
    pub fn begin_drag(&mut self, id: ItemId, offset: Point) -> bool {
        if !self.composing || self.drag.is_some() || self.layout.position_of(id).is_none() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: fluidwrap_core::logging::DRAG_TARGET,
                item = id.get(),
                composing = self.composing,
                busy = self.drag.is_some(),
                "drag start ignored"
            );
            return false;
        }
        let offset = offset.scale(self.config.drag_scale);
        self.drag = Some(DragSession {
            item: id,
            offset,
            exchange_guard: None,
        });
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: fluidwrap_core::logging::DRAG_TARGET,
            item = id.get(),
            offset_x = offset.x,
            offset_y = offset.y,
            "drag started"
        );
        true
    }

    /// Move the dragged item under `pointer` (panel coordinates).
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] only if re-laying out an accepted order fails,
    /// which indicates a matrix sizing bug.
    pub fn drag_move(
        &mut self,
        id: ItemId,
        offset: Point,
        pointer: Point,
    ) -> Result<DragOutcome, LayoutError> {
        if !self.refresh_session(id, offset) {
            return Ok(DragOutcome::Unchanged);
        }
        self.update_position(id, pointer)
    }

    /// Apply a final move, close the session, and re-lay out.
    ///
    /// # Errors
    ///
    /// See [`drag_move`](Self::drag_move).
    pub fn end_drag(
        &mut self,
        id: ItemId,
        offset: Point,
        pointer: Point,
    ) -> Result<DragOutcome, LayoutError> {
        if !self.refresh_session(id, offset) {
            return Ok(DragOutcome::Unchanged);
        }
        let outcome = self.update_position(id, pointer);
        self.drag = None;
        let outcome = outcome?;
        self.relayout("drag_end")?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: fluidwrap_core::logging::DRAG_TARGET,
            item = id.get(),
            changed = outcome.changed(),
            "drag ended"
        );
        Ok(outcome)
    }

    /// Drop the active session without a final move.
    pub fn cancel_drag(&mut self) -> Option<ItemId> {
        let item = self.drag.take().map(|session| session.item);
        #[cfg(feature = "tracing")]
        if let Some(item) = item {
            tracing::debug!(
                target: fluidwrap_core::logging::DRAG_TARGET,
                item = item.get(),
                "drag cancelled"
            );
        }
        item
    }

    fn refresh_session(&mut self, id: ItemId, offset: Point) -> bool {
        let scale = self.config.drag_scale;
        match self.drag.as_mut() {
            Some(session) if session.item == id => {
                session.offset = offset.scale(scale);
                true
            }
            _ => false,
        }
    }

    fn update_position(&mut self, id: ItemId, pointer: Point) -> Result<DragOutcome, LayoutError> {
        let Some(index) = self.layout.position_of(id) else {
            return Ok(DragOutcome::Rejected);
        };
        if self.layout.is_optimized() {
            self.shift_to_pointer(index, pointer)
        } else {
            self.move_region(index, pointer)
        }
    }

    fn shift_to_pointer(
        &mut self,
        index: usize,
        pointer: Point,
    ) -> Result<DragOutcome, LayoutError> {
        let last = self.items.len().saturating_sub(1);
        let target = self.list_index_under(pointer).min(last);
        if target == index {
            return Ok(DragOutcome::Unchanged);
        }
        let mut items = self.items.clone();
        let item = items.remove(index);
        items.insert(target, item);
        self.commit(items, ReorderKind::Shift)
    }

    /// List index under `pointer` for a unit-size grid; `usize::MAX` outside.
    fn list_index_under(&self, pointer: Point) -> usize {
        if !self.layout.panel_size().contains(pointer) {
            return usize::MAX;
        }
        let cell = self.config.cell_size();
        let row = (pointer.y / cell.height).floor() as usize;
        let col = (pointer.x / cell.width).floor() as usize;
        let per_line = self.layout.cells_per_line();
        let (line, along) = match self.config.orientation {
            Orientation::Horizontal => (row, col),
            Orientation::Vertical => (col, row),
        };
        per_line.saturating_mul(line).saturating_add(along)
    }

    fn move_region(&mut self, index: usize, pointer: Point) -> Result<DragOutcome, LayoutError> {
        let current = self.layout.placements()[index];
        let Some(target) = self.candidate_cell(&current, pointer) else {
            return Ok(self.reject(current.id, "candidate outside panel"));
        };
        let size = current.size();
        let matrix = self.layout.matrix_size();
        let fits = target.row.checked_add(size.height).is_some_and(|b| b <= matrix.height)
            && target.col.checked_add(size.width).is_some_and(|r| r <= matrix.width);
        if !fits {
            return Ok(self.reject(current.id, "candidate exceeds matrix"));
        }
        let candidate = CellRect::new(target.row, target.col, size.width, size.height);

        self.release_exchange_guard(&candidate);

        let kept = current
            .rect
            .intersection_opt(&candidate)
            .map_or(0, |overlap| overlap.area());
        if current.rect.area() == kept {
            return Ok(DragOutcome::Unchanged);
        }

        let overlapped: Vec<(usize, &ItemPlacement)> = self
            .layout
            .placements()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.id != current.id && p.rect.intersects(&candidate))
            .collect();
        if let [(partner_index, partner)] = overlapped.as_slice()
            && partner.size() == size
        {
            let (partner_index, partner) = (*partner_index, partner.id);
            return self.exchange(index, partner_index, partner);
        }

        self.trial_repack(index, candidate)
    }

    /// Candidate top-left cell for the dragged item.
    fn candidate_cell(&self, current: &ItemPlacement, pointer: Point) -> Option<MatrixCell> {
        let cell = self.config.cell_size();
        let (x, y) = if current.is_unit_size() {
            (
                (pointer.x / cell.width).floor(),
                (pointer.y / cell.height).floor(),
            )
        } else {
            let offset = self.drag.map(|session| session.offset).unwrap_or_default();
            let origin = pointer.offset_by(offset);
            (
                (origin.x / cell.width).round_ties_even(),
                (origin.y / cell.height).round_ties_even(),
            )
        };
        Some(MatrixCell::new(cell_index(y)?, cell_index(x)?))
    }

    fn release_exchange_guard(&mut self, candidate: &CellRect) {
        let Some(session) = self.drag.as_mut() else {
            return;
        };
        if let Some(partner) = session.exchange_guard {
            let still_over = self
                .layout
                .placement(partner)
                .is_some_and(|p| p.rect.intersects(candidate));
            if !still_over {
                session.exchange_guard = None;
            }
        }
    }

    fn exchange(
        &mut self,
        index: usize,
        partner_index: usize,
        partner: ItemId,
    ) -> Result<DragOutcome, LayoutError> {
        if self.drag.and_then(|session| session.exchange_guard) == Some(partner) {
            return Ok(DragOutcome::Unchanged);
        }
        let mut items = self.items.clone();
        items.swap(index, partner_index);
        let outcome = self.commit(items, ReorderKind::Exchange { partner })?;
        if let Some(session) = self.drag.as_mut() {
            session.exchange_guard = Some(partner);
        }
        Ok(outcome)
    }

    fn trial_repack(
        &mut self,
        index: usize,
        candidate: CellRect,
    ) -> Result<DragOutcome, LayoutError> {
        let dragged = self.layout.placements()[index];
        let matrix_size = self.layout.matrix_size();
        let mut scratch = BitMatrix::new(
            matrix_size.height,
            matrix_size.width,
            self.config.orientation,
        );
        let cell = MatrixCell::new(candidate.row, candidate.col);
        scratch.set_region(cell, candidate.width, candidate.height);

        let others: Vec<(ItemId, CellSize)> = self
            .layout
            .placements()
            .iter()
            .filter(|p| p.id != dragged.id)
            .map(|p| (p.id, p.size()))
            .collect();
        let Ok(mut placed) = first_fit(
            &mut scratch,
            &others,
            self.config.optimize_child_placement,
        ) else {
            return Ok(self.reject(dragged.id, "trial re-pack found no room"));
        };
        placed.push(ItemPlacement::new(dragged.id, cell, dragged.size()));

        // Scan order: each region is first met at its top-left cell.
        match self.config.orientation {
            Orientation::Horizontal => placed.sort_by_key(|p| (p.row(), p.col())),
            Orientation::Vertical => placed.sort_by_key(|p| (p.col(), p.row())),
        }

        let items: Vec<FluidItem> = placed
            .iter()
            .filter_map(|p| self.layout.position_of(p.id).map(|i| self.items[i]))
            .collect();
        if items.iter().map(|i| i.id).eq(self.items.iter().map(|i| i.id)) {
            return Ok(DragOutcome::Unchanged);
        }
        self.commit(items, ReorderKind::Repack)
    }

    fn reject(&self, _item: ItemId, _reason: &'static str) -> DragOutcome {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: fluidwrap_core::logging::DRAG_TARGET,
            item = _item.get(),
            reason = _reason,
            "drag move rejected"
        );
        DragOutcome::Rejected
    }

    fn commit(
        &mut self,
        items: Vec<FluidItem>,
        kind: ReorderKind,
    ) -> Result<DragOutcome, LayoutError> {
        let layout = self.run_pass(&items, self.available, "drag")?;
        let order: Vec<ItemId> = items.iter().map(|item| item.id).collect();
        self.items = items;
        self.layout = layout;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: fluidwrap_core::logging::DRAG_TARGET,
            ?kind,
            order = ?order.iter().map(|id| id.get()).collect::<Vec<_>>(),
            "order changed"
        );
        Ok(DragOutcome::Reordered { order, kind })
    }

    /// Re-pack against `available`, keeping the previous size on error.
    fn resize(&mut self, available: Size, name: &'static str) -> Result<(), LayoutError> {
        let previous = std::mem::replace(&mut self.available, available);
        self.relayout(name).inspect_err(|_| self.available = previous)
    }

    fn relayout(&mut self, name: &'static str) -> Result<(), LayoutError> {
        let layout = self.run_pass(&self.items.clone(), self.available, name)?;
        self.layout = layout;
        Ok(())
    }

    fn run_pass(
        &mut self,
        items: &[FluidItem],
        available: Size,
        name: &'static str,
    ) -> Result<PackResult, LayoutError> {
        let config = self.config;
        let recording = self.debugger.as_ref().filter(|d| d.enabled()).cloned();

        let Some(debugger) = recording else {
            return self
                .cache
                .get_or_try_compute(items, &config, available, || {
                    pack(items, &config, available)
                });
        };

        let mut solve_time = None;
        let result = self.cache.get_or_try_compute(items, &config, available, || {
            let start = Instant::now();
            let result = pack(items, &config, available);
            solve_time = Some(start.elapsed());
            result
        })?;
        let mut record = PackRecord::from_result(name, &result, available);
        record.solve_time = solve_time;
        debugger.record(record);
        Ok(result)
    }
}

/// Whole non-negative cell index, or `None` for negative or non-finite input.
fn cell_index(value: f64) -> Option<usize> {
    (value.is_finite() && value >= 0.0).then_some(value as usize)
}
