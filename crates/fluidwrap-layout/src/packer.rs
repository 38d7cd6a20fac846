//! First-fit grid packing.
//!
//! [`pack`] is one full layout pass: pixel sizes become cell footprints, a
//! fresh [`BitMatrix`] is sized so that first-fit can never run out of room,
//! and items are placed in list order.
//!
//! # Matrix sizing
//!
//! Along the flow axis the matrix is `max(cells_per_line, widest item)`
//! cells. Along the growth axis it is the *sum* of every item's extent, the
//! height of all items stacked one per line. That bound is loose for large
//! mixed panels but guarantees a definitive pass always finds a region.

use fluidwrap_core::geometry::{CellSize, Size};
use rustc_hash::FxHashMap;

use crate::bit_matrix::{BitMatrix, MAX_MATRIX_WORDS, MAX_REGION_WIDTH};
use crate::item::{FluidItem, ItemId, ItemPlacement};
use crate::{LayoutError, Orientation, PanelConfig};

/// Outcome of a full layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PackResult {
    orientation: Orientation,
    cell_size: Size,
    placements: Vec<ItemPlacement>,
    index: FxHashMap<ItemId, usize>,
    matrix_size: CellSize,
    filled_size: CellSize,
    cells_per_line: usize,
    optimized: bool,
}

impl PackResult {
    /// Placements in list order.
    #[inline]
    pub fn placements(&self) -> &[ItemPlacement] {
        &self.placements
    }

    /// Placement of one item.
    pub fn placement(&self, id: ItemId) -> Option<&ItemPlacement> {
        self.index.get(&id).map(|&i| &self.placements[i])
    }

    /// List index of one item.
    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Item ids in packing order.
    pub fn order(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.placements.iter().map(|p| p.id)
    }

    /// Number of placed items.
    #[inline]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// `true` when no items were packed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Orientation the pass ran with.
    #[inline]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Pixel size of one cell.
    #[inline]
    pub const fn cell_size(&self) -> Size {
        self.cell_size
    }

    /// Logical size of the matrix the pass packed into (`columns × rows`).
    #[inline]
    pub const fn matrix_size(&self) -> CellSize {
        self.matrix_size
    }

    /// Bounding box of all placements, in cells.
    #[inline]
    pub const fn filled_size(&self) -> CellSize {
        self.filled_size
    }

    /// Cells that fit along the flow axis of the available space.
    #[inline]
    pub const fn cells_per_line(&self) -> usize {
        self.cells_per_line
    }

    /// `true` when every item is exactly one cell.
    #[inline]
    pub const fn is_optimized(&self) -> bool {
        self.optimized
    }

    /// Size the host panel should report, in pixels.
    pub fn panel_size(&self) -> Size {
        self.filled_size.to_pixels(self.cell_size)
    }
}

/// Snap a pixel extent to a whole number of cells.
///
/// Rounds to the nearest cell (ties to even) and never returns less than
/// one. Non-finite or non-positive extents occupy a single cell.
pub fn cells_for(desired_px: f64, cell_px: f64) -> usize {
    if !desired_px.is_finite() || desired_px <= 0.0 {
        return 1;
    }
    let cells = (desired_px / cell_px).round_ties_even();
    if cells < 1.0 { 1 } else { cells as usize }
}

/// Whole cells that fit in `available_px`, at least one.
///
/// An unbounded extent yields `unbounded`, typically every item on one line.
pub fn cells_per_line(available_px: f64, cell_px: f64, unbounded: usize) -> usize {
    if available_px.is_infinite() && available_px > 0.0 {
        return unbounded.max(1);
    }
    let cells = (available_px / cell_px).floor();
    if cells.is_nan() || cells < 1.0 { 1 } else { cells as usize }
}

/// Run a full layout pass.
///
/// # Errors
///
/// Returns [`LayoutError`] for an invalid config, a repeated item id, an
/// item wider than [`MAX_REGION_WIDTH`] along the flow axis, sizes whose
/// matrix would exceed [`MAX_MATRIX_WORDS`], or (on a sizing bug) an item
/// that first-fit could not place.
pub fn pack(
    items: &[FluidItem],
    config: &PanelConfig,
    available: Size,
) -> Result<PackResult, LayoutError> {
    config.check()?;
    let orientation = config.orientation;

    let mut index = FxHashMap::with_capacity_and_hasher(items.len(), Default::default());
    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if index.insert(item.id, i).is_some() {
            return Err(LayoutError::DuplicateItem { id: item.id });
        }
        let size = CellSize::new(
            cells_for(item.desired.width, config.cell_width),
            cells_for(item.desired.height, config.cell_height),
        );
        let extent = flow_extent(size, orientation);
        if extent > MAX_REGION_WIDTH {
            return Err(LayoutError::RegionTooWide {
                id: item.id,
                extent,
                max: MAX_REGION_WIDTH,
            });
        }
        entries.push((item.id, size));
    }

    let optimized = entries.iter().all(|(_, size)| size.is_unit());
    let total_flow: usize = entries.iter().map(|(_, s)| flow_extent(*s, orientation)).sum();
    let cells_per_line = match orientation {
        Orientation::Horizontal => {
            cells_per_line(available.width, config.cell_width, total_flow)
        }
        Orientation::Vertical => {
            cells_per_line(available.height, config.cell_height, total_flow)
        }
    };
    let matrix_size = matrix_size_for(&entries, orientation, cells_per_line);

    let mut matrix = BitMatrix::try_new(matrix_size.height, matrix_size.width, orientation)
        .ok_or(LayoutError::MatrixTooLarge {
            columns: matrix_size.width,
            rows: matrix_size.height,
        })?;
    let placements = first_fit(&mut matrix, &entries, config.optimize_child_placement).map_err(
        |failed| {
            let (id, size) = entries[failed];
            #[cfg(feature = "tracing")]
            tracing::error!(
                target: fluidwrap_core::logging::LAYOUT_TARGET,
                item = id.get(),
                index = failed,
                width = size.width,
                height = size.height,
                "first-fit placement failed in pre-sized matrix"
            );
            LayoutError::PlacementFailed {
                id,
                index: failed,
                width: size.width,
                height: size.height,
            }
        },
    )?;
    let filled_size = matrix.filled_dimensions();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: fluidwrap_core::logging::LAYOUT_TARGET,
        items = placements.len(),
        ?orientation,
        cells_per_line,
        matrix_columns = matrix_size.width,
        matrix_rows = matrix_size.height,
        filled_columns = filled_size.width,
        filled_rows = filled_size.height,
        optimized,
        "layout pass complete"
    );

    Ok(PackResult {
        orientation,
        cell_size: config.cell_size(),
        placements,
        index,
        matrix_size,
        filled_size,
        cells_per_line,
        optimized,
    })
}

/// Extent of a footprint along the flow axis (the matrix word axis).
#[inline]
pub(crate) fn flow_extent(size: CellSize, orientation: Orientation) -> usize {
    match orientation {
        Orientation::Horizontal => size.width,
        Orientation::Vertical => size.height,
    }
}

/// Logical matrix size able to hold every entry under first-fit.
pub(crate) fn matrix_size_for(
    entries: &[(ItemId, CellSize)],
    orientation: Orientation,
    cells_per_line: usize,
) -> CellSize {
    let widest = entries
        .iter()
        .map(|(_, s)| flow_extent(*s, orientation))
        .max()
        .unwrap_or(0);
    // Saturates instead of wrapping; the matrix constructor rejects the result.
    let stacked = entries
        .iter()
        .map(|(_, s)| flow_extent(*s, orientation.flipped()))
        .fold(0usize, usize::saturating_add);
    let flow = widest.max(cells_per_line);
    let growth = stacked.max(1);
    match orientation {
        Orientation::Horizontal => CellSize::new(flow, growth),
        Orientation::Vertical => CellSize::new(growth, flow),
    }
}

/// Place `entries` in order, marking each region in `matrix`.
///
/// Returns the list index of the first entry that did not fit.
pub(crate) fn first_fit(
    matrix: &mut BitMatrix,
    entries: &[(ItemId, CellSize)],
    optimize_child_placement: bool,
) -> Result<Vec<ItemPlacement>, usize> {
    let orientation = matrix.orientation();
    let mut placements: Vec<ItemPlacement> = Vec::with_capacity(entries.len());
    for (i, &(id, size)) in entries.iter().enumerate() {
        let start_index = match placements.last() {
            Some(prev) if !optimize_child_placement => match orientation {
                Orientation::Horizontal => prev.row(),
                Orientation::Vertical => prev.col(),
            },
            _ => 0,
        };
        let cell = matrix
            .try_find_region(start_index, size.width, size.height)
            .ok_or(i)?;
        matrix.set_region(cell, size.width, size.height);
        placements.push(ItemPlacement::new(id, cell, size));
    }
    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatrixCell;

    fn unit(id: u64) -> FluidItem {
        FluidItem::new(id, 10.0, 10.0)
    }

    fn cells(result: &PackResult) -> Vec<(usize, usize)> {
        result.placements().iter().map(|p| (p.row(), p.col())).collect()
    }

    #[test]
    fn cells_for_rounds_to_nearest() {
        assert_eq!(cells_for(10.0, 10.0), 1);
        assert_eq!(cells_for(14.0, 10.0), 1);
        assert_eq!(cells_for(16.0, 10.0), 2);
        assert_eq!(cells_for(25.0, 10.0), 2, "ties go to even");
        assert_eq!(cells_for(35.0, 10.0), 4, "ties go to even");
        assert_eq!(cells_for(3.0, 10.0), 1, "never below one cell");
        assert_eq!(cells_for(0.0, 10.0), 1);
        assert_eq!(cells_for(f64::NAN, 10.0), 1);
    }

    #[test]
    fn cells_per_line_floors_and_clamps() {
        assert_eq!(cells_per_line(25.0, 10.0, 9), 2);
        assert_eq!(cells_per_line(5.0, 10.0, 9), 1);
        assert_eq!(cells_per_line(-5.0, 10.0, 9), 1);
        assert_eq!(cells_per_line(f64::INFINITY, 10.0, 9), 9);
        assert_eq!(cells_per_line(f64::INFINITY, 10.0, 0), 1);
        assert_eq!(cells_per_line(f64::NAN, 10.0, 9), 1);
    }

    #[test]
    fn unit_items_wrap_after_cells_per_line() {
        let config = PanelConfig::new(10.0, 10.0);
        let result = pack(&[unit(0), unit(1), unit(2)], &config, Size::new(20.0, 100.0))
            .expect("pack succeeds");
        assert_eq!(cells(&result), vec![(0, 0), (0, 1), (1, 0)]);
        assert!(result.is_optimized());
        assert_eq!(result.cells_per_line(), 2);
        assert_eq!(result.filled_size(), CellSize::new(2, 2));
        assert_eq!(result.panel_size(), Size::new(20.0, 20.0));
    }

    #[test]
    fn wide_item_then_units_fill_next_line() {
        let config = PanelConfig::new(10.0, 10.0);
        let items = [FluidItem::new(0, 20.0, 10.0), unit(1), unit(2)];
        let result = pack(&items, &config, Size::new(20.0, 100.0)).expect("pack succeeds");
        assert_eq!(cells(&result), vec![(0, 0), (1, 0), (1, 1)]);
        assert_eq!(result.placements()[0].width(), 2);
        assert!(!result.is_optimized());
    }

    #[test]
    fn optimized_placement_backfills_holes() {
        // A 2x2 then a 2x1 on a 3-wide line leave column 2 open on rows 0 and 1.
        let items = [
            FluidItem::new(0, 20.0, 20.0),
            FluidItem::new(1, 20.0, 10.0),
            unit(2),
            unit(3),
        ];
        let config = PanelConfig::new(10.0, 10.0);
        let result = pack(&items, &config, Size::new(30.0, 100.0)).expect("pack succeeds");
        assert_eq!(cells(&result), vec![(0, 0), (2, 0), (0, 2), (1, 2)]);

        let config = config.optimize_child_placement(false);
        let result = pack(&items, &config, Size::new(30.0, 100.0)).expect("pack succeeds");
        // Each search starts at the previous item's row, never above it.
        assert_eq!(cells(&result), vec![(0, 0), (2, 0), (2, 2), (3, 0)]);
    }

    #[test]
    fn matrix_grows_with_stacked_extents() {
        let items = [FluidItem::new(0, 10.0, 30.0), FluidItem::new(1, 40.0, 20.0)];
        let config = PanelConfig::new(10.0, 10.0);
        let result = pack(&items, &config, Size::new(20.0, 10.0)).expect("pack succeeds");
        // Flow axis widens to the widest item, growth axis is 3 + 2 rows.
        assert_eq!(result.matrix_size(), CellSize::new(4, 5));
        assert_eq!(cells(&result), vec![(0, 0), (3, 0)]);
    }

    #[test]
    fn vertical_flows_down_then_right() {
        let config = PanelConfig::new(10.0, 10.0).orientation(Orientation::Vertical);
        let result = pack(&[unit(0), unit(1), unit(2)], &config, Size::new(100.0, 20.0))
            .expect("pack succeeds");
        assert_eq!(cells(&result), vec![(0, 0), (1, 0), (0, 1)]);
        assert_eq!(result.filled_size(), CellSize::new(2, 2));
    }

    #[test]
    fn empty_list_packs_to_nothing() {
        let result = pack(&[], &PanelConfig::default(), Size::new(100.0, 100.0))
            .expect("pack succeeds");
        assert!(result.is_empty());
        assert_eq!(result.panel_size().height, 0.0);
    }

    #[test]
    fn unbounded_width_puts_everything_on_one_line() {
        let config = PanelConfig::new(10.0, 10.0);
        let items = [unit(0), FluidItem::new(1, 20.0, 10.0), unit(2)];
        let result =
            pack(&items, &config, Size::new(f64::INFINITY, 10.0)).expect("pack succeeds");
        assert_eq!(result.cells_per_line(), 4);
        assert_eq!(cells(&result), vec![(0, 0), (0, 1), (0, 3)]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = pack(&[unit(4), unit(4)], &PanelConfig::default(), Size::new(50.0, 50.0))
            .unwrap_err();
        assert_eq!(err, LayoutError::DuplicateItem { id: ItemId::new(4) });
    }

    #[test]
    fn items_wider_than_sixty_cells_are_rejected() {
        let config = PanelConfig::new(1.0, 1.0);
        let err = pack(&[FluidItem::new(9, 61.0, 1.0)], &config, Size::new(100.0, 100.0))
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::RegionTooWide {
                id: ItemId::new(9),
                extent: 61,
                max: 60
            }
        );

        // Vertical panels limit heights instead.
        let config = config.orientation(Orientation::Vertical);
        assert!(pack(&[FluidItem::new(9, 61.0, 1.0)], &config, Size::new(100.0, 100.0)).is_ok());
    }

    #[test]
    fn huge_growth_extent_is_rejected() {
        let config = PanelConfig::new(1.0, 1.0);
        let err = pack(&[FluidItem::new(0, 1.0, 1e300)], &config, Size::new(10.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, LayoutError::MatrixTooLarge { columns: 10, .. }));

        // Two saturated heights must not wrap around to a small sum.
        let items = [FluidItem::new(0, 1.0, 1e300), FluidItem::new(1, 1.0, 1e300)];
        let err = pack(&items, &config, Size::new(10.0, 10.0)).unwrap_err();
        assert!(matches!(err, LayoutError::MatrixTooLarge { rows: usize::MAX, .. }));
    }

    #[test]
    fn huge_available_extent_is_rejected() {
        let config = PanelConfig::new(1.0, 1.0);
        let err = pack(&[unit(0)], &config, Size::new(1e300, 10.0)).unwrap_err();
        assert!(matches!(err, LayoutError::MatrixTooLarge { rows: 1, .. }));
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn invalid_cell_size_is_rejected() {
        let err = pack(&[unit(0)], &PanelConfig::new(0.0, 10.0), Size::new(50.0, 50.0))
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidCellSize { axis: "width", .. }));
    }

    #[test]
    fn first_fit_reports_failing_index() {
        let mut matrix = BitMatrix::new(1, 2, Orientation::Horizontal);
        let entries = [
            (ItemId::new(0), CellSize::new(1, 1)),
            (ItemId::new(1), CellSize::new(1, 1)),
            (ItemId::new(2), CellSize::new(1, 1)),
        ];
        assert_eq!(first_fit(&mut matrix, &entries, true), Err(2));
        assert!(matrix.is_occupied(0, 0) && matrix.is_occupied(0, 1));
    }

    #[test]
    fn placement_lookup_by_id() {
        let result = pack(
            &[unit(10), unit(20)],
            &PanelConfig::default(),
            Size::new(100.0, 100.0),
        )
        .expect("pack succeeds");
        let second = result.placement(ItemId::new(20)).expect("item placed");
        assert_eq!(second.cell(), MatrixCell::new(0, 1));
        assert_eq!(result.position_of(ItemId::new(20)), Some(1));
        assert_eq!(result.placement(ItemId::new(30)), None);
        assert_eq!(
            result.order().collect::<Vec<_>>(),
            vec![ItemId::new(10), ItemId::new(20)]
        );
    }
}
