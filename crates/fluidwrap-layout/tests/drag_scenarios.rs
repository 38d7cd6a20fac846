//! E2E drag scenarios for the fluid wrap panel.
//!
//! Every test emits structured JSONL records for post-hoc analysis and
//! regression triage.
//!
//! Run with: `cargo test -p fluidwrap-layout --test drag_scenarios -- --nocapture`
//!
//! JSONL schema per record:
//! ```json
//! { "test": "<name>", "phase": "<setup|execute|verify>",
//!   ...<phase-specific fields> }
//! ```

use std::io::Write as _;
use std::sync::Mutex;
use std::time::Instant;

use fluidwrap_layout::debug::PackDebugger;
use fluidwrap_layout::{
    DragOutcome, FluidItem, FluidWrapPanel, ItemId, MatrixCell, Orientation, PanelConfig, Point,
    ReorderKind, Size,
};
use serde_json::json;

// ============================================================================
// JSONL logging infrastructure
// ============================================================================

struct JsonlLog {
    entries: Mutex<Vec<serde_json::Value>>,
}

impl JsonlLog {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn emit(&self, entry: serde_json::Value) {
        self.entries.lock().unwrap().push(entry);
    }

    fn flush(&self, test_name: &str) {
        let entries = self.entries.lock().unwrap();
        let mut stderr = std::io::stderr().lock();
        for entry in entries.iter() {
            let _ = writeln!(stderr, "[JSONL] {test_name}: {entry}");
        }
    }
}

fn elapsed_ns(start: &Instant) -> u64 {
    start.elapsed().as_nanos() as u64
}

// ============================================================================
// Helpers
// ============================================================================

fn ids(raw: &[u64]) -> Vec<ItemId> {
    raw.iter().copied().map(ItemId::new).collect()
}

fn raw_order(panel: &FluidWrapPanel) -> Vec<u64> {
    panel.order().iter().map(|id| id.get()).collect()
}

fn cells(panel: &FluidWrapPanel) -> Vec<(u64, usize, usize)> {
    panel
        .placements()
        .iter()
        .map(|p| (p.id.get(), p.row(), p.col()))
        .collect()
}

fn composing_panel(config: PanelConfig, items: Vec<FluidItem>, available: Size) -> FluidWrapPanel {
    let mut panel = FluidWrapPanel::new(config).expect("valid config");
    panel.set_items(items).expect("items pack");
    panel.measure(available).expect("measure");
    panel.set_composing(true);
    panel
}

fn outcome_kind(outcome: &DragOutcome) -> &'static str {
    match outcome {
        DragOutcome::Unchanged => "unchanged",
        DragOutcome::Rejected => "rejected",
        DragOutcome::Reordered {
            kind: ReorderKind::Shift,
            ..
        } => "shift",
        DragOutcome::Reordered {
            kind: ReorderKind::Exchange { .. },
            ..
        } => "exchange",
        DragOutcome::Reordered {
            kind: ReorderKind::Repack,
            ..
        } => "repack",
    }
}

// ============================================================================
// Unit-size grids
// ============================================================================

#[test]
fn e2e_unit_grid_drag_to_front() {
    let log = JsonlLog::new();
    let start = Instant::now();
    let name = "unit_grid_drag_to_front";

    let config = PanelConfig::new(10.0, 10.0);
    let items = (0..3).map(|i| FluidItem::new(i, 10.0, 10.0)).collect();
    let mut panel = composing_panel(config, items, Size::new(30.0, 100.0));

    log.emit(json!({
        "test": name,
        "phase": "setup",
        "cells_per_line": panel.layout().cells_per_line(),
        "order": raw_order(&panel),
        "timestamp_ns": elapsed_ns(&start),
    }));
    assert_eq!(panel.layout().cells_per_line(), 3);
    assert!(panel.is_optimized());

    let item = ItemId::new(2);
    assert!(panel.begin_drag(item, Point::new(5.0, 5.0)));
    let outcome = panel
        .drag_move(item, Point::new(5.0, 5.0), Point::new(4.0, 6.0))
        .expect("drag move");

    log.emit(json!({
        "test": name,
        "phase": "execute",
        "outcome": outcome_kind(&outcome),
        "order": raw_order(&panel),
        "timestamp_ns": elapsed_ns(&start),
    }));

    assert_eq!(outcome.order(), Some(ids(&[2, 0, 1]).as_slice()));
    assert_eq!(cells(&panel), vec![(2, 0, 0), (0, 0, 1), (1, 0, 2)]);

    let outcome = panel
        .end_drag(item, Point::new(5.0, 5.0), Point::new(4.0, 6.0))
        .expect("end drag");
    assert_eq!(outcome, DragOutcome::Unchanged);
    assert!(!panel.is_dragging());

    log.emit(json!({
        "test": name,
        "phase": "verify",
        "pass": true,
        "timestamp_ns": elapsed_ns(&start),
    }));
    log.flush(name);
}

#[test]
fn e2e_unit_grid_follows_pointer_across_lines() {
    let log = JsonlLog::new();
    let start = Instant::now();
    let name = "unit_grid_follows_pointer_across_lines";

    let config = PanelConfig::new(10.0, 10.0);
    let items = (0..6).map(|i| FluidItem::new(i, 10.0, 10.0)).collect();
    let mut panel = composing_panel(config, items, Size::new(30.0, 100.0));
    let item = ItemId::new(0);
    assert!(panel.begin_drag(item, Point::default()));

    // Walk the pointer through (row 0, col 1), (row 1, col 1), (row 1, col 2).
    let path = [Point::new(15.0, 5.0), Point::new(15.0, 15.0), Point::new(25.0, 15.0)];
    let mut positions = Vec::new();
    for pointer in path {
        let outcome = panel
            .drag_move(item, Point::default(), pointer)
            .expect("drag move");
        let position = panel.layout().position_of(item).expect("item placed");
        log.emit(json!({
            "test": name,
            "phase": "execute",
            "pointer": [pointer.x, pointer.y],
            "outcome": outcome_kind(&outcome),
            "position": position,
            "timestamp_ns": elapsed_ns(&start),
        }));
        positions.push(position);
    }

    assert_eq!(positions, vec![1, 4, 5]);
    assert_eq!(raw_order(&panel), vec![1, 2, 3, 4, 5, 0]);

    log.emit(json!({ "test": name, "phase": "verify", "pass": true }));
    log.flush(name);
}

// ============================================================================
// Mixed-size grids
// ============================================================================

#[test]
fn e2e_equal_footprint_exchange_and_own_cell() {
    let log = JsonlLog::new();
    let start = Instant::now();
    let name = "equal_footprint_exchange_and_own_cell";

    let config = PanelConfig::new(10.0, 10.0);
    let items = vec![
        FluidItem::new(1, 20.0, 20.0),
        FluidItem::new(2, 20.0, 20.0),
        FluidItem::new(3, 10.0, 10.0),
    ];
    let mut panel = composing_panel(config, items, Size::new(40.0, 100.0));
    log.emit(json!({
        "test": name,
        "phase": "setup",
        "cells": cells(&panel),
        "timestamp_ns": elapsed_ns(&start),
    }));
    assert_eq!(cells(&panel), vec![(1, 0, 0), (2, 0, 2), (3, 2, 0)]);

    let a = ItemId::new(1);
    let offset = Point::new(12.0, 8.0);
    assert!(panel.begin_drag(a, offset));

    // Own position first: nothing is vacated.
    let outcome = panel
        .drag_move(a, offset, Point::new(12.0, 8.0))
        .expect("drag move");
    assert_eq!(outcome, DragOutcome::Unchanged);

    let before = cells(&panel);
    let outcome = panel
        .drag_move(a, offset, Point::new(32.0, 8.0))
        .expect("drag move");
    log.emit(json!({
        "test": name,
        "phase": "execute",
        "outcome": outcome_kind(&outcome),
        "before": before,
        "after": cells(&panel),
        "timestamp_ns": elapsed_ns(&start),
    }));
    assert_eq!(
        outcome,
        DragOutcome::Reordered {
            order: ids(&[2, 1, 3]),
            kind: ReorderKind::Exchange {
                partner: ItemId::new(2)
            }
        }
    );
    assert_eq!(panel.placement(a).map(|p| p.cell()), Some(MatrixCell::new(0, 2)));
    assert_eq!(
        panel.placement(ItemId::new(2)).map(|p| p.cell()),
        Some(MatrixCell::new(0, 0))
    );

    let outcome = panel
        .drag_move(a, offset, Point::new(32.0, 8.0))
        .expect("drag move");
    assert!(!outcome.changed(), "own cell after the swap is a no-op");

    log.emit(json!({ "test": name, "phase": "verify", "pass": true }));
    log.flush(name);
}

#[test]
fn e2e_rejected_moves_leave_layout_untouched() {
    let log = JsonlLog::new();
    let start = Instant::now();
    let name = "rejected_moves_leave_layout_untouched";

    let config = PanelConfig::new(10.0, 10.0);
    let items = vec![
        FluidItem::new(1, 30.0, 10.0),
        FluidItem::new(2, 10.0, 10.0),
        FluidItem::new(3, 10.0, 10.0),
    ];
    let mut panel = composing_panel(config, items, Size::new(30.0, 100.0));
    let snapshot = panel.layout().clone();
    let a = ItemId::new(1);
    assert!(panel.begin_drag(a, Point::default()));

    for pointer in [
        Point::new(15.0, 0.0),
        Point::new(-15.0, 0.0),
        Point::new(0.0, 900.0),
        Point::new(f64::NAN, 0.0),
    ] {
        let outcome = panel.drag_move(a, Point::default(), pointer).expect("drag move");
        log.emit(json!({
            "test": name,
            "phase": "execute",
            "pointer": [pointer.x.to_string(), pointer.y.to_string()],
            "outcome": outcome_kind(&outcome),
            "timestamp_ns": elapsed_ns(&start),
        }));
        assert_eq!(outcome, DragOutcome::Rejected);
        assert_eq!(panel.layout(), &snapshot);
    }

    log.emit(json!({ "test": name, "phase": "verify", "pass": true }));
    log.flush(name);
}

#[test]
fn e2e_trial_repack_reflows_neighbours() {
    let log = JsonlLog::new();
    let start = Instant::now();
    let name = "trial_repack_reflows_neighbours";

    // [1 1 2]
    // [3 4 .]
    let config = PanelConfig::new(10.0, 10.0);
    let items = vec![
        FluidItem::new(1, 20.0, 10.0),
        FluidItem::new(2, 10.0, 10.0),
        FluidItem::new(3, 10.0, 10.0),
        FluidItem::new(4, 10.0, 10.0),
    ];
    let mut panel = composing_panel(config, items, Size::new(30.0, 100.0));
    assert_eq!(cells(&panel), vec![(1, 0, 0), (2, 0, 2), (3, 1, 0), (4, 1, 1)]);

    // Drop the 2x1 on the second line, spanning item 4 and the free cell.
    let a = ItemId::new(1);
    assert!(panel.begin_drag(a, Point::default()));
    let outcome = panel
        .end_drag(a, Point::default(), Point::new(10.0, 10.0))
        .expect("end drag");

    log.emit(json!({
        "test": name,
        "phase": "execute",
        "outcome": outcome_kind(&outcome),
        "cells": cells(&panel),
        "timestamp_ns": elapsed_ns(&start),
    }));

    // Trial: 2 -> (0,0), 3 -> (0,1), 4 -> (0,2), 1 pinned at (1,1).
    assert_eq!(outcome.order(), Some(ids(&[2, 3, 4, 1]).as_slice()));
    assert_eq!(cells(&panel), vec![(2, 0, 0), (3, 0, 1), (4, 0, 2), (1, 1, 0)]);
    assert!(!panel.is_dragging());

    log.emit(json!({ "test": name, "phase": "verify", "pass": true }));
    log.flush(name);
}

#[test]
fn e2e_vertical_exchange() {
    let log = JsonlLog::new();
    let start = Instant::now();
    let name = "vertical_exchange";

    let config = PanelConfig::new(10.0, 10.0).orientation(Orientation::Vertical);
    let items = vec![
        FluidItem::new(1, 10.0, 20.0),
        FluidItem::new(2, 10.0, 20.0),
        FluidItem::new(3, 20.0, 10.0),
    ];
    let mut panel = composing_panel(config, items, Size::new(100.0, 40.0));
    // Lines run top to bottom, four cells tall.
    assert_eq!(cells(&panel), vec![(1, 0, 0), (2, 2, 0), (3, 0, 1)]);

    let a = ItemId::new(1);
    assert!(panel.begin_drag(a, Point::new(5.0, 5.0)));
    let outcome = panel
        .drag_move(a, Point::new(5.0, 5.0), Point::new(5.0, 25.0))
        .expect("drag move");
    log.emit(json!({
        "test": name,
        "phase": "execute",
        "outcome": outcome_kind(&outcome),
        "cells": cells(&panel),
        "timestamp_ns": elapsed_ns(&start),
    }));
    assert_eq!(outcome.order(), Some(ids(&[2, 1, 3]).as_slice()));
    assert_eq!(panel.placement(a).map(|p| p.cell()), Some(MatrixCell::new(2, 0)));

    log.emit(json!({ "test": name, "phase": "verify", "pass": true }));
    log.flush(name);
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[test]
fn e2e_cancel_keeps_last_accepted_order() {
    let log = JsonlLog::new();
    let name = "cancel_keeps_last_accepted_order";

    let config = PanelConfig::new(10.0, 10.0);
    let items = (0..4).map(|i| FluidItem::new(i, 10.0, 10.0)).collect();
    let mut panel = composing_panel(config, items, Size::new(20.0, 100.0));
    let item = ItemId::new(3);
    assert!(panel.begin_drag(item, Point::default()));
    panel
        .drag_move(item, Point::default(), Point::new(1.0, 1.0))
        .expect("drag move");

    assert_eq!(panel.cancel_drag(), Some(item));
    let outcome = panel
        .drag_move(item, Point::default(), Point::new(15.0, 15.0))
        .expect("drag move");
    log.emit(json!({
        "test": name,
        "phase": "verify",
        "order": raw_order(&panel),
        "outcome": outcome_kind(&outcome),
    }));
    assert_eq!(outcome, DragOutcome::Unchanged);
    assert_eq!(raw_order(&panel), vec![3, 0, 1, 2]);
    log.flush(name);
}

#[test]
fn e2e_debugger_captures_drag_passes() {
    let log = JsonlLog::new();
    let name = "debugger_captures_drag_passes";

    let config = PanelConfig::new(10.0, 10.0);
    let items = (0..3).map(|i| FluidItem::new(i, 10.0, 10.0)).collect();
    let mut panel = composing_panel(config, items, Size::new(30.0, 100.0));
    let debugger = PackDebugger::new();
    debugger.set_enabled(true);
    panel.attach_debugger(debugger.clone());

    let item = ItemId::new(0);
    assert!(panel.begin_drag(item, Point::default()));
    panel
        .end_drag(item, Point::default(), Point::new(25.0, 5.0))
        .expect("end drag");

    let names: Vec<String> = debugger.snapshot().into_iter().map(|r| r.name).collect();
    log.emit(json!({
        "test": name,
        "phase": "verify",
        "passes": names,
        "report_bytes": debugger.report().len(),
    }));
    assert_eq!(names, vec!["drag".to_string(), "drag_end".to_string()]);
    log.flush(name);
}
