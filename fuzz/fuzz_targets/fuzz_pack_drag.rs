#![no_main]

use arbitrary::Arbitrary;
use fluidwrap_layout::{
    DragOutcome, FluidItem, FluidWrapPanel, ItemId, Orientation, PackResult, PanelConfig, Point,
    Size,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    vertical: bool,
    optimize: bool,
    cells_per_line: u8,
    items: Vec<(u8, u8)>,
    steps: Vec<Step>,
}

#[derive(Debug, Arbitrary)]
enum Step {
    Begin { item: u8, dx: u8, dy: u8 },
    Move { x: i16, y: i16 },
    End { x: i16, y: i16 },
    Cancel,
    Resize { cells_per_line: u8 },
}

const CELL: f64 = 8.0;

fuzz_target!(|input: Input| {
    let orientation = if input.vertical {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    };
    let config = PanelConfig::new(CELL, CELL)
        .orientation(orientation)
        .optimize_child_placement(input.optimize);

    // Footprints 1..=6 cells, at most 48 items.
    let items: Vec<FluidItem> = input
        .items
        .iter()
        .take(48)
        .enumerate()
        .map(|(i, &(w, h))| {
            let w = f64::from(w % 6 + 1) * CELL;
            let h = f64::from(h % 6 + 1) * CELL;
            FluidItem::new(i as u64, w, h)
        })
        .collect();
    let count = items.len();

    let mut panel = FluidWrapPanel::new(config).expect("valid config");
    panel.set_items(items).expect("items within region limit");
    panel
        .measure(available(input.cells_per_line, orientation))
        .expect("measure never fails");
    panel.set_composing(true);
    check(panel.layout(), count);

    let mut active: Option<(ItemId, Point)> = None;
    for step in input.steps.iter().take(64) {
        match *step {
            Step::Begin { item, dx, dy } => {
                if count == 0 {
                    continue;
                }
                let id = ItemId::new(u64::from(item) % count as u64);
                let offset = Point::new(f64::from(dx % 48), f64::from(dy % 48));
                let started = panel.begin_drag(id, offset);
                assert_eq!(started, active.is_none());
                if started {
                    active = Some((id, offset));
                }
            }
            Step::Move { x, y } => {
                let Some((id, offset)) = active else { continue };
                let before = panel.layout().clone();
                let pointer = Point::new(f64::from(x), f64::from(y));
                let outcome = panel.drag_move(id, offset, pointer).expect("drag move");
                if let DragOutcome::Unchanged | DragOutcome::Rejected = outcome {
                    assert_eq!(panel.layout(), &before, "no-op move changed layout");
                }
            }
            Step::End { x, y } => {
                let Some((id, offset)) = active.take() else { continue };
                let pointer = Point::new(f64::from(x), f64::from(y));
                panel.end_drag(id, offset, pointer).expect("end drag");
                assert!(!panel.is_dragging());
            }
            Step::Cancel => {
                assert_eq!(panel.cancel_drag(), active.take().map(|(id, _)| id));
            }
            Step::Resize { cells_per_line } => {
                panel
                    .measure(available(cells_per_line, orientation))
                    .expect("measure never fails");
            }
        }
        check(panel.layout(), count);
    }
});

fn available(cells_per_line: u8, orientation: Orientation) -> Size {
    let extent = f64::from(cells_per_line % 16 + 1) * CELL;
    match orientation {
        Orientation::Horizontal => Size::new(extent, f64::INFINITY),
        Orientation::Vertical => Size::new(f64::INFINITY, extent),
    }
}

fn check(result: &PackResult, count: usize) {
    assert_eq!(result.len(), count, "items lost or duplicated");
    let matrix = result.matrix_size();
    let placements = result.placements();
    for (i, a) in placements.iter().enumerate() {
        assert!(a.rect.right() <= matrix.width, "placement escapes matrix width");
        assert!(a.rect.bottom() <= matrix.height, "placement escapes matrix height");
        for b in &placements[i + 1..] {
            assert!(!a.rect.intersects(&b.rect), "placements overlap");
        }
    }
}
