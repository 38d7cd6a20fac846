#![no_main]

use arbitrary::Arbitrary;
use fluidwrap_layout::{BitMatrix, MatrixCell, Orientation};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    vertical: bool,
    rows: u8,
    columns: u8,
    regions: Vec<(u8, u8, u8)>,
}

fuzz_target!(|input: Input| {
    let orientation = if input.vertical {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    };
    let rows = usize::from(input.rows % 24) + 1;
    let columns = usize::from(input.columns % 130) + 1;
    let mut matrix = BitMatrix::new(rows, columns, orientation);
    let mut shadow = vec![vec![false; columns]; rows];

    for &(start, w, h) in input.regions.iter().take(128) {
        let width = usize::from(w % 8) + 1;
        let height = usize::from(h % 8) + 1;
        let start = usize::from(start) % 32;

        let Some(cell) = matrix.try_find_region(start, width, height) else {
            continue;
        };
        assert!(cell.row + height <= rows && cell.col + width <= columns);
        for r in cell.row..cell.row + height {
            for c in cell.col..cell.col + width {
                assert!(!shadow[r][c], "found region overlaps occupied cell");
                shadow[r][c] = true;
            }
        }
        assert!(matrix.is_region_free(cell, width, height));
        matrix.set_region(cell, width, height);
        assert!(!matrix.is_region_free(cell, width, height));
    }

    let mut occupied = 0;
    for (r, line) in shadow.iter().enumerate() {
        for (c, &bit) in line.iter().enumerate() {
            assert_eq!(matrix.is_occupied(r, c), bit);
            occupied += usize::from(bit);
        }
    }
    assert_eq!(matrix.occupied_count(), occupied);
    assert_eq!(matrix.rows(), rows);
    assert_eq!(matrix.columns(), columns);

    matrix.reset();
    assert_eq!(matrix.occupied_count(), 0);
    assert!(matrix.is_region_free(MatrixCell::new(0, 0), columns, rows));
});
