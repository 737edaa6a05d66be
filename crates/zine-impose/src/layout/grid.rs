//! Canonical sheet grids
//!
//! The fixed-layout formats (quarter-fold, half-fold, accordion) place
//! pages on a regular grid of equally sized cells. These helpers generate
//! those grids for any sheet size; the template catalog is built from them
//! and the resolver falls back to them when a template ships no positions.

use crate::model::PagePosition;

use super::{Rect, SheetSide};

// =============================================================================
// Cell Geometry
// =============================================================================

/// Bounds of the cell at (row, col) in a `cols` × `rows` grid covering the sheet.
pub fn cell_bounds(
    sheet_width: f32,
    sheet_height: f32,
    cols: usize,
    rows: usize,
    row: usize,
    col: usize,
) -> Rect {
    let cell_width = sheet_width / cols as f32;
    let cell_height = sheet_height / rows as f32;
    Rect::new(
        col as f32 * cell_width,
        row as f32 * cell_height,
        cell_width,
        cell_height,
    )
}

/// Left and right halves of a sheet, full height
pub fn sheet_halves(sheet_width: f32, sheet_height: f32) -> (Rect, Rect) {
    (
        cell_bounds(sheet_width, sheet_height, 2, 1, 0, 0),
        cell_bounds(sheet_width, sheet_height, 2, 1, 0, 1),
    )
}

/// Build positions for a grid from a row-major page table.
///
/// `rows_pages[r]` lists the page numbers of row `r` left to right;
/// `rotated_rows[r]` says whether that row is printed upside down.
fn grid_positions(
    sheet_width: f32,
    sheet_height: f32,
    rows_pages: &[&[u32]],
    rotated_rows: &[bool],
    side: SheetSide,
) -> Vec<PagePosition> {
    let rows = rows_pages.len();
    let mut positions = Vec::new();
    for (row, pages) in rows_pages.iter().enumerate() {
        let cols = pages.len();
        let rotation = if rotated_rows[row] { 180.0 } else { 0.0 };
        for (col, &page_number) in pages.iter().enumerate() {
            let cell = cell_bounds(sheet_width, sheet_height, cols, rows, row, col);
            positions.push(
                PagePosition::new(page_number, cell.x, cell.y, cell.width, cell.height, rotation)
                    .on_side(side),
            );
        }
    }
    positions
}

// =============================================================================
// Format Grids
// =============================================================================

/// Classic 8-page single-sheet zine.
///
/// ```text
/// ┌────┬────┬────┬────┐
/// │ 4↓ │ 3↓ │ 2↓ │ 7↓ │   top row upside down
/// ├────┼────┼────┼────┤
/// │ 5  │ 6  │ 8  │ 1  │   back cover and front cover adjacent
/// └────┴────┴────┴────┘
/// ```
pub fn quarter_fold_positions(sheet_width: f32, sheet_height: f32) -> Vec<PagePosition> {
    grid_positions(
        sheet_width,
        sheet_height,
        &[&[4, 3, 2, 7], &[5, 6, 8, 1]],
        &[true, false],
        SheetSide::Front,
    )
}

/// Duplex sheet folded once: front `[4, 1]`, back `[2, 3]`.
pub fn half_fold_positions(sheet_width: f32, sheet_height: f32) -> Vec<PagePosition> {
    let mut positions = grid_positions(
        sheet_width,
        sheet_height,
        &[&[4, 1]],
        &[false],
        SheetSide::Front,
    );
    positions.extend(grid_positions(
        sheet_width,
        sheet_height,
        &[&[2, 3]],
        &[false],
        SheetSide::Back,
    ));
    positions
}

/// Sixteen-page snake: rows alternate upside down so reading stays
/// continuous after the three slits and the accordion folds.
///
/// ```text
///  4↓  3↓  2↓  1↓
///  5   6   7   8
/// 12↓ 11↓ 10↓  9↓
/// 13  14  15  16
/// ```
pub fn accordion_positions(sheet_width: f32, sheet_height: f32) -> Vec<PagePosition> {
    grid_positions(
        sheet_width,
        sheet_height,
        &[
            &[4, 3, 2, 1],
            &[5, 6, 7, 8],
            &[12, 11, 10, 9],
            &[13, 14, 15, 16],
        ],
        &[true, false, true, false],
        SheetSide::Front,
    )
}

/// Flipbook slot geometry: both sides split into halves.
///
/// Page numbers here are only the first sheet's; the resolver renumbers
/// every sheet from the page count.
pub fn flipbook_positions(sheet_width: f32, sheet_height: f32) -> Vec<PagePosition> {
    let mut positions = grid_positions(
        sheet_width,
        sheet_height,
        &[&[2, 1]],
        &[false],
        SheetSide::Front,
    );
    positions.extend(grid_positions(
        sheet_width,
        sheet_height,
        &[&[3, 4]],
        &[false],
        SheetSide::Back,
    ));
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_bounds_cover_sheet() {
        let cell = cell_bounds(792.0, 612.0, 4, 2, 1, 3);
        assert_eq!(cell, Rect::new(594.0, 306.0, 198.0, 306.0));
        assert_eq!(cell.right(), 792.0);
        assert_eq!(cell.bottom(), 612.0);
    }

    #[test]
    fn test_quarter_fold_grid_matches_letter_catalog() {
        let positions = quarter_fold_positions(792.0, 612.0);
        let pages: Vec<u32> = positions.iter().map(|p| p.page_number).collect();
        assert_eq!(pages, vec![4, 3, 2, 7, 5, 6, 8, 1]);
        assert!(positions[..4].iter().all(|p| p.rotation == 180.0));
        assert!(positions[4..].iter().all(|p| p.rotation == 0.0));
        assert_eq!(positions[7].x, 594.0);
        assert_eq!(positions[7].y, 306.0);
    }

    #[test]
    fn test_accordion_rows_alternate_rotation() {
        let positions = accordion_positions(612.0, 792.0);
        assert_eq!(positions.len(), 16);
        for (i, pos) in positions.iter().enumerate() {
            let row = i / 4;
            let expected = if row % 2 == 0 { 180.0 } else { 0.0 };
            assert_eq!(pos.rotation, expected, "slot {}", i);
            assert_eq!(pos.width, 153.0);
            assert_eq!(pos.height, 198.0);
        }
    }

    #[test]
    fn test_half_fold_sides() {
        let positions = half_fold_positions(792.0, 612.0);
        let front: Vec<u32> = positions
            .iter()
            .filter(|p| p.effective_side() == SheetSide::Front)
            .map(|p| p.page_number)
            .collect();
        let back: Vec<u32> = positions
            .iter()
            .filter(|p| p.effective_side() == SheetSide::Back)
            .map(|p| p.page_number)
            .collect();
        assert_eq!(front, vec![4, 1]);
        assert_eq!(back, vec![2, 3]);
    }
}
