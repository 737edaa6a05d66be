//! Page ordering for multi-sheet formats
//!
//! Booklet and flipbook layouts are not stored in the template: the number
//! of sheets depends on how many pages the project actually has, so the
//! page order is computed here on demand.
//!
//! **Booklet (saddle stitch, T pages):**
//! - Sheet i front: [T − 2i, 1 + 2i]
//! - Sheet i back: [2 + 2i, T − 1 − 2i]
//! - Sheet 0 is outermost; no blank padding
//!
//! **Flipbook (T pages):**
//! - Sheet i front: [2i + 2, 2i + 1]
//! - Sheet i back: [2i + 3, 2i + 4]
//! - Pages beyond T are dropped, never padded

/// Page numbers for one sheet: (front left, front right), (back left, back right)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetPages {
    pub front: (u32, u32),
    pub back: (u32, u32),
}

/// Number of booklet sheets for `total_pages` (four pages per sheet)
pub fn booklet_sheet_count(total_pages: u32) -> u32 {
    total_pages.div_ceil(4)
}

/// Number of flipbook sheets for `total_pages` (two pages per sheet)
pub fn flipbook_sheet_count(total_pages: u32) -> u32 {
    total_pages.div_ceil(2)
}

/// Saddle-stitch page order for every sheet, outermost first.
///
/// ```text
/// 8 pages:  sheet 0  front [8 | 1]  back [2 | 7]
///           sheet 1  front [6 | 3]  back [4 | 5]
/// ```
pub fn booklet_order(total_pages: u32) -> Vec<SheetPages> {
    // Within the sheet count every term stays >= 0: T - 1 - 2i >= (T - 1) / 2.
    let t = total_pages as i64;
    (0..booklet_sheet_count(total_pages) as i64)
        .map(|i| SheetPages {
            front: (clamp_page(t - 2 * i), clamp_page(1 + 2 * i)),
            back: (clamp_page(2 + 2 * i), clamp_page(t - 1 - 2 * i)),
        })
        .collect()
}

/// Flipbook page order for every sheet, before pruning pages beyond the count.
pub fn flipbook_order(total_pages: u32) -> Vec<SheetPages> {
    (0..flipbook_sheet_count(total_pages))
        .map(|i| SheetPages {
            front: (2 * i + 2, 2 * i + 1),
            back: (2 * i + 3, 2 * i + 4),
        })
        .collect()
}

fn clamp_page(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}
