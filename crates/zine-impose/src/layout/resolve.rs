//! Layout resolution
//!
//! Turns a template plus the project's actual page count into the list of
//! printed sheet sides, each with its page slots. One function per format
//! behind a single `match`; every one returns the same shape.

use crate::model::{Format, PagePosition, Template};
use crate::types::{ExportError, Result};

use super::{
    Rect, SheetSide, SheetSideLayout, Slot, accordion_positions, booklet_order, flipbook_order,
    half_fold_positions, quarter_fold_positions, sheet_halves,
};

/// Resolve every printed sheet side for `template` with `page_count` pages.
///
/// Sides come back in output order: sheets ascending, front before back.
/// The function is pure: the same template and page count always give the
/// same result.
pub fn resolve(template: &Template, page_count: usize) -> Result<Vec<SheetSideLayout>> {
    let page_count = u32::try_from(page_count)
        .map_err(|_| ExportError::Config(format!("page count {page_count} is too large")))?;

    match &template.format {
        Format::QuarterFold => Ok(resolve_quarter_fold(template)),
        Format::HalfFold => Ok(resolve_half_fold(template)),
        Format::Accordion => Ok(resolve_accordion(template)),
        Format::Booklet => Ok(resolve_booklet(template, page_count)),
        Format::Flipbook => Ok(resolve_flipbook(template, page_count)),
        Format::TriFold | Format::Other(_) => {
            Err(ExportError::UnknownFormat(template.format.to_string()))
        }
    }
}

// =============================================================================
// Fixed Single-Sheet Formats
// =============================================================================

/// One sheet, one side; slot assignment comes from the template.
fn resolve_quarter_fold(template: &Template) -> Vec<SheetSideLayout> {
    let positions = stored_or_canonical(template, quarter_fold_positions);
    vec![SheetSideLayout::new(
        0,
        SheetSide::Front,
        positions.iter().map(slot_from_position).collect(),
    )]
}

/// One sheet, two sides, split by the positions' side tags.
fn resolve_half_fold(template: &Template) -> Vec<SheetSideLayout> {
    let positions = stored_or_canonical(template, half_fold_positions);
    [SheetSide::Front, SheetSide::Back]
        .into_iter()
        .map(|side| {
            let slots = positions
                .iter()
                .filter(|p| p.effective_side() == side)
                .map(slot_from_position)
                .collect();
            SheetSideLayout::new(0, side, slots)
        })
        .collect()
}

/// One sheet, one side, sixteen slots.
fn resolve_accordion(template: &Template) -> Vec<SheetSideLayout> {
    let positions = stored_or_canonical(template, accordion_positions);
    vec![SheetSideLayout::new(
        0,
        SheetSide::Front,
        positions.iter().map(slot_from_position).collect(),
    )]
}

/// Template positions, or the format's generated grid when the template has none.
fn stored_or_canonical(
    template: &Template,
    canonical: fn(f32, f32) -> Vec<PagePosition>,
) -> Vec<PagePosition> {
    if template.print_layout.page_positions.is_empty() {
        log::debug!(
            "template {} has no page positions, using the {} grid",
            template.id,
            template.format
        );
        let (w, h) = template.sheet_size();
        canonical(w, h)
    } else {
        template.print_layout.page_positions.clone()
    }
}

fn slot_from_position(position: &PagePosition) -> Slot {
    Slot {
        page_number: position.page_number,
        rect: Rect::new(position.x, position.y, position.width, position.height),
        rotation: position.rotation,
        mirrored: position.is_flipped,
    }
}

// =============================================================================
// Multi-Sheet Formats
// =============================================================================

/// Saddle-stitch sheets computed from the actual page count.
fn resolve_booklet(template: &Template, page_count: u32) -> Vec<SheetSideLayout> {
    if page_count % 4 != 0 {
        log::warn!(
            "booklet {} has {} pages, not a multiple of 4; some cells will repeat or stay blank",
            template.id,
            page_count
        );
    }

    let (w, h) = template.sheet_size();
    let (left, right) = sheet_halves(w, h);

    booklet_order(page_count)
        .into_iter()
        .enumerate()
        .flat_map(|(i, sheet)| {
            [
                SheetSideLayout::new(
                    i,
                    SheetSide::Front,
                    vec![
                        Slot::new(sheet.front.0, left, 0.0),
                        Slot::new(sheet.front.1, right, 0.0),
                    ],
                ),
                SheetSideLayout::new(
                    i,
                    SheetSide::Back,
                    vec![
                        Slot::new(sheet.back.0, left, 0.0),
                        Slot::new(sheet.back.1, right, 0.0),
                    ],
                ),
            ]
        })
        .collect()
}

/// Two pages per side; slot geometry from the template's first two front
/// and first two back positions.
fn resolve_flipbook(template: &Template, page_count: u32) -> Vec<SheetSideLayout> {
    let (w, h) = template.sheet_size();
    let (left, right) = sheet_halves(w, h);
    let slot_pair = |side: SheetSide| -> [Slot; 2] {
        let mut stored = template.positions_on(side).map(slot_from_position);
        let first = stored.next().unwrap_or_else(|| Slot::new(0, left, 0.0));
        let second = stored.next().unwrap_or_else(|| Slot::new(0, right, 0.0));
        [first, second]
    };
    let front_geometry = slot_pair(SheetSide::Front);
    let back_geometry = slot_pair(SheetSide::Back);

    let numbered = |geometry: &[Slot; 2], pages: (u32, u32)| -> Vec<Slot> {
        [(&geometry[0], pages.0), (&geometry[1], pages.1)]
            .into_iter()
            .filter(|(_, page)| *page <= page_count)
            .map(|(slot, page)| Slot {
                page_number: page,
                ..slot.clone()
            })
            .collect()
    };

    let mut sides = Vec::new();
    for (i, sheet) in flipbook_order(page_count).into_iter().enumerate() {
        sides.push(SheetSideLayout::new(
            i,
            SheetSide::Front,
            numbered(&front_geometry, sheet.front),
        ));
        let back = numbered(&back_geometry, sheet.back);
        if !back.is_empty() {
            sides.push(SheetSideLayout::new(i, SheetSide::Back, back));
        }
    }
    sides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PrintLayout;
    use crate::types::{Orientation, PageSize};

    fn template(format: Format, positions: Vec<PagePosition>) -> Template {
        Template {
            id: "t".into(),
            name: "t".into(),
            format,
            page_size: PageSize::Letter,
            orientation: Orientation::Landscape,
            page_count: 8,
            description: String::new(),
            fold_instructions: String::new(),
            print_layout: PrintLayout {
                sheet_width: 792.0,
                sheet_height: 612.0,
                page_positions: positions,
            },
            page_canvas: None,
        }
    }

    #[test]
    fn test_quarter_fold_uses_template_positions() {
        let mut positions = quarter_fold_positions(792.0, 612.0);
        positions[0].page_number = 0;
        let sides = resolve(&template(Format::QuarterFold, positions), 8).unwrap();
        assert_eq!(sides.len(), 1);
        assert_eq!(sides[0].page_numbers(), vec![0, 3, 2, 7, 5, 6, 8, 1]);
        assert!(sides[0].slots[0].is_blank_filler());
    }

    #[test]
    fn test_quarter_fold_falls_back_to_canonical_grid() {
        let sides = resolve(&template(Format::QuarterFold, Vec::new()), 8).unwrap();
        assert_eq!(sides[0].page_numbers(), vec![4, 3, 2, 7, 5, 6, 8, 1]);
    }

    #[test]
    fn test_quarter_fold_ignores_project_page_count() {
        let positions = quarter_fold_positions(792.0, 612.0);
        let t = template(Format::QuarterFold, positions);
        assert_eq!(resolve(&t, 3).unwrap(), resolve(&t, 8).unwrap());
    }

    #[test]
    fn test_flipped_position_is_mirrored_slot() {
        let mut positions = half_fold_positions(792.0, 612.0);
        positions[1].is_flipped = true;
        let sides = resolve(&template(Format::HalfFold, positions), 4).unwrap();
        assert!(!sides[0].slots[0].mirrored);
        assert!(sides[0].slots[1].mirrored);
    }

    #[test]
    fn test_booklet_halves() {
        let sides = resolve(&template(Format::Booklet, Vec::new()), 4).unwrap();
        assert_eq!(sides.len(), 2);
        assert_eq!(sides[0].slots[0].rect, Rect::new(0.0, 0.0, 396.0, 612.0));
        assert_eq!(sides[0].slots[1].rect, Rect::new(396.0, 0.0, 396.0, 612.0));
        assert_eq!(sides[0].page_numbers(), vec![4, 1]);
        assert_eq!(sides[1].page_numbers(), vec![2, 3]);
    }

    #[test]
    fn test_tri_fold_has_no_rule() {
        let err = resolve(&template(Format::TriFold, Vec::new()), 6).unwrap_err();
        assert!(matches!(err, ExportError::UnknownFormat(ref f) if f == "tri-fold"));
    }
}
