//! Built-in template catalog
//!
//! Templates are defined once and shared by every project bound to them.
//! Export looks the template up again by id through a [`TemplateProvider`]
//! so corrections made here reach projects created before them.

use crate::layout::{
    accordion_positions, flipbook_positions, half_fold_positions, quarter_fold_positions,
};
use crate::model::{Format, PageCanvas, PrintLayout, Template};
use crate::types::{Orientation, PageSize};

/// Source of the current template definitions
pub trait TemplateProvider {
    fn get_template(&self, id: &str) -> Option<Template>;
}

/// The fixed catalog shipped with the engine
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateCatalog {
    /// All built-in templates, US Letter at 72 points per inch
    pub fn builtin() -> Self {
        Self {
            templates: vec![
                quarter_fold_letter(),
                half_fold_letter(),
                accordion_16_letter(),
                booklet_half_letter_20(),
                flipbook_letter(),
            ],
        }
    }

    /// A catalog holding exactly the given templates
    pub fn from_templates(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn by_format(&self, format: &Format) -> Vec<&Template> {
        self.templates
            .iter()
            .filter(|t| &t.format == format)
            .collect()
    }

    pub fn by_page_size(&self, page_size: PageSize) -> Vec<&Template> {
        self.templates
            .iter()
            .filter(|t| t.page_size == page_size)
            .collect()
    }

    /// Replace the template with the same id, or add it
    pub fn upsert(&mut self, template: Template) {
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }
}

impl TemplateProvider for TemplateCatalog {
    fn get_template(&self, id: &str) -> Option<Template> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }
}

// =============================================================================
// Catalog Entries
// =============================================================================

const LETTER_LANDSCAPE: (f32, f32) = (792.0, 612.0);
const LETTER_PORTRAIT: (f32, f32) = (612.0, 792.0);

fn quarter_fold_letter() -> Template {
    let (w, h) = LETTER_LANDSCAPE;
    Template {
        id: "quarter-fold-letter".into(),
        name: "Quarter Fold Zine (Letter)".into(),
        format: Format::QuarterFold,
        page_size: PageSize::Letter,
        orientation: Orientation::Landscape,
        page_count: 8,
        description: "Classic 8-page zine made from a single letter-size sheet".into(),
        fold_instructions: "Fold in half hamburger-style, then in half again. Unfold once, \
                            cut the center slit, then fold into a booklet."
            .into(),
        print_layout: PrintLayout {
            sheet_width: w,
            sheet_height: h,
            page_positions: quarter_fold_positions(w, h),
        },
        page_canvas: Some(PageCanvas {
            width: w / 4.0,
            height: h / 2.0,
        }),
    }
}

fn half_fold_letter() -> Template {
    let (w, h) = LETTER_LANDSCAPE;
    Template {
        id: "half-fold-letter".into(),
        name: "Half Fold Zine (Letter)".into(),
        format: Format::HalfFold,
        page_size: PageSize::Letter,
        orientation: Orientation::Landscape,
        page_count: 4,
        description: "Simple 4-page zine made from a single letter-size sheet folded in half"
            .into(),
        fold_instructions: "Print double-sided, flipping on the long edge. Fold the sheet in half."
            .into(),
        print_layout: PrintLayout {
            sheet_width: w,
            sheet_height: h,
            page_positions: half_fold_positions(w, h),
        },
        page_canvas: None,
    }
}

fn accordion_16_letter() -> Template {
    let (w, h) = LETTER_PORTRAIT;
    Template {
        id: "accordion-16-letter".into(),
        name: "Accordion 16 (Letter)".into(),
        format: Format::Accordion,
        page_size: PageSize::Letter,
        orientation: Orientation::Landscape,
        page_count: 16,
        description: "16-page one-sheet accordion (single-sided) with three horizontal cuts."
            .into(),
        fold_instructions: "Print single-sided. Cut along the three horizontal lines, then \
                            accordion fold following the snake order."
            .into(),
        print_layout: PrintLayout {
            sheet_width: w,
            sheet_height: h,
            page_positions: accordion_positions(w, h),
        },
        page_canvas: Some(PageCanvas {
            width: w / 4.0,
            height: h / 4.0,
        }),
    }
}

/// Booklet positions are computed from the page count at export time.
fn booklet_half_letter_20() -> Template {
    let (w, h) = LETTER_LANDSCAPE;
    Template {
        id: "booklet-half-letter-20".into(),
        name: "Booklet (Half Letter, 20 pages)".into(),
        format: Format::Booklet,
        page_size: PageSize::Letter,
        orientation: Orientation::Landscape,
        page_count: 20,
        description: "Saddle-stitched half-letter booklet; front cover is page 1, back cover \
                      page 20."
            .into(),
        fold_instructions: "Print double-sided (flip on short edge). Fold and staple at the spine."
            .into(),
        print_layout: PrintLayout {
            sheet_width: w,
            sheet_height: h,
            page_positions: Vec::new(),
        },
        page_canvas: Some(PageCanvas {
            width: w / 2.0,
            height: h,
        }),
    }
}

fn flipbook_letter() -> Template {
    let (w, h) = LETTER_LANDSCAPE;
    Template {
        id: "flipbook-letter".into(),
        name: "Flipbook (Letter, 16 pages)".into(),
        format: Format::Flipbook,
        page_size: PageSize::Letter,
        orientation: Orientation::Landscape,
        page_count: 16,
        description: "Two half-letter pages per side; cut each sheet in half and stack.".into(),
        fold_instructions: "Print double-sided (flip on long edge). Cut along the center line \
                            and stack the halves in order."
            .into(),
        print_layout: PrintLayout {
            sheet_width: w,
            sheet_height: h,
            page_positions: flipbook_positions(w, h),
        },
        page_canvas: Some(PageCanvas {
            width: w / 2.0,
            height: h,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_are_unique() {
        let catalog = TemplateCatalog::builtin();
        let mut ids: Vec<&str> = catalog.templates().iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.templates().len());
    }

    #[test]
    fn test_lookup_by_id_and_format() {
        let catalog = TemplateCatalog::builtin();
        let t = catalog.get_template("half-fold-letter").unwrap();
        assert_eq!(t.format, Format::HalfFold);
        assert!(catalog.get_template("nope").is_none());
        assert_eq!(catalog.by_format(&Format::Booklet).len(), 1);
        assert_eq!(
            catalog.by_page_size(PageSize::Letter).len(),
            catalog.templates().len()
        );
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let mut catalog = TemplateCatalog::builtin();
        let mut t = catalog.get_template("quarter-fold-letter").unwrap();
        t.name = "Corrected".into();
        catalog.upsert(t);
        assert_eq!(
            catalog.get_template("quarter-fold-letter").unwrap().name,
            "Corrected"
        );
        assert_eq!(catalog.templates().len(), 5);
    }
}
