//! Fold and cut guides drawn over imposed sheets
//!
//! Guides are plain line primitives in sheet points. They are computed from
//! the format and sheet size only and drawn after all page content.

use crate::constants::*;
use crate::model::Format;
use crate::options::ExportOptions;
use crate::scene::{Node, StrokeStyle};

/// What a guide line tells the person finishing the print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideKind {
    /// Dashed fold line
    Fold,
    /// Slit to cut along
    Cut,
    /// Short bar marking where a slit starts or ends
    Notch,
    /// L-shaped trim mark at a sheet corner
    CropMark,
}

/// One guide polyline
#[derive(Debug, Clone, PartialEq)]
pub struct GuideLine {
    pub kind: GuideKind,
    pub points: Vec<(f32, f32)>,
    pub stroke: StrokeStyle,
}

impl GuideLine {
    fn fold(from: (f32, f32), to: (f32, f32)) -> Self {
        Self {
            kind: GuideKind::Fold,
            points: vec![from, to],
            stroke: StrokeStyle::solid(FOLD_LINE_COLOR, FOLD_LINE_WIDTH).dashed(&FOLD_LINE_DASH),
        }
    }

    fn cut(from: (f32, f32), to: (f32, f32), width: f32) -> Self {
        Self {
            kind: GuideKind::Cut,
            points: vec![from, to],
            stroke: StrokeStyle::solid(CUT_LINE_COLOR, width),
        }
    }

    fn notch(x: f32, y: f32) -> Self {
        Self {
            kind: GuideKind::Notch,
            points: vec![(x, y - NOTCH_HALF_LENGTH), (x, y + NOTCH_HALF_LENGTH)],
            stroke: StrokeStyle::solid(CUT_LINE_COLOR, NOTCH_LINE_WIDTH),
        }
    }

    fn crop(points: [(f32, f32); 3]) -> Self {
        Self {
            kind: GuideKind::CropMark,
            points: points.to_vec(),
            stroke: StrokeStyle::solid(CUT_LINE_COLOR, CUT_LINE_WIDTH),
        }
    }

    pub fn into_node(self) -> Node {
        Node::Polyline {
            points: self.points,
            tension: 0.0,
            stroke: self.stroke,
        }
    }
}

/// Which guide families to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuideOptions {
    pub fold_marks: bool,
    pub cut_marks: bool,
}

impl From<&ExportOptions> for GuideOptions {
    fn from(options: &ExportOptions) -> Self {
        Self {
            fold_marks: options.show_fold_marks,
            cut_marks: options.show_cut_marks,
        }
    }
}

/// All enabled guides for a sheet, fold lines first.
pub fn guides(
    format: &Format,
    sheet_width: f32,
    sheet_height: f32,
    options: &GuideOptions,
) -> Vec<GuideLine> {
    let mut lines = Vec::new();
    if options.fold_marks {
        lines.extend(fold_lines(format, sheet_width, sheet_height));
    }
    if options.cut_marks {
        lines.extend(cut_lines(format, sheet_width, sheet_height));
    }
    lines
}

/// Dashed fold lines for a format; flipbooks are cut, not folded.
pub fn fold_lines(format: &Format, w: f32, h: f32) -> Vec<GuideLine> {
    let vertical = |x: f32| GuideLine::fold((x, 0.0), (x, h));
    match format {
        Format::QuarterFold => vec![
            vertical(w / 4.0),
            vertical(w / 2.0),
            vertical(w * 3.0 / 4.0),
            GuideLine::fold((0.0, h / 2.0), (w, h / 2.0)),
        ],
        Format::HalfFold | Format::Booklet => vec![vertical(w / 2.0)],
        Format::Accordion => vec![vertical(w / 4.0), vertical(w / 2.0), vertical(w * 3.0 / 4.0)],
        Format::Flipbook | Format::TriFold | Format::Other(_) => Vec::new(),
    }
}

/// Cut guides: the center slit, the accordion meander slits, or corner
/// crop marks for everything else.
pub fn cut_lines(format: &Format, w: f32, h: f32) -> Vec<GuideLine> {
    match format {
        Format::QuarterFold => {
            let y = h / 2.0;
            vec![GuideLine::cut((w / 4.0, y), (w * 3.0 / 4.0, y), CUT_LINE_WIDTH)]
        }
        Format::Accordion => accordion_slits(w, h),
        _ => crop_marks(w, h),
    }
}

/// Three partial slits alternating from the left and right edges, each
/// with a notch at both ends.
fn accordion_slits(w: f32, h: f32) -> Vec<GuideLine> {
    let slits = [
        (h / 4.0, 0.0, w * 3.0 / 4.0),
        (h / 2.0, w, w / 4.0),
        (h * 3.0 / 4.0, 0.0, w * 3.0 / 4.0),
    ];
    let mut lines = Vec::with_capacity(slits.len() * 3);
    for (y, x_start, x_end) in slits {
        lines.push(GuideLine::cut((x_start, y), (x_end, y), SLIT_LINE_WIDTH));
        lines.push(GuideLine::notch(x_start, y));
        lines.push(GuideLine::notch(x_end, y));
    }
    lines
}

/// L-shaped marks inset from each sheet corner
fn crop_marks(w: f32, h: f32) -> Vec<GuideLine> {
    let m = CROP_MARK_MARGIN;
    let len = CROP_MARK_LENGTH;
    vec![
        GuideLine::crop([(m, m + len), (m, m), (m + len, m)]),
        GuideLine::crop([(w - m, m + len), (w - m, m), (w - m - len, m)]),
        GuideLine::crop([(m, h - m - len), (m, h - m), (m + len, h - m)]),
        GuideLine::crop([(w - m, h - m - len), (w - m, h - m), (w - m - len, h - m)]),
    ]
}
