//! Shared constants for zine export
//!
//! This module centralizes magic numbers used by the guide generator,
//! compositor and rasterizer.

use crate::color::Color;

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per inch (PDF user space unit)
pub const POINTS_PER_INCH: f32 = 72.0;

/// Default raster scale factor (2× for high-DPI print)
pub const DEFAULT_PIXEL_RATIO: f32 = 2.0;

/// Upper bound for the raster scale factor
pub const MAX_PIXEL_RATIO: f32 = 16.0;

// =============================================================================
// Guides
// =============================================================================

/// Stroke color for fold guides
pub const FOLD_LINE_COLOR: Color = Color::rgb(0x9c, 0xa3, 0xaf);

/// Dash pattern for fold guides: 6pt dash, 4pt gap
pub const FOLD_LINE_DASH: [f32; 2] = [6.0, 4.0];

/// Line width for fold guides (points)
pub const FOLD_LINE_WIDTH: f32 = 2.0;

/// Stroke color for cut lines and crop marks
pub const CUT_LINE_COLOR: Color = Color::rgb(0x11, 0x18, 0x27);

/// Line width for the quarter-fold slit and crop marks (points)
pub const CUT_LINE_WIDTH: f32 = 2.0;

/// Line width for accordion slits (points)
pub const SLIT_LINE_WIDTH: f32 = 4.0;

/// Line width for accordion slit notches (points)
pub const NOTCH_LINE_WIDTH: f32 = 3.0;

/// Half length of an accordion slit notch (points)
pub const NOTCH_HALF_LENGTH: f32 = 12.0;

/// Offset of crop marks from the sheet corner (points)
pub const CROP_MARK_MARGIN: f32 = 18.0;

/// Arm length of a crop mark (points)
pub const CROP_MARK_LENGTH: f32 = 24.0;

// =============================================================================
// Page Numbers
// =============================================================================

/// Font size for page number labels (points)
pub const PAGE_NUMBER_FONT_SIZE: f32 = 12.0;

/// Label color for page numbers
pub const PAGE_NUMBER_COLOR: Color = Color::rgb(0x11, 0x18, 0x27);

/// Label anchor distance from the slot's right edge (points)
pub const PAGE_NUMBER_RIGHT_OFFSET: f32 = 20.0;

/// Label anchor distance from the slot's bottom edge (points)
pub const PAGE_NUMBER_BOTTOM_OFFSET: f32 = 18.0;

// =============================================================================
// Content Defaults
// =============================================================================

/// Background used for pages without a color and for blank filler slots
pub const DEFAULT_BACKGROUND: Color = Color::WHITE;

/// Curve tension used when a drawing has smoothing enabled
pub const SMOOTHING_TENSION: f32 = 0.5;

/// Control point factor for approximating circles with Bezier curves.
/// 4 * (sqrt(2) - 1) / 3 ≈ 0.552284749831
pub const BEZIER_CIRCLE_FACTOR: f32 = 0.552284749831;
