use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::POINTS_PER_INCH;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No imposition rule for format '{0}'")]
    UnknownFormat(String),
    #[error("Template '{0}' is not available")]
    MissingTemplate(String),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Portrait: height >= width
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

impl Orientation {
    /// Derive the orientation of a sheet from its size in points.
    ///
    /// The comparison happens in inches so the rule reads the same as the
    /// physical sheet description; a square sheet is portrait.
    pub fn from_points(width_pt: f32, height_pt: f32) -> Self {
        let width_in = width_pt / POINTS_PER_INCH;
        let height_in = height_pt / POINTS_PER_INCH;
        if width_in > height_in {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Nominal page sizes a template can be designed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    Letter,
    A4,
    Legal,
    Tabloid,
}

impl PageSize {
    /// Portrait dimensions in points (72 per inch)
    pub fn dimensions_pt(self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
        }
    }

    /// Dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_pt();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// A problem with a single element that was dropped from the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// The asset provider had nothing stored under this id
    AssetNotFound { asset_id: u64 },
    /// The image source could not be read or decoded
    AssetLoadFailed { source: String, reason: String },
    /// No font could be resolved for a text element
    FontUnavailable { family: String },
}

/// Element-local export problem; the rest of the sheet still renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportWarning {
    /// Page the element belongs to
    pub page_number: u32,
    /// Offending content item, `None` for page-level elements (background image)
    pub content_id: Option<String>,
    pub kind: WarningKind,
}

impl ExportWarning {
    pub fn is_asset_not_found(&self) -> bool {
        matches!(self.kind, WarningKind::AssetNotFound { .. })
    }
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {}", self.page_number)?;
        if let Some(id) = &self.content_id {
            write!(f, " ({id})")?;
        }
        match &self.kind {
            WarningKind::AssetNotFound { asset_id } => write!(f, ": asset {asset_id} not found"),
            WarningKind::AssetLoadFailed { source, reason } => {
                write!(f, ": failed to load image '{source}': {reason}")
            }
            WarningKind::FontUnavailable { family } => {
                write!(f, ": no font available for '{family}'")
            }
        }
    }
}
