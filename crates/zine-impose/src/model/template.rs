use serde::{Deserialize, Serialize};
use std::fmt;

use crate::layout::SheetSide;
use crate::types::{Orientation, PageSize};

/// Binding/fold topology of a zine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Format {
    /// Eight pages from one sheet, folded twice with a center slit
    QuarterFold,
    /// Four pages, one duplex sheet folded once
    HalfFold,
    /// Three panels per side, letter-fold
    TriFold,
    /// Saddle-stitched signatures
    Booklet,
    /// Duplex sheets with two pages per side, cut apart
    Flipbook,
    /// Sixteen pages from one sheet, cut and folded in a snake
    Accordion,
    /// A format string this build has no rule for
    Other(String),
}

impl Format {
    pub fn as_str(&self) -> &str {
        match self {
            Format::QuarterFold => "quarter-fold",
            Format::HalfFold => "half-fold",
            Format::TriFold => "tri-fold",
            Format::Booklet => "booklet",
            Format::Flipbook => "flipbook",
            Format::Accordion => "accordion",
            Format::Other(name) => name,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "quarter-fold" => Format::QuarterFold,
            "half-fold" => Format::HalfFold,
            "tri-fold" => Format::TriFold,
            "booklet" => Format::Booklet,
            "flipbook" => Format::Flipbook,
            "accordion" => Format::Accordion,
            other => Format::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Unknown format strings must survive a load so that export can report them
// as `UnknownFormat` instead of failing to parse the whole project.
impl Serialize for Format {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Format {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Format::parse(&s))
    }
}

/// Where one logical page lands on the physical sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePosition {
    /// Logical page number; 0 marks a guaranteed-blank cell
    pub page_number: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation in degrees about the slot center
    pub rotation: f32,
    /// Horizontal mirror
    #[serde(default)]
    pub is_flipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<SheetSide>,
}

impl PagePosition {
    pub fn new(page_number: u32, x: f32, y: f32, width: f32, height: f32, rotation: f32) -> Self {
        Self {
            page_number,
            x,
            y,
            width,
            height,
            rotation,
            is_flipped: false,
            side: Some(SheetSide::Front),
        }
    }

    pub fn on_side(mut self, side: SheetSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Side this position prints on; untagged positions are front-side.
    pub fn effective_side(&self) -> SheetSide {
        self.side.unwrap_or(SheetSide::Front)
    }
}

/// Physical sheet and the page positions printed on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintLayout {
    /// Sheet width in points
    pub sheet_width: f32,
    /// Sheet height in points
    pub sheet_height: f32,
    #[serde(default)]
    pub page_positions: Vec<PagePosition>,
}

/// Editor canvas size of one logical page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageCanvas {
    pub width: f32,
    pub height: f32,
}

/// A reusable zine layout from the template catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub format: Format,
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub page_count: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fold_instructions: String,
    pub print_layout: PrintLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_canvas: Option<PageCanvas>,
}

impl Template {
    /// Sheet size in points as (width, height)
    pub fn sheet_size(&self) -> (f32, f32) {
        (self.print_layout.sheet_width, self.print_layout.sheet_height)
    }

    /// Positions printed on the given side, in layout order
    pub fn positions_on(&self, side: SheetSide) -> impl Iterator<Item = &PagePosition> {
        self.print_layout
            .page_positions
            .iter()
            .filter(move |p| p.effective_side() == side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_round_trips_known_and_unknown_names() {
        for name in [
            "quarter-fold",
            "half-fold",
            "tri-fold",
            "booklet",
            "flipbook",
            "accordion",
        ] {
            assert_eq!(Format::parse(name).as_str(), name);
        }

        let json = serde_json::to_string(&Format::Other("perfect-bound".into())).unwrap();
        assert_eq!(json, "\"perfect-bound\"");
        let parsed: Format = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Format::Other("perfect-bound".into()));
    }

    #[test]
    fn test_page_position_defaults() {
        let pos: PagePosition = serde_json::from_str(
            r#"{"pageNumber":3,"x":0,"y":0,"width":10,"height":20,"rotation":0}"#,
        )
        .unwrap();
        assert!(!pos.is_flipped);
        assert_eq!(pos.side, None);
        assert_eq!(pos.effective_side(), SheetSide::Front);
    }
}
