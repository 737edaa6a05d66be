//! Layout data types for imposition
//!
//! These types are the resolver's output: where every logical page lands
//! on every printed side of every sheet.

use serde::{Deserialize, Serialize};

/// Which physical side of the printed sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetSide {
    /// Front of the sheet (printed first in duplex)
    Front,
    /// Back of the sheet (printed second in duplex)
    Back,
}

/// A rectangular area in points, y growing downwards
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X position (left edge)
    pub x: f32,
    /// Y position (top edge)
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge y coordinate
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// One logical page placed on a sheet side
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Logical page number; 0 is a blank filler cell
    pub page_number: u32,
    /// Slot bounds on the sheet in points
    pub rect: Rect,
    /// Rotation in degrees about the slot center
    pub rotation: f32,
    /// Horizontal mirror about the slot's own width axis
    pub mirrored: bool,
}

impl Slot {
    pub fn new(page_number: u32, rect: Rect, rotation: f32) -> Self {
        Self {
            page_number,
            rect,
            rotation,
            mirrored: false,
        }
    }

    pub fn is_blank_filler(&self) -> bool {
        self.page_number == 0
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation.rem_euclid(360.0).abs() > 0.1
    }
}

/// Everything printed on one side of one physical sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSideLayout {
    /// 0-based physical sheet index
    pub sheet_index: usize,
    pub side: SheetSide,
    pub slots: Vec<Slot>,
}

impl SheetSideLayout {
    pub fn new(sheet_index: usize, side: SheetSide, slots: Vec<Slot>) -> Self {
        Self {
            sheet_index,
            side,
            slots,
        }
    }

    /// Page numbers in slot order, including blank fillers
    pub fn page_numbers(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.page_number).collect()
    }
}
