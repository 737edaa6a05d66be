//! Backend-neutral scene graph
//!
//! The compositor produces a [`Scene`] per sheet side; a
//! [`Canvas`](crate::raster::Canvas) implementation turns it into pixels.
//! Coordinates are sheet points with y growing downwards.

use std::sync::Arc;

use crate::assets::DecodedImage;
use crate::color::Color;
use crate::fonts::FontData;
use crate::layout::Rect;
use crate::model::{LineCap, LineJoin, TextAlign, TextDecoration};

/// 2D affine transform: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Clockwise rotation in degrees (y-down), about the origin
    pub fn rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Rotation in degrees about `(cx, cy)`
    pub fn rotate_about(degrees: f32, cx: f32, cy: f32) -> Self {
        Self::translate(-cx, -cy)
            .then(Self::rotate(degrees))
            .then(Self::translate(cx, cy))
    }

    /// `self` followed by `next`
    pub fn then(self, next: Affine) -> Affine {
        Affine {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            e: next.a * self.e + next.c * self.f + next.e,
            f: next.b * self.e + next.d * self.f + next.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Stroke parameters
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
    pub dash: Option<Vec<f32>>,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl StrokeStyle {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
        }
    }

    pub fn dashed(mut self, dash: &[f32]) -> Self {
        self.dash = Some(dash.to_vec());
        self
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    /// Nothing would be drawn
    pub fn is_invisible(&self) -> bool {
        self.width <= 0.0 || self.color.is_transparent()
    }
}

/// Fill and stroke for a closed shape; either may be absent
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paint {
    pub fill: Option<Color>,
    pub stroke: Option<StrokeStyle>,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }
}

/// Font selection for a text run, already resolved to font data
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    /// Layout box; text wraps at its width when `wrap` is set
    pub bounds: Rect,
    pub font: Arc<FontData>,
    pub size: f32,
    pub color: Color,
    pub align: TextAlign,
    /// Multiple of the font size
    pub line_height: f32,
    pub decoration: TextDecoration,
    pub background: Option<Color>,
    pub padding: f32,
    pub wrap: bool,
}

/// A group with its own coordinate system, optional clip and opacity
#[derive(Debug, Clone)]
pub struct Group {
    /// Maps the group's local coordinates into its parent's
    pub transform: Affine,
    /// Clip rectangle in local coordinates
    pub clip: Option<Rect>,
    pub opacity: f32,
    pub children: Vec<Node>,
}

impl Group {
    pub fn new(transform: Affine) -> Self {
        Self {
            transform,
            clip: None,
            opacity: 1.0,
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Group(Group),
    Rect {
        rect: Rect,
        corner_radius: f32,
        paint: Paint,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        paint: Paint,
    },
    /// Closed polygon
    Polygon { points: Vec<(f32, f32)>, paint: Paint },
    /// Open polyline; `tension > 0` draws a smooth curve through the points
    Polyline {
        points: Vec<(f32, f32)>,
        tension: f32,
        stroke: StrokeStyle,
    },
    Text(TextRun),
    Image {
        image: DecodedImage,
        rect: Rect,
        opacity: f32,
    },
}

impl Node {
    pub fn line(from: (f32, f32), to: (f32, f32), stroke: StrokeStyle) -> Self {
        Node::Polyline {
            points: vec![from, to],
            tension: 0.0,
            stroke,
        }
    }
}

/// Everything drawn on one sheet side, back to front
#[derive(Debug, Clone)]
pub struct Scene {
    /// Sheet width in points
    pub width: f32,
    /// Sheet height in points
    pub height: f32,
    pub background: Color,
    pub nodes: Vec<Node>,
}

impl Scene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: Color::WHITE,
            nodes: Vec::new(),
        }
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }
}
