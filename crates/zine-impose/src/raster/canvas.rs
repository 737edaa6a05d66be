//! Drawing interface between the scene graph and a pixel backend

use image::RgbaImage;

use crate::color::Color;
use crate::layout::Rect;
use crate::scene::{Affine, Node, Paint, Scene, StrokeStyle, TextRun};

/// Immediate-mode drawing target for a [`Scene`].
///
/// Groups nest: every `push_group` is matched by a `pop_group`, and
/// drawing calls in between use the group's coordinate space, clip and
/// opacity.
pub trait Canvas {
    /// Fill the whole surface, ignoring transforms and clips
    fn clear(&mut self, color: Color);

    fn push_group(&mut self, transform: Affine, clip: Option<Rect>, opacity: f32);
    fn pop_group(&mut self);

    fn draw_rect(&mut self, rect: &Rect, corner_radius: f32, paint: &Paint);
    fn draw_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, paint: &Paint);
    fn draw_polygon(&mut self, points: &[(f32, f32)], paint: &Paint);
    fn draw_polyline(&mut self, points: &[(f32, f32)], tension: f32, stroke: &StrokeStyle);
    fn draw_text(&mut self, run: &TextRun);
    fn draw_image(&mut self, image: &RgbaImage, rect: &Rect, opacity: f32);
}

/// Clear to the scene background and draw every node back to front.
pub fn draw_scene<C: Canvas + ?Sized>(canvas: &mut C, scene: &Scene) {
    canvas.clear(scene.background);
    for node in &scene.nodes {
        draw_node(canvas, node);
    }
}

fn draw_node<C: Canvas + ?Sized>(canvas: &mut C, node: &Node) {
    match node {
        Node::Group(group) => {
            canvas.push_group(group.transform, group.clip, group.opacity);
            for child in &group.children {
                draw_node(canvas, child);
            }
            canvas.pop_group();
        }
        Node::Rect {
            rect,
            corner_radius,
            paint,
        } => canvas.draw_rect(rect, *corner_radius, paint),
        Node::Ellipse {
            cx,
            cy,
            rx,
            ry,
            paint,
        } => canvas.draw_ellipse(*cx, *cy, *rx, *ry, paint),
        Node::Polygon { points, paint } => canvas.draw_polygon(points, paint),
        Node::Polyline {
            points,
            tension,
            stroke,
        } => canvas.draw_polyline(points, *tension, stroke),
        Node::Text(run) => canvas.draw_text(run),
        Node::Image {
            image,
            rect,
            opacity,
        } => canvas.draw_image(image, rect, *opacity),
    }
}

/// Path segment of an open curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line((f32, f32)),
    Quad((f32, f32), (f32, f32)),
    Cubic((f32, f32), (f32, f32), (f32, f32)),
}

/// Segments of a polyline drawn through `points`, starting at `points[0]`.
///
/// With `tension > 0` and at least three points the line becomes a smooth
/// curve: each interior point gets two control points along the chord of
/// its neighbours, scaled by `tension` and the adjacent segment lengths.
/// The first and last spans are quadratic, the ones between cubic.
pub fn curve_segments(points: &[(f32, f32)], tension: f32) -> Vec<Segment> {
    if points.len() < 2 {
        return Vec::new();
    }
    let straight = || -> Vec<Segment> {
        points[1..].iter().map(|p| Segment::Line(*p)).collect()
    };
    if tension == 0.0 || points.len() < 3 {
        return straight();
    }

    // (control before, point, control after) for every interior point
    let knots: Vec<((f32, f32), (f32, f32), (f32, f32))> = points
        .windows(3)
        .filter_map(|w| {
            control_points(w[0], w[1], w[2], tension).map(|(before, after)| (before, w[1], after))
        })
        .collect();

    let (Some(first), Some(last)) = (knots.first(), knots.last()) else {
        return straight();
    };

    let mut segments = Vec::with_capacity(knots.len() + 1);
    segments.push(Segment::Quad(first.0, first.1));
    for pair in knots.windows(2) {
        segments.push(Segment::Cubic(pair[0].2, pair[1].0, pair[1].1));
    }
    segments.push(Segment::Quad(last.2, points[points.len() - 1]));
    segments
}

fn control_points(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    tension: f32,
) -> Option<((f32, f32), (f32, f32))> {
    let d01 = (p1.0 - p0.0).hypot(p1.1 - p0.1);
    let d12 = (p2.0 - p1.0).hypot(p2.1 - p1.1);
    let total = d01 + d12;
    if total == 0.0 {
        return None;
    }
    let fa = tension * d01 / total;
    let fb = tension * d12 / total;
    let (dx, dy) = (p2.0 - p0.0, p2.1 - p0.1);
    Some((
        (p1.0 - fa * dx, p1.1 - fa * dy),
        (p1.0 + fb * dx, p1.1 + fb * dy),
    ))
}
