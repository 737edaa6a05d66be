//! tiny-skia backend for the [`Canvas`] trait

use std::rc::Rc;

use image::RgbaImage;
use tiny_skia::{
    FillRule, FilterQuality, Mask, Paint as SkPaint, Path, PathBuilder, Pixmap, PixmapPaint,
    Stroke, StrokeDash, Transform,
};
use ttf_parser::OutlineBuilder;

use super::canvas::{Canvas, Segment, curve_segments, draw_scene};
use super::text::layout_text;
use crate::color::Color;
use crate::constants::BEZIER_CIRCLE_FACTOR;
use crate::layout::Rect;
use crate::model::{LineCap, LineJoin};
use crate::scene::{Affine, Paint, Scene, StrokeStyle, TextRun};
use crate::types::{ExportError, Result};

/// Off-screen pixel buffer reused across sheet sides.
///
/// The buffer is reallocated only when the requested size changes and is
/// cleared before every render.
#[derive(Default)]
pub struct Surface {
    pixmap: Option<Pixmap>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `scene` at `pixel_ratio` pixels per point.
    pub fn render(&mut self, scene: &Scene, pixel_ratio: f32) -> Result<RgbaImage> {
        let width = (scene.width * pixel_ratio).round();
        let height = (scene.height * pixel_ratio).round();
        if !(width >= 1.0 && height >= 1.0 && width <= u32::MAX as f32 && height <= u32::MAX as f32)
        {
            return Err(invalid_size(scene, pixel_ratio));
        }
        let (width, height) = (width as u32, height as u32);

        let reuse = matches!(&self.pixmap, Some(p) if p.width() == width && p.height() == height);
        if !reuse {
            log::debug!("allocating {}x{} raster surface", width, height);
            self.pixmap =
                Some(Pixmap::new(width, height).ok_or_else(|| invalid_size(scene, pixel_ratio))?);
        }
        let pixmap = self
            .pixmap
            .as_mut()
            .ok_or_else(|| invalid_size(scene, pixel_ratio))?;

        let mut canvas = SkiaCanvas::new(&mut *pixmap, pixel_ratio);
        draw_scene(&mut canvas, scene);
        Ok(to_rgba_image(pixmap))
    }
}

fn invalid_size(scene: &Scene, pixel_ratio: f32) -> ExportError {
    ExportError::Config(format!(
        "invalid raster size for {}x{}pt sheet at pixel ratio {}",
        scene.width, scene.height, pixel_ratio
    ))
}

/// Render a scene on a fresh surface.
pub fn rasterize(scene: &Scene, pixel_ratio: f32) -> Result<RgbaImage> {
    Surface::new().render(scene, pixel_ratio)
}

fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

#[derive(Clone)]
struct GroupState {
    transform: Transform,
    clip: Option<Rc<Mask>>,
    opacity: f32,
}

/// [`Canvas`] drawing into a tiny-skia pixmap
pub struct SkiaCanvas<'a> {
    pixmap: &'a mut Pixmap,
    state: GroupState,
    stack: Vec<GroupState>,
}

impl<'a> SkiaCanvas<'a> {
    /// Canvas whose user space is points scaled by `pixel_ratio`
    pub fn new(pixmap: &'a mut Pixmap, pixel_ratio: f32) -> Self {
        Self {
            pixmap,
            state: GroupState {
                transform: Transform::from_scale(pixel_ratio, pixel_ratio),
                clip: None,
                opacity: 1.0,
            },
            stack: Vec::new(),
        }
    }

    fn color_paint(&self, color: Color) -> SkPaint<'static> {
        let mut paint = SkPaint::default();
        let c = color.with_opacity(self.state.opacity);
        paint.set_color_rgba8(c.r, c.g, c.b, c.a);
        paint.anti_alias = true;
        paint
    }

    fn fill_and_stroke(&mut self, path: &Path, paint: &Paint) {
        if let Some(fill) = paint.fill.filter(|c| !c.is_transparent()) {
            let sk = self.color_paint(fill);
            self.pixmap.fill_path(
                path,
                &sk,
                FillRule::Winding,
                self.state.transform,
                self.state.clip.as_deref(),
            );
        }
        if let Some(stroke) = paint.stroke.as_ref().filter(|s| !s.is_invisible()) {
            self.stroke(path, stroke);
        }
    }

    fn stroke(&mut self, path: &Path, style: &StrokeStyle) {
        let sk = self.color_paint(style.color);
        self.pixmap.stroke_path(
            path,
            &sk,
            &to_stroke(style),
            self.state.transform,
            self.state.clip.as_deref(),
        );
    }

    fn fill_rect(&mut self, rect: &Rect, color: Color) {
        if let Some(path) = rect_path(rect) {
            self.fill_and_stroke(&path, &Paint::fill(color));
        }
    }
}

impl Canvas for SkiaCanvas<'_> {
    fn clear(&mut self, color: Color) {
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    }

    fn push_group(&mut self, transform: Affine, clip: Option<Rect>, opacity: f32) {
        let parent = self.state.clone();
        let transform = parent.transform.pre_concat(to_transform(transform));
        let clip = match clip {
            Some(rect) => clip_mask(
                self.pixmap.width(),
                self.pixmap.height(),
                parent.clip.as_deref(),
                &rect,
                transform,
            )
            .map(Rc::new),
            None => parent.clip.clone(),
        };
        self.stack.push(parent);
        self.state = GroupState {
            transform,
            clip,
            opacity: self.state.opacity * opacity.clamp(0.0, 1.0),
        };
    }

    fn pop_group(&mut self) {
        if let Some(parent) = self.stack.pop() {
            self.state = parent;
        }
    }

    fn draw_rect(&mut self, rect: &Rect, corner_radius: f32, paint: &Paint) {
        let path = if corner_radius > 0.0 {
            rounded_rect_path(rect, corner_radius)
        } else {
            rect_path(rect)
        };
        if let Some(path) = path {
            self.fill_and_stroke(&path, paint);
        }
    }

    fn draw_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, paint: &Paint) {
        let path = tiny_skia::Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0)
            .and_then(PathBuilder::from_oval);
        if let Some(path) = path {
            self.fill_and_stroke(&path, paint);
        }
    }

    fn draw_polygon(&mut self, points: &[(f32, f32)], paint: &Paint) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let mut pb = PathBuilder::new();
        pb.move_to(first.0, first.1);
        for p in rest {
            pb.line_to(p.0, p.1);
        }
        pb.close();
        if let Some(path) = pb.finish() {
            self.fill_and_stroke(&path, paint);
        }
    }

    fn draw_polyline(&mut self, points: &[(f32, f32)], tension: f32, stroke: &StrokeStyle) {
        if stroke.is_invisible() {
            return;
        }
        let Some(first) = points.first() else {
            return;
        };
        let mut pb = PathBuilder::new();
        pb.move_to(first.0, first.1);
        for segment in curve_segments(points, tension) {
            match segment {
                Segment::Line(p) => pb.line_to(p.0, p.1),
                Segment::Quad(c, p) => pb.quad_to(c.0, c.1, p.0, p.1),
                Segment::Cubic(c1, c2, p) => pb.cubic_to(c1.0, c1.1, c2.0, c2.1, p.0, p.1),
            }
        }
        if let Some(path) = pb.finish() {
            self.stroke(&path, stroke);
        }
    }

    fn draw_text(&mut self, run: &TextRun) {
        if let Some(background) = run.background {
            self.fill_rect(&run.bounds, background);
        }
        if run.text.is_empty() || run.size <= 0.0 {
            return;
        }
        let Some(face) = run.font.face() else {
            log::debug!("font {} failed to parse at draw time", run.font.name());
            return;
        };

        let layout = layout_text(&run.font, run);
        let paint = self.color_paint(run.color);
        for glyph in &layout.glyphs {
            let mut builder = GlyphPathBuilder::new(glyph.x, glyph.baseline, layout.scale);
            if face.outline_glyph(glyph.id, &mut builder).is_none() {
                continue;
            }
            let Some(path) = builder.finish() else {
                continue;
            };
            self.pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                self.state.transform,
                self.state.clip.as_deref(),
            );
        }
        for bar in &layout.decorations {
            self.fill_rect(bar, run.color);
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, rect: &Rect, opacity: f32) {
        let (iw, ih) = image.dimensions();
        if iw == 0 || ih == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let Some(source) = premultiplied_pixmap(image) else {
            return;
        };
        let placement = Transform::from_row(
            rect.width / iw as f32,
            0.0,
            0.0,
            rect.height / ih as f32,
            rect.x,
            rect.y,
        );
        let paint = PixmapPaint {
            opacity: (opacity * self.state.opacity).clamp(0.0, 1.0),
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &paint,
            self.state.transform.pre_concat(placement),
            self.state.clip.as_deref(),
        );
    }
}

fn to_transform(affine: Affine) -> Transform {
    Transform::from_row(affine.a, affine.b, affine.c, affine.d, affine.e, affine.f)
}

fn to_stroke(style: &StrokeStyle) -> Stroke {
    let mut stroke = Stroke {
        width: style.width,
        line_cap: match style.cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        },
        line_join: match style.join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        ..Stroke::default()
    };
    if let Some(dash) = &style.dash {
        stroke.dash = StrokeDash::new(dash.clone(), 0.0);
    }
    stroke
}

/// Clip mask for `rect` under `transform`, intersected with the parent clip.
fn clip_mask(
    width: u32,
    height: u32,
    parent: Option<&Mask>,
    rect: &Rect,
    transform: Transform,
) -> Option<Mask> {
    let Some(path) = rect_path(rect) else {
        // Degenerate clip: nothing inside it is visible.
        return Mask::new(width, height);
    };
    match parent {
        Some(parent) => {
            let mut mask = parent.clone();
            mask.intersect_path(&path, FillRule::Winding, true, transform);
            Some(mask)
        }
        None => {
            let mut mask = Mask::new(width, height)?;
            mask.fill_path(&path, FillRule::Winding, true, transform);
            Some(mask)
        }
    }
}

fn rect_path(rect: &Rect) -> Option<Path> {
    tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height).map(PathBuilder::from_rect)
}

fn rounded_rect_path(rect: &Rect, radius: f32) -> Option<Path> {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0);
    let k = r * BEZIER_CIRCLE_FACTOR;
    let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());

    let mut pb = PathBuilder::new();
    pb.move_to(left + r, top);
    pb.line_to(right - r, top);
    pb.cubic_to(right - r + k, top, right, top + r - k, right, top + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(left + r, bottom);
    pb.cubic_to(left + r - k, bottom, left, bottom - r + k, left, bottom - r);
    pb.line_to(left, top + r);
    pb.cubic_to(left, top + r - k, left + r - k, top, left + r, top);
    pb.close();
    pb.finish()
}

fn premultiplied_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (src, dst) in image
        .as_raw()
        .chunks_exact(4)
        .zip(pixmap.data_mut().chunks_exact_mut(4))
    {
        let a = src[3];
        dst[0] = premul_u8(src[0], a);
        dst[1] = premul_u8(src[1], a);
        dst[2] = premul_u8(src[2], a);
        dst[3] = a;
    }
    Some(pixmap)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

/// Glyph outline to path, font units (y up) to page space (y down)
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x, y) = self.point(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x2, y2) = self.point(x2, y2);
        let (x, y) = self.point(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Group, Node};

    fn pixel(image: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
        image.get_pixel(x, y).0
    }

    #[test]
    fn test_blank_scene_is_white_at_pixel_ratio() {
        let scene = Scene::new(100.0, 50.0);
        let image = rasterize(&scene, 2.0).unwrap();
        assert_eq!(image.dimensions(), (200, 100));
        assert_eq!(pixel(&image, 0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_group_clip_limits_fill() {
        let mut scene = Scene::new(100.0, 100.0);
        let mut group = Group::new(Affine::translate(10.0, 10.0));
        group.clip = Some(Rect::new(0.0, 0.0, 20.0, 20.0));
        group.push(Node::Rect {
            rect: Rect::new(0.0, 0.0, 80.0, 80.0),
            corner_radius: 0.0,
            paint: Paint::fill(Color::rgb(255, 0, 0)),
        });
        scene.push(Node::Group(group));

        let image = rasterize(&scene, 1.0).unwrap();
        assert_eq!(pixel(&image, 20, 20), [255, 0, 0, 255]);
        assert_eq!(pixel(&image, 50, 50), [255, 255, 255, 255]);
        assert_eq!(pixel(&image, 5, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn test_image_is_scaled_into_rect() {
        let mut source = RgbaImage::new(1, 1);
        source.put_pixel(0, 0, image::Rgba([0, 0, 255, 255]));
        let mut scene = Scene::new(40.0, 40.0);
        scene.push(Node::Image {
            image: std::sync::Arc::new(source),
            rect: Rect::new(10.0, 10.0, 20.0, 20.0),
            opacity: 1.0,
        });
        let image = rasterize(&scene, 1.0).unwrap();
        assert_eq!(pixel(&image, 20, 20), [0, 0, 255, 255]);
        assert_eq!(pixel(&image, 2, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn test_surface_is_cleared_between_renders() {
        let mut surface = Surface::new();
        let mut red = Scene::new(10.0, 10.0);
        red.push(Node::Rect {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            corner_radius: 0.0,
            paint: Paint::fill(Color::rgb(255, 0, 0)),
        });
        let first = surface.render(&red, 1.0).unwrap();
        assert_eq!(pixel(&first, 5, 5), [255, 0, 0, 255]);
        let second = surface.render(&Scene::new(10.0, 10.0), 1.0).unwrap();
        assert_eq!(pixel(&second, 5, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn test_zero_size_is_config_error() {
        let err = rasterize(&Scene::new(0.0, 10.0), 2.0).unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn test_dashed_stroke_leaves_gaps() {
        let mut scene = Scene::new(40.0, 10.0);
        scene.push(Node::line(
            (0.0, 5.0),
            (40.0, 5.0),
            StrokeStyle::solid(Color::BLACK, 2.0).dashed(&[6.0, 4.0]),
        ));
        let image = rasterize(&scene, 1.0).unwrap();
        assert_eq!(pixel(&image, 3, 5), [0, 0, 0, 255]);
        assert_eq!(pixel(&image, 8, 5), [255, 255, 255, 255]);
    }
}
