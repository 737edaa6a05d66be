//! Content compositor
//!
//! Builds the scene node for one logical page placed in one sheet slot.
//! Content is laid out in the page's own unrotated frame `(0, 0, w, h)`;
//! the slot transform then rotates it about the slot center, mirrors it
//! across the slot width and moves it onto the sheet.

use std::f32::consts::TAU;

use crate::assets::{self, AssetProvider};
use crate::color::Color;
use crate::constants::*;
use crate::fonts::FontBook;
use crate::layout::{Rect, Slot};
use crate::model::{
    Content, ContentKind, DrawingProperties, FontStyle, FontWeight, ImageProperties, LineCap,
    Page, ShapeKind, ShapeProperties, TextAlign, TextDecoration, TextProperties,
};
use crate::options::ExportOptions;
use crate::scene::{Affine, Group, Node, Paint, StrokeStyle, TextRun};
use crate::types::{ExportWarning, WarningKind};

/// A composed page and the problems met while building it
#[derive(Debug)]
pub struct Composed {
    pub node: Node,
    pub warnings: Vec<ExportWarning>,
}

/// Turns pages into scene nodes, loading images and resolving fonts
pub struct Compositor<'a, A: AssetProvider> {
    assets: &'a A,
    fonts: &'a FontBook,
    show_page_numbers: bool,
}

impl<'a, A: AssetProvider> Compositor<'a, A> {
    pub fn new(assets: &'a A, fonts: &'a FontBook, options: &ExportOptions) -> Self {
        Self {
            assets,
            fonts,
            show_page_numbers: options.show_page_numbers,
        }
    }

    /// Compose `page` into `slot`. Every image load is awaited before this
    /// returns; elements that fail are left out and reported as warnings.
    pub async fn compose(&self, page: &Page, slot: &Slot) -> Composed {
        let (w, h) = (slot.rect.width, slot.rect.height);
        let mut warnings = Vec::new();
        let mut group = Group::new(slot_transform(slot));
        group.clip = Some(Rect::new(0.0, 0.0, w, h));

        group.push(Node::Rect {
            rect: Rect::new(0.0, 0.0, w, h),
            corner_radius: 0.0,
            paint: Paint::fill(Color::parse_or(&page.background_color, DEFAULT_BACKGROUND)),
        });

        if let Some(src) = page.background_image.as_deref().filter(|s| !s.trim().is_empty()) {
            match assets::load_image_src(src).await {
                Ok(image) => group.push(Node::Image {
                    image,
                    rect: Rect::new(0.0, 0.0, w, h),
                    opacity: 1.0,
                }),
                Err(kind) => warnings.push(warning(page.page_number, None, kind)),
            }
        }

        if self.show_page_numbers && page.page_number != 0 {
            match self.page_number_label(page.page_number, w, h) {
                Ok(label) => group.push(label),
                Err(kind) => warnings.push(warning(page.page_number, None, kind)),
            }
        }

        for content in page.content_in_paint_order() {
            if !content.is_visible() {
                log::debug!("skipping hidden content {} on page {}", content.id, page.page_number);
                continue;
            }
            match self.content_node(content).await {
                Ok(Some(node)) => group.push(node),
                Ok(None) => {}
                Err(kind) => warnings.push(warning(
                    page.page_number,
                    Some(content.id.clone()),
                    kind,
                )),
            }
        }

        Composed {
            node: Node::Group(group),
            warnings,
        }
    }

    fn page_number_label(&self, page_number: u32, w: f32, h: f32) -> Result<Node, WarningKind> {
        let family = "Arial";
        let font = self
            .fonts
            .resolve(family, FontWeight::Normal, FontStyle::Normal)
            .ok_or_else(|| WarningKind::FontUnavailable {
                family: family.to_string(),
            })?;
        // Left edge sits 20pt in from the right; longer numbers run past it into the clip.
        Ok(Node::Text(TextRun {
            text: page_number.to_string(),
            bounds: Rect::new(
                w - PAGE_NUMBER_RIGHT_OFFSET,
                h - PAGE_NUMBER_BOTTOM_OFFSET,
                PAGE_NUMBER_RIGHT_OFFSET,
                PAGE_NUMBER_FONT_SIZE,
            ),
            font,
            size: PAGE_NUMBER_FONT_SIZE,
            color: PAGE_NUMBER_COLOR,
            align: TextAlign::Left,
            line_height: 1.0,
            decoration: TextDecoration::None,
            background: None,
            padding: 0.0,
            wrap: false,
        }))
    }

    async fn content_node(&self, content: &Content) -> Result<Option<Node>, WarningKind> {
        match &content.kind {
            ContentKind::Shape(props) => Ok(shape_node(content, props)),
            ContentKind::Text(props) => self.text_node(content, props).map(Some),
            ContentKind::Image(props) => self.image_node(content, props).await.map(Some),
            ContentKind::Drawing(props) => Ok(drawing_node(content, props)),
        }
    }

    fn text_node(&self, content: &Content, props: &TextProperties) -> Result<Node, WarningKind> {
        let font = self
            .fonts
            .resolve(&props.font_family, props.font_weight, props.font_style)
            .ok_or_else(|| WarningKind::FontUnavailable {
                family: props.font_family.clone(),
            })?;
        let run = TextRun {
            text: props.text.clone(),
            bounds: Rect::new(0.0, 0.0, content.width, content.height),
            font,
            size: props.font_size.max(0.0),
            color: Color::parse_or(&props.color, Color::BLACK),
            align: props.text_align,
            line_height: if props.line_height > 0.0 {
                props.line_height
            } else {
                1.0
            },
            decoration: props.text_decoration,
            background: props
                .background_color
                .as_deref()
                .and_then(Color::parse)
                .filter(|c| !c.is_transparent()),
            padding: props.padding.max(0.0),
            wrap: true,
        };
        Ok(wrap_in_group(
            origin_transform(content.rotation, content.x, content.y),
            1.0,
            Node::Text(run),
        ))
    }

    async fn image_node(
        &self,
        content: &Content,
        props: &ImageProperties,
    ) -> Result<Node, WarningKind> {
        let image = assets::load_image(props, self.assets).await?;
        Ok(wrap_in_group(
            origin_transform(content.rotation, content.x, content.y),
            1.0,
            Node::Image {
                image,
                rect: Rect::new(0.0, 0.0, content.width, content.height),
                opacity: props.opacity.clamp(0.0, 1.0),
            },
        ))
    }
}

/// Maps page-local coordinates onto the sheet: rotate about the slot
/// center, mirror across the slot width, then move to the slot origin.
pub fn slot_transform(slot: &Slot) -> Affine {
    let Rect {
        x,
        y,
        width,
        height,
    } = slot.rect;
    let mut transform = Affine::IDENTITY;
    if slot.rotation != 0.0 {
        transform = Affine::rotate_about(slot.rotation, width / 2.0, height / 2.0);
    }
    if slot.mirrored {
        transform = transform
            .then(Affine::scale(-1.0, 1.0))
            .then(Affine::translate(width, 0.0));
    }
    transform.then(Affine::translate(x, y))
}

fn origin_transform(rotation: f32, x: f32, y: f32) -> Affine {
    Affine::rotate(rotation).then(Affine::translate(x, y))
}

fn wrap_in_group(transform: Affine, opacity: f32, node: Node) -> Node {
    let mut group = Group::new(transform);
    group.opacity = opacity;
    group.push(node);
    Node::Group(group)
}

fn warning(page_number: u32, content_id: Option<String>, kind: WarningKind) -> ExportWarning {
    let warning = ExportWarning {
        page_number,
        content_id,
        kind,
    };
    log::warn!("{}", warning);
    warning
}

fn shape_paint(props: &ShapeProperties) -> Paint {
    let fill = Color::parse(&props.fill).filter(|c| !c.is_transparent());
    let stroke = Color::parse(&props.stroke)
        .map(|color| StrokeStyle::solid(color, props.stroke_width))
        .filter(|s| !s.is_invisible());
    Paint { fill, stroke }
}

fn shape_node(content: &Content, props: &ShapeProperties) -> Option<Node> {
    let (w, h) = (content.width, content.height);
    let opacity = props.opacity.clamp(0.0, 1.0);
    let paint = shape_paint(props);

    let (origin, node) = match props.shape_type {
        ShapeKind::Rectangle => (
            (content.x, content.y),
            Node::Rect {
                rect: Rect::new(0.0, 0.0, w, h),
                corner_radius: props.corner_radius.unwrap_or(0.0).max(0.0),
                paint,
            },
        ),
        ShapeKind::Circle => {
            let r = w.min(h) / 2.0;
            (
                (content.x + r, content.y + r),
                Node::Ellipse {
                    cx: 0.0,
                    cy: 0.0,
                    rx: r,
                    ry: r,
                    paint,
                },
            )
        }
        ShapeKind::Triangle => (
            (content.x + w / 2.0, content.y + h / 2.0),
            Node::Polygon {
                points: regular_polygon(3, w.min(h) / 2.0),
                paint,
            },
        ),
        ShapeKind::Line => {
            let stroke = paint.stroke?.with_cap(LineCap::Round);
            (
                (content.x, content.y),
                Node::line((0.0, h / 2.0), (w, h / 2.0), stroke),
            )
        }
    };

    Some(wrap_in_group(
        origin_transform(content.rotation, origin.0, origin.1),
        opacity,
        node,
    ))
}

/// Vertices of a regular polygon centered on the origin, first vertex
/// straight up.
fn regular_polygon(sides: usize, radius: f32) -> Vec<(f32, f32)> {
    (0..sides)
        .map(|n| {
            let angle = n as f32 * TAU / sides as f32;
            (radius * angle.sin(), -radius * angle.cos())
        })
        .collect()
}

fn drawing_node(content: &Content, props: &DrawingProperties) -> Option<Node> {
    let tension = if props.smoothing {
        SMOOTHING_TENSION
    } else {
        0.0
    };
    let default_color = Color::parse_or(&props.stroke_color, Color::BLACK);

    let mut group = Group::new(origin_transform(content.rotation, content.x, content.y));
    group.opacity = props.opacity.clamp(0.0, 1.0);
    for path in props.paths.iter().filter(|p| !p.points.is_empty()) {
        let color = Color::parse(&path.color).unwrap_or(default_color);
        let width = if path.width > 0.0 {
            path.width
        } else {
            props.stroke_width
        };
        let stroke = StrokeStyle::solid(color, width)
            .with_cap(props.line_cap)
            .with_join(props.line_join);
        if stroke.is_invisible() {
            continue;
        }
        group.push(Node::Polyline {
            points: path.points.iter().map(|p| (p.x, p.y)).collect(),
            tension,
            stroke,
        });
    }

    if group.children.is_empty() {
        None
    } else {
        Some(Node::Group(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NoAssets;
    use crate::model::{DrawingPath, Point};

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-3 && (a.1 - b.1).abs() < 1e-3
    }

    fn slot(rotation: f32, mirrored: bool) -> Slot {
        Slot {
            page_number: 1,
            rect: Rect::new(100.0, 50.0, 200.0, 300.0),
            rotation,
            mirrored,
        }
    }

    fn children(node: &Node) -> &[Node] {
        match node {
            Node::Group(g) => &g.children,
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_slot_transform_upright() {
        let t = slot_transform(&slot(0.0, false));
        assert!(close(t.apply(0.0, 0.0), (100.0, 50.0)));
        assert!(close(t.apply(200.0, 300.0), (300.0, 350.0)));
    }

    #[test]
    fn test_slot_transform_rotated_half_turn() {
        let t = slot_transform(&slot(180.0, false));
        assert!(close(t.apply(0.0, 0.0), (300.0, 350.0)));
        assert!(close(t.apply(200.0, 300.0), (100.0, 50.0)));
    }

    #[test]
    fn test_slot_transform_mirrored() {
        let t = slot_transform(&slot(0.0, true));
        assert!(close(t.apply(0.0, 0.0), (300.0, 50.0)));
        assert!(close(t.apply(200.0, 0.0), (100.0, 50.0)));
    }

    #[test]
    fn test_triangle_apex_up() {
        let points = regular_polygon(3, 10.0);
        assert!(close(points[0], (0.0, -10.0)));
        assert!(points[1].1 > 0.0 && points[2].1 > 0.0);
    }

    #[tokio::test]
    async fn test_hidden_content_skipped_and_background_first() {
        let mut page = Page::blank(1, "Front Cover");
        let mut hidden = Content::new(
            "hidden",
            0.0,
            0.0,
            10.0,
            10.0,
            ContentKind::Shape(ShapeProperties::default()),
        );
        hidden.visible = Some(false);
        page.content.push(hidden);
        page.content.push(Content::new(
            "box",
            0.0,
            0.0,
            10.0,
            10.0,
            ContentKind::Shape(ShapeProperties::default()),
        ));

        let fonts = FontBook::without_system_fonts();
        let compositor = Compositor::new(&NoAssets, &fonts, &ExportOptions::default());
        let composed = compositor.compose(&page, &slot(0.0, false)).await;
        let nodes = children(&composed.node);
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[0], Node::Rect { .. }));
        assert!(composed.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_missing_font_reports_warning() {
        let mut page = Page::blank(3, "Page 3");
        page.content.push(Content::new(
            "title",
            0.0,
            0.0,
            100.0,
            20.0,
            ContentKind::Text(TextProperties {
                text: "hello".into(),
                ..Default::default()
            }),
        ));
        let fonts = FontBook::without_system_fonts();
        let options = ExportOptions {
            show_page_numbers: true,
            ..Default::default()
        };
        let compositor = Compositor::new(&NoAssets, &fonts, &options);
        let composed = compositor.compose(&page, &slot(0.0, false)).await;

        assert_eq!(children(&composed.node).len(), 1);
        assert_eq!(composed.warnings.len(), 2);
        assert_eq!(composed.warnings[0].content_id, None);
        assert_eq!(composed.warnings[1].content_id.as_deref(), Some("title"));
        assert!(matches!(
            composed.warnings[1].kind,
            WarningKind::FontUnavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_blank_filler_has_no_label() {
        let fonts = FontBook::without_system_fonts();
        let options = ExportOptions {
            show_page_numbers: true,
            ..Default::default()
        };
        let compositor = Compositor::new(&NoAssets, &fonts, &options);
        let composed = compositor.compose(&Page::blank(0, ""), &slot(0.0, false)).await;
        assert_eq!(children(&composed.node).len(), 1);
        assert!(composed.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_page_label_left_edge_near_right_side() {
        let Ok(bytes) = std::fs::read("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf") else {
            eprintln!("DejaVu Sans not found, skipping");
            return;
        };
        let mut fonts = FontBook::without_system_fonts();
        fonts.register_fallback(bytes).unwrap();
        let options = ExportOptions {
            show_page_numbers: true,
            ..Default::default()
        };
        let compositor = Compositor::new(&NoAssets, &fonts, &options);
        let composed = compositor.compose(&Page::blank(12, "Page 12"), &slot(0.0, false)).await;

        let nodes = children(&composed.node);
        assert_eq!(nodes.len(), 2);
        match &nodes[1] {
            Node::Text(run) => {
                assert_eq!(run.text, "12");
                assert_eq!(run.align, TextAlign::Left);
                assert!(!run.wrap);
                assert_eq!((run.bounds.x, run.bounds.y), (180.0, 282.0));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_drawing_uses_tension_when_smoothing() {
        let content = Content::new("d", 5.0, 5.0, 50.0, 50.0, ContentKind::Drawing(Default::default()));
        let props = DrawingProperties {
            paths: vec![DrawingPath {
                points: vec![Point { x: 0.0, y: 0.0 }, Point { x: 10.0, y: 5.0 }],
                color: String::new(),
                width: 0.0,
            }],
            smoothing: true,
            ..Default::default()
        };
        let node = drawing_node(&content, &props).unwrap();
        match &children(&node)[0] {
            Node::Polyline {
                tension, stroke, ..
            } => {
                assert_eq!(*tension, 0.5);
                assert_eq!(stroke.width, 2.0);
                assert_eq!(stroke.cap, LineCap::Round);
            }
            other => panic!("expected polyline, got {:?}", other),
        }
    }

    #[test]
    fn test_line_shape_without_stroke_is_dropped() {
        let props = ShapeProperties {
            shape_type: ShapeKind::Line,
            stroke: "transparent".into(),
            ..Default::default()
        };
        let content = Content::new("l", 0.0, 0.0, 10.0, 10.0, ContentKind::Shape(props.clone()));
        assert!(shape_node(&content, &props).is_none());
    }
}
