use serde::{Deserialize, Serialize};

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextProperties {
    pub text: String,
    pub font_size: f32,
    pub font_family: String,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub color: String,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    pub padding: f32,
}

impl Default for TextProperties {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 16.0,
            font_family: "Arial".to_string(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            color: "#000000".to_string(),
            text_align: TextAlign::Left,
            line_height: 1.0,
            text_decoration: TextDecoration::None,
            background_color: None,
            padding: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageProperties {
    /// Inline source: data URI, file path or URL
    pub src: String,
    pub alt: String,
    pub opacity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    /// Managed asset id; takes precedence over `src`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<u64>,
}

impl Default for ImageProperties {
    fn default() -> Self {
        Self {
            src: String::new(),
            alt: String::new(),
            opacity: 1.0,
            filters: None,
            asset_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Line,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeProperties {
    pub shape_type: ShapeKind,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f32,
    pub opacity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,
}

impl Default for ShapeProperties {
    fn default() -> Self {
        Self {
            shape_type: ShapeKind::Rectangle,
            fill: "transparent".to_string(),
            stroke: "#000000".to_string(),
            stroke_width: 1.0,
            opacity: 1.0,
            corner_radius: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingPath {
    pub points: Vec<Point>,
    pub color: String,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrawingProperties {
    pub paths: Vec<DrawingPath>,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub opacity: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub smoothing: bool,
}

impl Default for DrawingProperties {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            stroke_color: "#000000".to_string(),
            stroke_width: 2.0,
            opacity: 1.0,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            smoothing: false,
        }
    }
}

/// Type tag plus its property payload
#[derive(Debug, Clone, PartialEq)]
pub enum ContentKind {
    Text(TextProperties),
    Image(ImageProperties),
    Shape(ShapeProperties),
    Drawing(DrawingProperties),
}

impl ContentKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContentKind::Text(_) => "text",
            ContentKind::Image(_) => "image",
            ContentKind::Shape(_) => "shape",
            ContentKind::Drawing(_) => "drawing",
        }
    }
}

/// One element placed on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContent", into = "RawContent")]
pub struct Content {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, about the element's own origin
    pub rotation: f32,
    pub z_index: i32,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub group_id: Option<String>,
    pub name: Option<String>,
    pub kind: ContentKind,
}

impl Content {
    pub fn new(
        id: impl Into<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        kind: ContentKind,
    ) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            rotation: 0.0,
            z_index: 0,
            visible: None,
            locked: None,
            group_id: None,
            name: None,
            kind,
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Hidden only when explicitly flagged; absent means visible.
    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }
}

/// Persisted shape of a content item: the payload stays untyped until the
/// `type` tag is known.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContent {
    id: String,
    #[serde(rename = "type")]
    content_type: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default)]
    z_index: i32,
    #[serde(default)]
    properties: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl TryFrom<RawContent> for Content {
    type Error = String;

    fn try_from(raw: RawContent) -> std::result::Result<Self, Self::Error> {
        let props = if raw.properties.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            raw.properties
        };
        let parse_err = |e: serde_json::Error| format!("content '{}': {}", raw.id, e);
        let kind = match raw.content_type.as_str() {
            "text" => ContentKind::Text(serde_json::from_value(props).map_err(parse_err)?),
            "image" => ContentKind::Image(serde_json::from_value(props).map_err(parse_err)?),
            "shape" => ContentKind::Shape(serde_json::from_value(props).map_err(parse_err)?),
            "drawing" => ContentKind::Drawing(serde_json::from_value(props).map_err(parse_err)?),
            other => return Err(format!("content '{}': unknown type '{}'", raw.id, other)),
        };
        Ok(Content {
            id: raw.id,
            x: raw.x,
            y: raw.y,
            width: raw.width,
            height: raw.height,
            rotation: raw.rotation,
            z_index: raw.z_index,
            visible: raw.visible,
            locked: raw.locked,
            group_id: raw.group_id,
            name: raw.name,
            kind,
        })
    }
}

impl From<Content> for RawContent {
    fn from(content: Content) -> Self {
        let content_type = content.kind.type_name().to_string();
        // Property structs are plain data; serializing them cannot fail.
        let properties = match &content.kind {
            ContentKind::Text(p) => serde_json::to_value(p),
            ContentKind::Image(p) => serde_json::to_value(p),
            ContentKind::Shape(p) => serde_json::to_value(p),
            ContentKind::Drawing(p) => serde_json::to_value(p),
        }
        .unwrap_or(serde_json::Value::Null);
        RawContent {
            id: content.id,
            content_type,
            x: content.x,
            y: content.y,
            width: content.width,
            height: content.height,
            rotation: content.rotation,
            z_index: content.z_index,
            properties,
            visible: content.visible,
            locked: content.locked,
            group_id: content.group_id,
            name: content.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_parses_type_tag() {
        let json = r##"{
            "id": "c1", "type": "shape", "x": 1, "y": 2, "width": 30, "height": 40,
            "rotation": 0, "zIndex": 3,
            "properties": {"shapeType": "circle", "fill": "#ff0000", "stroke": "#000",
                           "strokeWidth": 2, "opacity": 0.5}
        }"##;
        let content: Content = serde_json::from_str(json).unwrap();
        assert_eq!(content.z_index, 3);
        match content.kind {
            ContentKind::Shape(p) => {
                assert_eq!(p.shape_type, ShapeKind::Circle);
                assert_eq!(p.opacity, 0.5);
                assert_eq!(p.corner_radius, None);
            }
            other => panic!("expected shape, got {:?}", other),
        }
    }

    #[test]
    fn test_content_rejects_unknown_type() {
        let json = r#"{"id":"c1","type":"video","x":0,"y":0,"width":1,"height":1}"#;
        let err = serde_json::from_str::<Content>(json).unwrap_err();
        assert!(err.to_string().contains("unknown type 'video'"));
    }

    #[test]
    fn test_content_serializes_properties_under_type() {
        let content = Content::new(
            "t1",
            0.0,
            0.0,
            100.0,
            20.0,
            ContentKind::Text(TextProperties {
                text: "hello".into(),
                ..Default::default()
            }),
        );
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["properties"]["text"], "hello");
        assert_eq!(value["zIndex"], 0);
        assert!(value.get("visible").is_none());
    }

    #[test]
    fn test_image_asset_id_is_optional() {
        let props: ImageProperties = serde_json::from_str(r#"{"src":"a.png"}"#).unwrap();
        assert_eq!(props.asset_id, None);
        assert_eq!(props.opacity, 1.0);
    }
}
