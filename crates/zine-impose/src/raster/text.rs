//! Text layout with rustybuzz shaping
//!
//! Breaks a [`TextRun`] into lines, shapes each line and positions the
//! resulting glyphs. The layout is backend-neutral: it yields glyph ids
//! with pen positions in the run's coordinate space, plus decoration bars,
//! and leaves outline drawing to the canvas.

use rustybuzz::{Direction as HbDirection, Face as HbFace, UnicodeBuffer};
use ttf_parser::GlyphId;

use crate::fonts::FontData;
use crate::layout::Rect;
use crate::model::{TextAlign, TextDecoration};
use crate::scene::TextRun;

/// One glyph at its pen position (baseline origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    pub id: GlyphId,
    pub x: f32,
    pub baseline: f32,
}

/// A laid-out text run
#[derive(Debug, Clone, Default)]
pub struct TextLayout {
    pub glyphs: Vec<PositionedGlyph>,
    /// Font units to points
    pub scale: f32,
    /// Underline / strike-through bars
    pub decorations: Vec<Rect>,
    pub line_count: usize,
}

/// A shaped glyph, in points relative to the line's pen start
struct ShapedGlyph {
    id: u32,
    /// Byte offset of the glyph's cluster in the shaped text
    cluster: usize,
    x_advance: f32,
    x_offset: f32,
    y_offset: f32,
}

struct Shaper<'a> {
    face: HbFace<'a>,
    scale: f32,
}

impl Shaper<'_> {
    fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut buffer = UnicodeBuffer::new();
        buffer.set_direction(detect_direction(text));
        buffer.push_str(text);
        let output = rustybuzz::shape(&self.face, &[], buffer);
        output
            .glyph_infos()
            .iter()
            .zip(output.glyph_positions())
            .map(|(info, pos)| ShapedGlyph {
                id: info.glyph_id,
                cluster: info.cluster as usize,
                x_advance: pos.x_advance as f32 * self.scale,
                x_offset: pos.x_offset as f32 * self.scale,
                y_offset: pos.y_offset as f32 * self.scale,
            })
            .collect()
    }

    fn width(&self, text: &str) -> f32 {
        self.shape(text).iter().map(|g| g.x_advance).sum()
    }
}

/// A line of text and whether a paragraph break (not a wrap) ends it
struct Line {
    text: String,
    ends_paragraph: bool,
}

/// Lay out `run` with `font`. A font that cannot be shaped yields an empty layout.
pub fn layout_text(font: &FontData, run: &TextRun) -> TextLayout {
    let (Some(face), Some(hb_face)) = (font.face(), font.shaping_face()) else {
        log::debug!("font {} cannot be shaped", font.name());
        return TextLayout::default();
    };
    let units_per_em = face.units_per_em().max(1) as f32;
    let scale = run.size / units_per_em;
    let shaper = Shaper {
        face: hb_face,
        scale,
    };

    let inner_x = run.bounds.x + run.padding;
    let inner_width = (run.bounds.width - 2.0 * run.padding).max(0.0);
    let max_width = (run.wrap && inner_width > 0.0).then_some(inner_width);
    let lines = break_lines(&run.text, max_width, &shaper);

    let line_box = run.size * run.line_height;
    let ascender = face.ascender() as f32 * scale;
    let descender = face.descender() as f32 * scale;
    // Glyphs are vertically centered in their line box.
    let baseline_offset = line_box / 2.0 + (ascender + descender) / 2.0;

    let (underline_pos, underline_thickness) = face
        .underline_metrics()
        .map(|m| (m.position as f32 * scale, m.thickness as f32 * scale))
        .unwrap_or((-run.size * 0.1, run.size / 15.0));
    let strike_pos = face
        .strikeout_metrics()
        .map(|m| m.position as f32 * scale)
        .unwrap_or(run.size * 0.3);
    let thickness = underline_thickness.max(run.size / 20.0).max(0.5);

    let mut layout = TextLayout {
        scale,
        line_count: lines.len(),
        ..Default::default()
    };

    for (index, line) in lines.iter().enumerate() {
        let baseline = run.bounds.y + run.padding + index as f32 * line_box + baseline_offset;
        let shaped = shaper.shape(&line.text);
        let natural_width: f32 = shaped.iter().map(|g| g.x_advance).sum();
        let bytes = line.text.as_bytes();
        let is_space = |g: &ShapedGlyph| bytes.get(g.cluster) == Some(&b' ');
        let spaces = shaped.iter().filter(|g| is_space(g)).count();

        let (start_x, extra_per_space) = match run.align {
            TextAlign::Left => (inner_x, 0.0),
            TextAlign::Center => (inner_x + (inner_width - natural_width) / 2.0, 0.0),
            TextAlign::Right => (inner_x + inner_width - natural_width, 0.0),
            TextAlign::Justify if !line.ends_paragraph && spaces > 0 && max_width.is_some() => {
                (inner_x, ((inner_width - natural_width) / spaces as f32).max(0.0))
            }
            TextAlign::Justify => (inner_x, 0.0),
        };

        let mut pen = start_x;
        for glyph in &shaped {
            let whitespace = line
                .text
                .get(glyph.cluster..)
                .and_then(|rest| rest.chars().next())
                .is_some_and(char::is_whitespace);
            // Glyph 0 is .notdef; it still takes up its advance.
            if glyph.id != 0 && !whitespace {
                layout.glyphs.push(PositionedGlyph {
                    id: GlyphId(glyph.id as u16),
                    x: pen + glyph.x_offset,
                    baseline: baseline - glyph.y_offset,
                });
            }
            pen += glyph.x_advance;
            if is_space(glyph) {
                pen += extra_per_space;
            }
        }

        let drawn_width = pen - start_x;
        if drawn_width <= 0.0 {
            continue;
        }
        match run.decoration {
            TextDecoration::None => {}
            TextDecoration::Underline => layout.decorations.push(Rect::new(
                start_x,
                baseline - underline_pos - thickness / 2.0,
                drawn_width,
                thickness,
            )),
            TextDecoration::LineThrough => layout.decorations.push(Rect::new(
                start_x,
                baseline - strike_pos - thickness / 2.0,
                drawn_width,
                thickness,
            )),
        }
    }

    layout
}

/// Split on newlines, then greedily wrap words to `max_width`.
/// Words wider than a whole line are broken between characters,
/// never in front of a combining mark.
fn break_lines(text: &str, max_width: Option<f32>, shaper: &Shaper<'_>) -> Vec<Line> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let Some(max_width) = max_width else {
            lines.push(Line {
                text: paragraph.to_string(),
                ends_paragraph: true,
            });
            continue;
        };

        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if shaper.width(&candidate) <= max_width || current.is_empty() && word.is_empty() {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(Line {
                    text: std::mem::take(&mut current),
                    ends_paragraph: false,
                });
            }
            // The word alone may still be too wide.
            for ch in word.chars() {
                let mut next = current.clone();
                next.push(ch);
                if !current.is_empty() && !is_combining(ch) && shaper.width(&next) > max_width {
                    lines.push(Line {
                        text: std::mem::take(&mut current),
                        ends_paragraph: false,
                    });
                    current.push(ch);
                } else {
                    current = next;
                }
            }
        }
        lines.push(Line {
            text: current,
            ends_paragraph: true,
        });
    }
    lines
}

fn is_combining(ch: char) -> bool {
    matches!(
        ch as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F | 0x200D
    )
}

fn detect_direction(text: &str) -> HbDirection {
    let rtl = text.chars().any(|ch| {
        matches!(
            ch as u32,
            0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF | 0x1EE00..=0x1EEFF
        )
    });
    if rtl {
        HbDirection::RightToLeft
    } else {
        HbDirection::LeftToRight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use std::sync::Arc;

    const DEJAVU_SANS: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

    fn dejavu() -> Option<Arc<FontData>> {
        let bytes = std::fs::read(DEJAVU_SANS).ok()?;
        Some(Arc::new(FontData::from_bytes("DejaVu Sans", bytes).unwrap()))
    }

    fn run(font: Arc<FontData>, text: &str) -> TextRun {
        TextRun {
            text: text.to_string(),
            bounds: Rect::new(0.0, 0.0, 400.0, 40.0),
            font,
            size: 20.0,
            color: Color::BLACK,
            align: TextAlign::Left,
            line_height: 1.0,
            decoration: TextDecoration::None,
            background: None,
            padding: 0.0,
            wrap: false,
        }
    }

    #[test]
    fn test_decomposed_accent_does_not_widen_text() {
        let Some(font) = dejavu() else {
            eprintln!("{DEJAVU_SANS} not found, skipping");
            return;
        };
        let composed = layout_text(&font, &run(font.clone(), "\u{e9}x"));
        let decomposed = layout_text(&font, &run(font.clone(), "e\u{301}x"));

        let last_x = |layout: &TextLayout| layout.glyphs.last().map(|g| g.x).unwrap();
        let diff = (last_x(&composed) - last_x(&decomposed)).abs();
        assert!(diff < 0.5, "x drifted by {diff}pt after a combining mark");
    }

    #[test]
    fn test_kerning_pulls_av_together() {
        let Some(font) = dejavu() else {
            eprintln!("{DEJAVU_SANS} not found, skipping");
            return;
        };
        let layout = layout_text(&font, &run(font.clone(), "AV"));
        assert_eq!(layout.glyphs.len(), 2);

        let face = font.face().unwrap();
        let a = face.glyph_index('A').unwrap();
        let unkerned = face.glyph_hor_advance(a).unwrap() as f32 * layout.scale;
        let gap = layout.glyphs[1].x - layout.glyphs[0].x;
        assert!(gap < unkerned, "AV gap {gap} is not kerned (advance {unkerned})");
    }

    #[test]
    fn test_wrapping_and_justify() {
        let Some(font) = dejavu() else {
            eprintln!("{DEJAVU_SANS} not found, skipping");
            return;
        };
        let mut text = run(font.clone(), "one two three four five six seven");
        text.bounds.width = 120.0;
        text.wrap = true;
        text.align = TextAlign::Justify;
        let layout = layout_text(&font, &text);
        assert!(layout.line_count > 1);

        // Every wrapped line except the last reaches the right edge.
        let first_baseline = layout.glyphs[0].baseline;
        let first_line_end = layout
            .glyphs
            .iter()
            .filter(|g| g.baseline == first_baseline)
            .map(|g| g.x)
            .fold(f32::MIN, f32::max);
        assert!(first_line_end > 90.0);
    }

    #[test]
    fn test_underline_spans_line() {
        let Some(font) = dejavu() else {
            eprintln!("{DEJAVU_SANS} not found, skipping");
            return;
        };
        let mut text = run(font.clone(), "underlined");
        text.decoration = TextDecoration::Underline;
        let layout = layout_text(&font, &text);
        assert_eq!(layout.decorations.len(), 1);
        assert!(layout.decorations[0].width > 50.0);
    }

    #[test]
    fn test_direction_detection() {
        assert_eq!(detect_direction("hello"), HbDirection::LeftToRight);
        assert_eq!(detect_direction("\u{5e9}\u{5dc}\u{5d5}\u{5dd}"), HbDirection::RightToLeft);
    }
}
