//! Sheet rasterization
//!
//! - [`Canvas`]: drawing interface the scene graph is rendered through
//! - [`SkiaCanvas`] / [`Surface`]: tiny-skia implementation and its reusable buffer
//! - Text layout shaped with rustybuzz

mod canvas;
mod skia;
mod text;

use std::time::Duration;

pub use canvas::{Canvas, Segment, curve_segments, draw_scene};
pub use skia::{SkiaCanvas, Surface, rasterize};
pub use text::{PositionedGlyph, TextLayout, layout_text};

/// Yield to the runtime before a capture, then wait `delay_ms` if non-zero.
pub async fn settle(delay_ms: u64) {
    tokio::task::yield_now().await;
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
