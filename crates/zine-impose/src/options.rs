use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PIXEL_RATIO, MAX_PIXEL_RATIO};
use crate::types::*;

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    // Overlays
    pub show_page_numbers: bool,
    pub show_fold_marks: bool,
    pub show_cut_marks: bool,

    // Raster scale factor relative to 1px per point
    pub pixel_ratio: f32,

    // Bleed margin in points; checked but not applied to the layout
    pub bleed: f32,

    // Extra wait at the settle point before each capture
    pub settle_delay_ms: u64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            show_page_numbers: false,
            show_fold_marks: false,
            show_cut_marks: false,
            pixel_ratio: DEFAULT_PIXEL_RATIO,
            bleed: 0.0,
            settle_delay_ms: 0,
        }
    }
}

impl ExportOptions {
    /// Load options from JSON file
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| ExportError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ExportError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if !self.pixel_ratio.is_finite() || self.pixel_ratio <= 0.0 {
            return Err(ExportError::Config(format!(
                "Pixel ratio must be a positive number, got {}",
                self.pixel_ratio
            )));
        }
        if self.pixel_ratio > MAX_PIXEL_RATIO {
            return Err(ExportError::Config(format!(
                "Pixel ratio {} exceeds the maximum of {}",
                self.pixel_ratio, MAX_PIXEL_RATIO
            )));
        }
        if !self.bleed.is_finite() || self.bleed < 0.0 {
            return Err(ExportError::Config(format!(
                "Bleed must be a non-negative number of points, got {}",
                self.bleed
            )));
        }
        Ok(())
    }

    /// Enable every overlay (page numbers, fold and cut marks)
    pub fn with_all_guides(mut self) -> Self {
        self.show_page_numbers = true;
        self.show_fold_marks = true;
        self.show_cut_marks = true;
        self
    }

    /// Raster size in pixels for a sheet of the given size in points
    pub fn raster_size(&self, sheet_width: f32, sheet_height: f32) -> (u32, u32) {
        (
            (sheet_width * self.pixel_ratio).round().max(0.0) as u32,
            (sheet_height * self.pixel_ratio).round().max(0.0) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = ExportOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.pixel_ratio, 2.0);
        assert!(!options.show_cut_marks);
    }

    #[test]
    fn test_rejects_bad_pixel_ratio_and_bleed() {
        for ratio in [0.0, -1.0, f32::NAN, f32::INFINITY, 64.0] {
            let options = ExportOptions {
                pixel_ratio: ratio,
                ..Default::default()
            };
            assert!(options.validate().is_err(), "ratio {ratio} accepted");
        }
        let options = ExportOptions {
            bleed: -0.5,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(ExportError::Config(_))));
    }

    #[test]
    fn test_raster_size_rounds() {
        let options = ExportOptions {
            pixel_ratio: 1.5,
            ..Default::default()
        };
        assert_eq!(options.raster_size(792.0, 612.0), (1188, 918));
        assert_eq!(ExportOptions::default().raster_size(595.28, 841.89), (1191, 1684));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let options: ExportOptions = serde_json::from_str(r#"{"showFoldMarks":true}"#).unwrap();
        assert!(options.show_fold_marks);
        assert_eq!(options.pixel_ratio, 2.0);
    }
}
