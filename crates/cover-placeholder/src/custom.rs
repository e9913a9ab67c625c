//! Styled covers built from caller-supplied text and colors.

use cover_core::error::{CoverError, Result};

use crate::design::{wrap_text, CoverDesign, Rgb, TextMetrics};

const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);

#[derive(Debug, Clone, PartialEq)]
pub struct CustomCoverOptions {
    pub title: String,
    pub author: String,
    /// Gradient start, `#rrggbb`.
    pub background: String,
    /// Gradient end, `#rrggbb`.
    pub accent: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CustomCoverOptions {
    fn default() -> Self {
        Self {
            title: "eBook".to_string(),
            author: "OCC Library".to_string(),
            background: "#2c3e50".to_string(),
            accent: "#3498db".to_string(),
            width: 400,
            height: 600,
        }
    }
}

impl CoverDesign {
    /// Title and author over a gradient with five decorative rings.
    pub fn custom(options: &CustomCoverOptions, metrics: &dyn TextMetrics) -> Result<CoverDesign> {
        let (width, height) = (options.width, options.height);
        if width == 0 || height == 0 {
            return Err(CoverError::EmptyFrame { width, height });
        }
        let background = Rgb::from_hex(&options.background)?;
        let accent = Rgb::from_hex(&options.accent)?;

        let w = width as f32;
        let h = height as f32;
        let cx = w / 2.0;
        let title_size = 28.0;
        let title_lines = wrap_text(&options.title, title_size, (w - 50.0).max(1.0), 4, metrics);
        // Centre the title block on the middle of the cover.
        let first_baseline = h / 2.0 - (title_lines.len().saturating_sub(1) as f32 * 36.0) / 2.0;

        Ok(CoverDesign::builder(width, height)
            .gradient(background, accent)
            .rings(cx, h / 2.0, 5, 100.0, 40.0, 3.0)
            .text("eBook", cx, h / 3.0, 40.0, WHITE)
            .lines(&title_lines, cx, first_baseline, 36.0, title_size, WHITE)
            .text(&options.author, cx, h - 100.0, 18.0, Rgb(0xcc, 0xcc, 0xcc))
            .build())
    }
}
