//! Placeholder covers, drawn when the first page of a PDF is unavailable.

pub mod canvas;
pub mod custom;
pub mod design;

use cover_core::frame::RasterFrame;
use cover_core::options::CoverOptions;
use cover_core::plugin::PlaceholderRenderer;

pub use canvas::CanvasRenderer;
pub use custom::CustomCoverOptions;
pub use design::{CoverDesign, DrawCommand, FixedAdvance, Rgb, TextMetrics};

/// Gradient cover with the book title and library branding.
pub struct PlaceholderCover {
    branding: String,
    canvas: CanvasRenderer,
}

impl PlaceholderCover {
    pub fn new(options: &CoverOptions) -> Self {
        Self {
            branding: options.branding.clone(),
            canvas: CanvasRenderer::discover(options.font_path.as_deref()),
        }
    }

    pub fn with_canvas(branding: &str, canvas: CanvasRenderer) -> Self {
        Self {
            branding: branding.to_string(),
            canvas,
        }
    }

    pub fn design(&self, title: &str) -> CoverDesign {
        CoverDesign::placeholder(title, &self.branding, &self.canvas)
    }
}

impl PlaceholderRenderer for PlaceholderCover {
    fn name(&self) -> &str {
        "gradient"
    }

    fn render_placeholder(&self, title: &str) -> RasterFrame {
        self.canvas.render(&self.design(title))
    }
}
