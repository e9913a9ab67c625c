//! Traits for the three stages of cover extraction.

use std::path::Path;

use crate::error::Result;
use crate::frame::{RasterFrame, RenderOutcome};

/// Renders the first page of a document to a raster.
pub trait PageRenderer: Send + Sync {
    /// Human-readable name of this renderer.
    fn name(&self) -> &str;

    /// Render page 1 of the given document bytes.
    /// Failures are reported in the outcome, never raised.
    fn render_first_page(&self, document: &[u8]) -> RenderOutcome;
}

/// Draws a stand-in cover when the real page cannot be rendered.
pub trait PlaceholderRenderer: Send + Sync {
    fn name(&self) -> &str;

    /// Draw a cover for `title`. Must not fail.
    fn render_placeholder(&self, title: &str) -> RasterFrame;
}

/// Fits a frame to the cover size and writes it to disk.
pub trait Finalizer: Send + Sync {
    fn name(&self) -> &str;

    /// Dimensions of every file this finalizer writes.
    fn target_size(&self) -> (u32, u32);

    /// Write `frame` to `output_path`. Errors here propagate to the pipeline.
    fn finalize(&self, frame: &RasterFrame, output_path: &Path) -> Result<()>;
}
