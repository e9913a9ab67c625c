//! Raster frames and the tagged outcome of a page render.

use std::fmt;

use image::{DynamicImage, Rgba, RgbaImage};
use serde::Serialize;
use thiserror::Error;

use crate::error::{CoverError, Result};

/// An opaque RGBA pixel grid with positive dimensions.
///
/// Produced either by rasterizing a PDF page or by drawing a placeholder.
/// Translucent input is composited onto white at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFrame {
    pixels: RgbaImage,
}

impl RasterFrame {
    pub fn from_rgba(mut pixels: RgbaImage) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(CoverError::EmptyFrame { width, height });
        }
        for px in pixels.pixels_mut() {
            flatten_onto_white(px);
        }
        Ok(Self { pixels })
    }

    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        Self::from_rgba(image.into_rgba8())
    }

    /// A white frame.
    pub fn blank(width: u32, height: u32) -> Result<Self> {
        Self::from_rgba(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        ))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    pub fn is_opaque(&self) -> bool {
        self.pixels.pixels().all(|px| px[3] == 255)
    }
}

/// Composite a pixel over an opaque white background.
fn flatten_onto_white(px: &mut Rgba<u8>) {
    let alpha = px[3] as u32;
    if alpha == 255 {
        return;
    }
    for c in 0..3 {
        let value = px[c] as u32 * alpha + 255 * (255 - alpha);
        px[c] = ((value + 127) / 255) as u8;
    }
    px[3] = 255;
}

/// Why the first page of an upload could not be rendered.
///
/// Every variant is recoverable: the pipeline substitutes a placeholder.
#[derive(Error, Debug)]
pub enum RenderFailure {
    #[error("cannot read upload: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("malformed PDF: {0}")]
    Malformed(String),

    #[error("document has no pages")]
    NoPages,

    #[error("invalid first page: {0}")]
    InvalidPage(String),

    #[error("rasterizer failed: {0}")]
    Rasterizer(String),
}

/// Result of a render attempt. Failure is data here, not control flow.
#[derive(Debug)]
pub enum RenderOutcome {
    Rendered(RasterFrame),
    Failed(RenderFailure),
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered(_))
    }
}

impl From<std::result::Result<RasterFrame, RenderFailure>> for RenderOutcome {
    fn from(result: std::result::Result<RasterFrame, RenderFailure>) -> Self {
        match result {
            Ok(frame) => RenderOutcome::Rendered(frame),
            Err(reason) => RenderOutcome::Failed(reason),
        }
    }
}

/// Where the pixels of a cover came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverSource {
    Rendered,
    Placeholder,
}

impl fmt::Display for CoverSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverSource::Rendered => write!(f, "first page"),
            CoverSource::Placeholder => write!(f, "placeholder"),
        }
    }
}
