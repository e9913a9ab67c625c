//! Fits a frame to the cover size and writes it as JPEG.
//!
//! Uses fast_image_resize for SIMD-accelerated resizing (SSE4.1, AVX2 on
//! x86; NEON on ARM), with the image crate as fallback.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::buffer::ConvertBuffer;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

use cover_core::error::{CoverError, Result};
use cover_core::frame::RasterFrame;
use cover_core::options::CoverOptions;
use cover_core::plugin::Finalizer;

/// Writes covers of one fixed size and JPEG quality.
pub struct JpegFinalizer {
    width: u32,
    height: u32,
    quality: u8,
}

impl JpegFinalizer {
    pub fn new(options: &CoverOptions) -> Self {
        let (width, height) = options.cover_size;
        Self::with_size(width, height, options.jpeg_quality)
    }

    pub fn with_size(width: u32, height: u32, quality: u8) -> Self {
        Self {
            width,
            height,
            quality,
        }
    }

    /// Fitted and encoded cover bytes, without touching the disk.
    pub fn encode(&self, frame: &RasterFrame) -> Result<Vec<u8>> {
        let fitted = cover_fit(frame, self.width, self.height)?;
        encode_jpeg(&fitted, self.quality)
    }
}

impl Finalizer for JpegFinalizer {
    fn name(&self) -> &str {
        "JPEG"
    }

    fn target_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn finalize(&self, frame: &RasterFrame, output_path: &Path) -> Result<()> {
        let data = self.encode(frame)?;
        std::fs::write(output_path, &data)?;
        log::debug!(
            "Wrote {}x{} cover ({} bytes) to {}",
            self.width,
            self.height,
            data.len(),
            output_path.display()
        );
        Ok(())
    }
}

/// Source region kept by a cover fit, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Largest source region with the target's aspect ratio.
///
/// Wider sources lose equal amounts on both sides; taller sources keep
/// their top rows and lose the bottom, so a book's title stays in frame.
pub fn cover_crop(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> CropBox {
    let (sw, sh) = (src_w as f64, src_h as f64);
    let dst_ratio = dst_w as f64 / dst_h as f64;

    if sw / sh > dst_ratio {
        let width = sh * dst_ratio;
        CropBox {
            left: (sw - width) / 2.0,
            top: 0.0,
            width,
            height: sh,
        }
    } else {
        CropBox {
            left: 0.0,
            top: 0.0,
            width: sw,
            height: sw / dst_ratio,
        }
    }
}

/// Scale to fill `width`x`height`, cropping the excess (top-anchored).
/// The result is always exactly `width`x`height`.
pub fn cover_fit(frame: &RasterFrame, width: u32, height: u32) -> Result<RgbaImage> {
    use fast_image_resize::images::{Image, ImageRef};
    use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};

    if width == 0 || height == 0 {
        return Err(CoverError::EmptyFrame { width, height });
    }

    let (src_w, src_h) = frame.dimensions();
    let crop = cover_crop(src_w, src_h, width, height);

    // Borrow the frame's pixels; frames are always opaque RGBA8.
    let pixels = frame.as_rgba().as_raw();
    let src_image = match ImageRef::new(src_w, src_h, pixels, PixelType::U8x4) {
        Ok(view) => view,
        Err(e) => {
            log::warn!("Cannot view {}x{} frame ({}), falling back", src_w, src_h, e);
            return Ok(fit_fallback(frame, crop, width, height));
        }
    };

    let mut dst_image = Image::new(width, height, PixelType::U8x4);
    let options = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3))
        .crop(crop.left, crop.top, crop.width, crop.height);

    let mut resizer = Resizer::new();
    if let Err(e) = resizer.resize(&src_image, &mut dst_image, &options) {
        log::warn!(
            "fast_image_resize failed ({}x{} → {}x{}): {}, falling back",
            src_w,
            src_h,
            width,
            height,
            e
        );
        return Ok(fit_fallback(frame, crop, width, height));
    }

    match RgbaImage::from_raw(width, height, dst_image.into_vec()) {
        Some(rgba) => Ok(rgba),
        None => Ok(fit_fallback(frame, crop, width, height)),
    }
}

/// image crate crop + resize, used when fast_image_resize can't handle the input.
fn fit_fallback(frame: &RasterFrame, crop: CropBox, width: u32, height: u32) -> RgbaImage {
    let src = frame.as_rgba();
    let left = (crop.left.round() as u32).min(src.width() - 1);
    let top = (crop.top.round() as u32).min(src.height() - 1);
    let crop_w = (crop.width.round() as u32).clamp(1, src.width() - left);
    let crop_h = (crop.height.round() as u32).clamp(1, src.height() - top);

    let cropped = image::imageops::crop_imm(src, left, top, crop_w, crop_h).to_image();
    image::imageops::resize(
        &cropped,
        width,
        height,
        image::imageops::FilterType::Lanczos3,
    )
}

/// Encode as baseline RGB JPEG. Quality is clamped to 1-100.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let rgb: RgbImage = image.convert();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality.clamp(1, 100));
    encoder
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| CoverError::Image(format!("JPEG encoding failed: {}", e)))?;
    Ok(buf)
}
