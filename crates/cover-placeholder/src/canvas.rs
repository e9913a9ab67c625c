//! Replays a [`CoverDesign`] onto an RGBA canvas.
//!
//! Gradients, rings and panels are blended per pixel. Text goes through
//! `imageproc` with a TrueType font: the configured one, a system font, or
//! the DejaVu Sans Bold copy compiled into this crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use once_cell::sync::Lazy;

use cover_core::frame::RasterFrame;

use crate::design::{CoverDesign, DrawCommand, FixedAdvance, Rgb, TextMetrics};

/// Bold sans fonts commonly present on servers and desktops, in lookup order.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// DejaVu Sans Bold (Bitstream Vera license, see `assets/DejaVuSans-LICENSE.txt`).
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

/// Fonts already discovered, keyed by the configured path.
static FONT_CACHE: Lazy<Mutex<HashMap<Option<PathBuf>, Option<FontArc>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub struct CanvasRenderer {
    font: Option<FontArc>,
}

impl CanvasRenderer {
    /// Use `font_path` when it loads, else the first system font that does,
    /// else the bundled font. Discovery runs once per `font_path` per process.
    pub fn discover(font_path: Option<&Path>) -> Self {
        let key = font_path.map(Path::to_path_buf);
        let mut cache = match FONT_CACHE.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        let font = cache
            .entry(key)
            .or_insert_with_key(|key| find_font(key.as_deref()))
            .clone();
        Self { font }
    }

    /// A renderer using only the bundled font.
    pub fn bundled() -> Self {
        Self {
            font: bundled_font(),
        }
    }

    /// A renderer that draws shapes only.
    pub fn without_text() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw every command of `design` in order.
    pub fn render(&self, design: &CoverDesign) -> RasterFrame {
        let width = design.width.max(1);
        let height = design.height.max(1);
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        for command in &design.commands {
            match command {
                DrawCommand::LinearGradient { from, to } => fill_gradient(&mut canvas, *from, *to),
                DrawCommand::Ring {
                    cx,
                    cy,
                    radius,
                    stroke,
                    color,
                    opacity,
                } => stroke_ring(&mut canvas, *cx, *cy, *radius, *stroke, *color, *opacity),
                DrawCommand::Panel {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    fill_opacity,
                    stroke,
                    stroke_color,
                } => draw_panel(
                    &mut canvas,
                    (*x, *y, *width, *height),
                    *fill,
                    *fill_opacity,
                    *stroke,
                    *stroke_color,
                ),
                DrawCommand::Text {
                    text,
                    cx,
                    baseline,
                    size,
                    color,
                } => {
                    if let Some(font) = &self.font {
                        draw_centered_text(&mut canvas, font, text, *cx, *baseline, *size, *color);
                    }
                }
            }
        }

        // Size was clamped to at least 1x1 above.
        match RasterFrame::from_rgba(canvas) {
            Ok(frame) => frame,
            Err(e) => unreachable!("canvas has positive size: {}", e),
        }
    }
}

impl TextMetrics for CanvasRenderer {
    /// Rendered width with the loaded font, else the fixed advance.
    fn text_width(&self, text: &str, size: f32) -> f32 {
        match &self.font {
            Some(font) => text_size(PxScale::from(size), font, text).0 as f32,
            None => FixedAdvance.text_width(text, size),
        }
    }
}

fn find_font(font_path: Option<&Path>) -> Option<FontArc> {
    let candidates = font_path
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

    for path in candidates {
        if let Some(font) = load_font(&path) {
            log::debug!("Placeholder font: {}", path.display());
            return Some(font);
        }
    }

    log::warn!("No system TrueType font found; using bundled DejaVu Sans Bold");
    bundled_font()
}

fn bundled_font() -> Option<FontArc> {
    match FontArc::try_from_slice(BUNDLED_FONT) {
        Ok(font) => Some(font),
        Err(e) => {
            log::error!("Bundled font is unreadable, covers will have no text: {}", e);
            None
        }
    }
}

fn load_font(path: &Path) -> Option<FontArc> {
    let data = std::fs::read(path).ok()?;
    match FontArc::try_from_vec(data) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("Ignoring unreadable font {}: {}", path.display(), e);
            None
        }
    }
}

fn blend(px: &mut Rgba<u8>, color: Rgb, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let mix = |dst: u8, src: u8| (dst as f32 + (src as f32 - dst as f32) * alpha).round() as u8;
    px[0] = mix(px[0], color.0);
    px[1] = mix(px[1], color.1);
    px[2] = mix(px[2], color.2);
    px[3] = 255;
}

/// Diagonal gradient: t is the projection of the pixel onto (0,0)→(w,h).
fn fill_gradient(canvas: &mut RgbaImage, from: Rgb, to: Rgb) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let len_sq = w * w + h * h;
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        let t = ((x as f32 + 0.5) * w + (y as f32 + 0.5) * h) / len_sq;
        let c = from.lerp(to, t);
        *px = Rgba([c.0, c.1, c.2, 255]);
    }
}

/// Anti-aliased circle outline of width `stroke` centred on `radius`.
fn stroke_ring(
    canvas: &mut RgbaImage,
    cx: f32,
    cy: f32,
    radius: f32,
    stroke: f32,
    color: Rgb,
    opacity: f32,
) {
    let half = stroke / 2.0;
    let outer = radius + half + 1.0;
    let x0 = (cx - outer).floor().max(0.0) as u32;
    let y0 = (cy - outer).floor().max(0.0) as u32;
    let x1 = ((cx + outer).ceil() as u32).min(canvas.width());
    let y1 = ((cy + outer).ceil() as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let distance = (dx * dx + dy * dy).sqrt();
            let coverage = (half + 0.5 - (distance - radius).abs()).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend(canvas.get_pixel_mut(x, y), color, opacity * coverage);
            }
        }
    }
}

fn draw_panel(
    canvas: &mut RgbaImage,
    (x, y, width, height): (f32, f32, f32, f32),
    fill: Rgb,
    fill_opacity: f32,
    stroke: f32,
    stroke_color: Rgb,
) {
    let half = stroke / 2.0;
    let (cw, ch) = (canvas.width() as f32, canvas.height() as f32);
    let x0 = (x - half).floor().clamp(0.0, cw) as u32;
    let y0 = (y - half).floor().clamp(0.0, ch) as u32;
    let x1 = (x + width + half).ceil().clamp(0.0, cw) as u32;
    let y1 = (y + height + half).ceil().clamp(0.0, ch) as u32;

    for py in y0..y1 {
        for px in x0..x1 {
            let (fx, fy) = (px as f32 + 0.5, py as f32 + 0.5);
            let inside = fx >= x && fx < x + width && fy >= y && fy < y + height;
            let in_inner = fx >= x + half
                && fx < x + width - half
                && fy >= y + half
                && fy < y + height - half;
            let pixel = canvas.get_pixel_mut(px, py);
            if !in_inner {
                blend(pixel, stroke_color, 1.0);
            } else if inside {
                blend(pixel, fill, fill_opacity);
            }
        }
    }
}

fn draw_centered_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    cx: f32,
    baseline: f32,
    size: f32,
    color: Rgb,
) {
    let scale = PxScale::from(size);
    let (text_width, _) = text_size(scale, font, text);
    let ascent = font.as_scaled(scale).ascent();
    let x = (cx - text_width as f32 / 2.0).round() as i32;
    let y = (baseline - ascent).round() as i32;
    draw_text_mut(canvas, Rgba([color.0, color.1, color.2, 255]), x, y, scale, font, text);
}
