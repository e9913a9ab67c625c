//! Options shared by every stage of cover extraction.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoverError, Result};

/// Canonical cover thumbnail size (width, height).
pub const DEFAULT_COVER_SIZE: (u32, u32) = (300, 420);

/// Scale applied to the first PDF page before fitting; matches the browser preview.
pub const DEFAULT_RENDER_SCALE: f32 = 1.5;

pub const DEFAULT_JPEG_QUALITY: u8 = 85;

pub const DEFAULT_BRANDING: &str = "OCC Digital Library";

/// All options controlling cover extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverOptions {
    // -- General --
    pub verbose: u8,

    // -- Storage --
    /// Root of the upload tree. `ebooks/` and `covers/` live directly below it.
    pub storage_root: PathBuf,

    // -- Output --
    #[serde(
        serialize_with = "serialize_image_size",
        deserialize_with = "deserialize_image_size"
    )]
    pub cover_size: (u32, u32),
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,

    // -- Rendering --
    pub render_scale: f32,
    /// `pdftoppm` executable, looked up on `PATH` when not absolute.
    pub pdftoppm_path: PathBuf,

    // -- Placeholder --
    /// TrueType font used for placeholder text. When unset, system fonts are
    /// tried, then the bundled one.
    pub font_path: Option<PathBuf>,
    pub branding: String,
}

impl Default for CoverOptions {
    fn default() -> Self {
        Self {
            verbose: 0,
            storage_root: PathBuf::from("uploads"),
            cover_size: DEFAULT_COVER_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            render_scale: DEFAULT_RENDER_SCALE,
            pdftoppm_path: PathBuf::from("pdftoppm"),
            font_path: None,
            branding: DEFAULT_BRANDING.to_string(),
        }
    }
}

impl CoverOptions {
    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.cover_size;
        if w == 0 || h == 0 {
            return Err(CoverError::Config(format!(
                "cover_size must be positive, got {}x{}",
                w, h
            )));
        }
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(CoverError::Config(format!(
                "render_scale must be a positive number, got {}",
                self.render_scale
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(CoverError::Config(format!(
                "jpeg_quality must be within 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Parse a `WxH` size such as `300x420`.
pub fn parse_size(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.trim().split_once(['x', 'X'])?;
    let w = w.trim().parse().ok()?;
    let h = h.trim().parse().ok()?;
    Some((w, h))
}

/// Serialize `(u32, u32)` as `"WxH"` string.
fn serialize_image_size<S>(val: &(u32, u32), s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&format!("{}x{}", val.0, val.1))
}

/// Deserialize `(u32, u32)` from `"WxH"` string.
fn deserialize_image_size<'de, D>(d: D) -> std::result::Result<(u32, u32), D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    parse_size(&s)
        .ok_or_else(|| serde::de::Error::custom("expected format 'WxH' (e.g. '300x420')"))
}
