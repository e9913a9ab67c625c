//! Transforms applied to a rendered frame before it is stored.

pub mod finalize;

pub use finalize::{cover_crop, cover_fit, encode_jpeg, CropBox, JpegFinalizer};
