//! First-page rasterization via `pdftoppm` (poppler-utils).
//!
//! The document is piped on stdin and the page comes back as PPM on
//! stdout, so no temporary files are created. The call blocks until
//! `pdftoppm` exits.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use image::ImageFormat;

use cover_core::frame::{RasterFrame, RenderFailure};

use crate::viewport::Viewport;

/// Render page 1 of `pdf_bytes` at exactly `viewport` pixels.
pub fn rasterize_first_page(
    pdftoppm: &Path,
    pdf_bytes: &[u8],
    viewport: Viewport,
) -> Result<RasterFrame, RenderFailure> {
    log::debug!(
        "Rasterizing page 1 at {}x{} with {}",
        viewport.width,
        viewport.height,
        pdftoppm.display()
    );

    let mut child = Command::new(pdftoppm)
        .args(["-f", "1", "-l", "1", "-singlefile", "-cropbox"])
        .arg("-scale-to-x")
        .arg(viewport.width.to_string())
        .arg("-scale-to-y")
        .arg(viewport.height.to_string())
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            RenderFailure::Rasterizer(format!(
                "failed to run {} (is poppler-utils installed?): {}",
                pdftoppm.display(),
                e
            ))
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // pdftoppm may bail out before reading everything; its exit status
        // below carries the real reason.
        if let Err(e) = stdin.write_all(pdf_bytes) {
            log::debug!("pdftoppm closed stdin early: {}", e);
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| RenderFailure::Rasterizer(format!("pdftoppm did not finish: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RenderFailure::Rasterizer(format!(
            "pdftoppm failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }

    decode_pnm(&output.stdout)
}

/// Decode a PPM/PGM/PBM image into an opaque frame.
pub fn decode_pnm(data: &[u8]) -> Result<RasterFrame, RenderFailure> {
    if data.is_empty() {
        return Err(RenderFailure::Rasterizer("pdftoppm produced no image".to_string()));
    }
    let image = image::load_from_memory_with_format(data, ImageFormat::Pnm)
        .map_err(|e| RenderFailure::Rasterizer(format!("undecodable page image: {}", e)))?;
    RasterFrame::from_dynamic(image).map_err(|e| RenderFailure::Rasterizer(e.to_string()))
}
