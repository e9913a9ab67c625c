//! MIME type detection and PDF sniffing.

use std::path::Path;

/// Magic bytes that open every PDF file header.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Readers tolerate junk before the header; this is how far we look for it.
const PDF_HEADER_WINDOW: usize = 1024;

/// Detect MIME type from a file extension.
pub fn mime_from_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Detect MIME type from a file path.
pub fn mime_from_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map(mime_from_extension)
        .unwrap_or("application/octet-stream")
}

/// True when the path carries a `.jpg` or `.jpeg` extension (any case).
pub fn is_jpeg_path(path: &Path) -> bool {
    mime_from_path(path) == "image/jpeg"
}

/// True when the path carries a `.pdf` extension (any case).
pub fn is_pdf_path(path: &Path) -> bool {
    mime_from_path(path) == "application/pdf"
}

/// True when a `%PDF-` header appears within the first kilobyte.
pub fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(PDF_HEADER_WINDOW)];
    window
        .windows(PDF_MAGIC.len())
        .any(|w| w == PDF_MAGIC)
}
