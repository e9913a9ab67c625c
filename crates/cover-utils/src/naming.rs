//! File naming for uploaded ebooks and their generated covers.
//!
//! Cover files are named `cover-<stem>-<uuid>.jpg`. The stem keeps the
//! upload recognisable on disk; the UUID keeps two uploads of the same file
//! from colliding.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// Longest sanitized stem kept in a cover file name (in chars).
const MAX_STEM_CHARS: usize = 48;

/// Title used when a file name has no usable characters.
pub const UNTITLED: &str = "Untitled";

static TITLE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());
static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap());
static REPEATED_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// File name without directory or extension. Empty when the path has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Human-readable title from a file stem.
///
/// Every run of non-alphanumeric characters becomes a single space:
/// `intro-to-computing` → `intro to computing`.
pub fn display_title(stem: &str) -> String {
    let title = TITLE_SEPARATORS.replace_all(stem, " ");
    let title = title.trim();
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

/// Stem reduced to characters that are safe in a file name on any platform.
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(stem, "-");
    let cleaned = REPEATED_DASHES.replace_all(&cleaned, "-");
    let cleaned: String = cleaned
        .trim_matches('-')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    let cleaned = cleaned.trim_end_matches('-');
    if cleaned.is_empty() {
        "ebook".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Unique cover file name for an upload with the given stem.
pub fn cover_file_name(stem: &str) -> String {
    format!("cover-{}-{}.jpg", sanitize_stem(stem), Uuid::new_v4())
}
