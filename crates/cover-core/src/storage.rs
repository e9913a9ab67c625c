//! On-disk layout of the upload tree and the cover contract with the
//! upload handler.
//!
//! ```text
//! <storage_root>/
//!   ebooks/   uploaded PDFs
//!   covers/   generated JPEG covers, served as /uploads/covers/<file>
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::options::CoverOptions;

pub const EBOOKS_DIR: &str = "ebooks";
pub const COVERS_DIR: &str = "covers";

/// URL prefix the web server mounts the storage root under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Cover fields persisted on an ebook record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverRecord {
    pub cover_image_path: Option<PathBuf>,
    pub cover_url: Option<String>,
}

/// The upload tree rooted at a single, explicitly configured directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_options(options: &CoverOptions) -> Self {
        Self::new(&options.storage_root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ebooks_dir(&self) -> PathBuf {
        self.root.join(EBOOKS_DIR)
    }

    pub fn covers_dir(&self) -> PathBuf {
        self.root.join(COVERS_DIR)
    }

    /// Create the root, `ebooks/` and `covers/` if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.root.clone(), self.ebooks_dir(), self.covers_dir()] {
            if !dir.is_dir() {
                log::info!("Creating {}", dir.display());
                std::fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    /// Public URL for a cover file: `/uploads/covers/<file name>`.
    pub fn public_cover_url(&self, cover_path: &Path) -> Option<String> {
        let name = cover_path.file_name()?.to_str()?;
        Some(format!("{}/{}/{}", PUBLIC_PREFIX, COVERS_DIR, name))
    }

    /// Record fields for an extraction result. `None` persists as null.
    pub fn cover_record(&self, cover_path: Option<PathBuf>) -> CoverRecord {
        let cover_url = cover_path
            .as_deref()
            .and_then(|p| self.public_cover_url(p));
        CoverRecord {
            cover_image_path: cover_path,
            cover_url,
        }
    }

    /// Delete an orphaned cover, e.g. when the upload fails after extraction.
    /// A file that is already gone counts as removed.
    pub fn discard_cover(&self, cover_path: &Path) -> bool {
        remove_if_present(cover_path)
    }

    /// Delete an ebook's PDF and, when it has one, its cover.
    pub fn remove_ebook_files(&self, pdf_path: &Path, cover_path: Option<&Path>) -> bool {
        let pdf_removed = remove_if_present(pdf_path);
        let cover_removed = cover_path.map(remove_if_present).unwrap_or(true);
        pdf_removed && cover_removed
    }
}

fn remove_if_present(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed {}", path.display());
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            log::error!("Error deleting {}: {}", path.display(), e);
            false
        }
    }
}
