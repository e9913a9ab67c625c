//! Extraction orchestrator: render attempt, placeholder fallback, finalize.
//!
//! Each call walks one path through
//!   START → RENDER_ATTEMPT → (RENDER_OK | RENDER_FAILED → PLACEHOLDER)
//!         → FINALIZE → DONE(path) | DONE(None)
//! and every stage runs at most once. Only a finalize failure can stop
//! a cover from being written.

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde::Serialize;

use cover_utils::naming;

use crate::error::{CoverError, Result};
use crate::frame::{CoverSource, RasterFrame, RenderFailure, RenderOutcome};
use crate::plugin::{Finalizer, PageRenderer, PlaceholderRenderer};

/// A cover written by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedCover {
    pub path: PathBuf,
    pub file_name: String,
    pub source: CoverSource,
    pub width: u32,
    pub height: u32,
}

/// The cover extraction pipeline.
pub struct CoverPipeline {
    renderer: Box<dyn PageRenderer>,
    placeholder: Box<dyn PlaceholderRenderer>,
    finalizer: Box<dyn Finalizer>,
}

impl CoverPipeline {
    pub fn new(
        renderer: Box<dyn PageRenderer>,
        placeholder: Box<dyn PlaceholderRenderer>,
        finalizer: Box<dyn Finalizer>,
    ) -> Self {
        Self {
            renderer,
            placeholder,
            finalizer,
        }
    }

    /// Write a cover for `pdf_path` into `output_dir`.
    ///
    /// Returns the absolute path of the new JPEG, or `None` when it could
    /// not be written. The caller treats `None` as "no cover", not as a
    /// failed upload.
    pub fn extract(&self, pdf_path: &Path, output_dir: &Path) -> Option<PathBuf> {
        self.extract_titled(pdf_path, output_dir, None)
    }

    /// Like [`extract`](Self::extract), with an explicit placeholder title.
    pub fn extract_titled(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        title: Option<&str>,
    ) -> Option<PathBuf> {
        match self.run(pdf_path, output_dir, title) {
            Ok(cover) => Some(cover.path),
            Err(e) => {
                error!(
                    "No cover for {}, continuing without one: {}",
                    pdf_path.display(),
                    e
                );
                None
            }
        }
    }

    /// Fallible form of [`extract_titled`](Self::extract_titled).
    /// Only finalize errors are returned.
    pub fn run(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        title: Option<&str>,
    ) -> Result<ExtractedCover> {
        let stem = naming::file_stem(pdf_path);
        let file_name = naming::cover_file_name(&stem);
        let output_dir =
            std::path::absolute(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
        let output_path = output_dir.join(&file_name);

        debug!(
            "Rendering first page of {} with {}",
            pdf_path.display(),
            self.renderer.name()
        );
        let outcome = self.attempt_render(pdf_path);

        let display_title = match title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => naming::display_title(&stem),
        };
        let (frame, source) = self.resolve(outcome, pdf_path, &display_title);

        if let Err(e) = self.finalizer.finalize(&frame, &output_path) {
            error!(
                "{} could not write {}: {}",
                self.finalizer.name(),
                output_path.display(),
                e
            );
            return Err(e);
        }

        let (width, height) = self.finalizer.target_size();
        info!("Cover created ({}): {}", source, file_name);

        Ok(ExtractedCover {
            path: output_path,
            file_name,
            source,
            width,
            height,
        })
    }

    fn attempt_render(&self, pdf_path: &Path) -> RenderOutcome {
        match std::fs::read(pdf_path) {
            Ok(bytes) => self.renderer.render_first_page(&bytes),
            Err(e) => RenderOutcome::Failed(RenderFailure::Unreadable(e)),
        }
    }

    /// Pick the frame to finalize. Pure over the render outcome.
    fn resolve(
        &self,
        outcome: RenderOutcome,
        pdf_path: &Path,
        title: &str,
    ) -> (RasterFrame, CoverSource) {
        match outcome {
            RenderOutcome::Rendered(frame) => (frame, CoverSource::Rendered),
            RenderOutcome::Failed(reason) => {
                warn!(
                    "Could not render {} ({}); drawing {} placeholder",
                    pdf_path.display(),
                    reason,
                    self.placeholder.name()
                );
                (
                    self.placeholder.render_placeholder(title),
                    CoverSource::Placeholder,
                )
            }
        }
    }
}

/// Builder for a [`CoverPipeline`].
pub struct PipelineBuilder {
    renderer: Option<Box<dyn PageRenderer>>,
    placeholder: Option<Box<dyn PlaceholderRenderer>>,
    finalizer: Option<Box<dyn Finalizer>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            renderer: None,
            placeholder: None,
            finalizer: None,
        }
    }

    pub fn renderer(mut self, renderer: Box<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn placeholder(mut self, placeholder: Box<dyn PlaceholderRenderer>) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn finalizer(mut self, finalizer: Box<dyn Finalizer>) -> Self {
        self.finalizer = Some(finalizer);
        self
    }

    pub fn build(self) -> Result<CoverPipeline> {
        let renderer = self
            .renderer
            .ok_or_else(|| CoverError::Pipeline("No page renderer specified".into()))?;
        let placeholder = self
            .placeholder
            .ok_or_else(|| CoverError::Pipeline("No placeholder renderer specified".into()))?;
        let finalizer = self
            .finalizer
            .ok_or_else(|| CoverError::Pipeline("No finalizer specified".into()))?;

        Ok(CoverPipeline::new(renderer, placeholder, finalizer))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
