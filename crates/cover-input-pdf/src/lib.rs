//! Rasterizes the first page of an uploaded PDF.

mod rasterize;
pub mod viewport;

use std::path::PathBuf;

use cover_core::frame::{RasterFrame, RenderFailure, RenderOutcome};
use cover_core::options::CoverOptions;
use cover_core::plugin::PageRenderer;
use cover_utils::mime;

pub use rasterize::decode_pnm;
pub use viewport::{PageBox, Viewport};

pub struct PdfPageRenderer {
    scale: f32,
    pdftoppm: PathBuf,
}

impl PdfPageRenderer {
    pub fn new(options: &CoverOptions) -> Self {
        Self {
            scale: options.render_scale,
            pdftoppm: options.pdftoppm_path.clone(),
        }
    }

    /// Viewport of page 1 at this renderer's scale, without rasterizing.
    pub fn first_page_viewport(&self, pdf_bytes: &[u8]) -> Result<Viewport, RenderFailure> {
        if !mime::has_pdf_header(pdf_bytes) {
            return Err(RenderFailure::Malformed("missing %PDF header".to_string()));
        }
        let doc = viewport::load_document(pdf_bytes)?;
        let page = viewport::first_page_box(&doc)?;
        Ok(viewport::viewport(page, self.scale))
    }

    fn render(&self, pdf_bytes: &[u8]) -> Result<RasterFrame, RenderFailure> {
        let viewport = self.first_page_viewport(pdf_bytes)?;
        let frame = rasterize::rasterize_first_page(&self.pdftoppm, pdf_bytes, viewport)?;
        if frame.dimensions() != (viewport.width, viewport.height) {
            log::debug!(
                "pdftoppm returned {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                viewport.width,
                viewport.height
            );
        }
        Ok(frame)
    }
}

impl PageRenderer for PdfPageRenderer {
    fn name(&self) -> &str {
        "PDF first page"
    }

    fn render_first_page(&self, document: &[u8]) -> RenderOutcome {
        self.render(document).into()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Dictionary, Document, Object, Stream};
    use std::process::Command;

    /// Build a PDF with `page_count` text pages. `page_extra` is merged into
    /// every page dictionary; `media_box` sits on the root `Pages` node so
    /// pages inherit it.
    pub(crate) fn build_pdf(
        page_count: usize,
        page_extra: Dictionary,
        media_box: Vec<Object>,
    ) -> Vec<u8> {
        let pages = (0..page_count)
            .map(|i| {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 36.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("Page {}", i + 1))]),
                    Operation::new("ET", vec![]),
                ]
            })
            .collect();
        build_pdf_with(pages, page_extra, media_box)
    }

    /// Letter pages, each painted edge to edge in one RGB colour.
    fn solid_pages_pdf(colors: &[[i64; 3]]) -> Vec<u8> {
        let pages = colors
            .iter()
            .map(|&[r, g, b]| {
                vec![
                    Operation::new("rg", vec![r.into(), g.into(), b.into()]),
                    Operation::new("re", vec![0.into(), 0.into(), 612.into(), 792.into()]),
                    Operation::new("f", vec![]),
                ]
            })
            .collect();
        build_pdf_with(pages, dictionary! {}, vec![0.into(), 0.into(), 612.into(), 792.into()])
    }

    fn build_pdf_with(
        pages: Vec<Vec<Operation>>,
        page_extra: Dictionary,
        media_box: Vec<Object>,
    ) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let page_count = pages.len();
        let mut kids: Vec<Object> = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            };
            for (key, value) in page_extra.iter() {
                page.set(key.clone(), value.clone());
            }
            kids.push(doc.add_object(page).into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn letter_pdf(pages: usize) -> Vec<u8> {
        build_pdf(pages, dictionary! {}, vec![0.into(), 0.into(), 612.into(), 792.into()])
    }

    fn pdftoppm_available() -> bool {
        Command::new("pdftoppm").arg("-v").output().is_ok()
    }

    #[test]
    fn test_viewport_uses_render_scale() {
        let renderer = PdfPageRenderer::new(&CoverOptions::default());
        let vp = renderer.first_page_viewport(&letter_pdf(3)).unwrap();
        assert_eq!(vp, Viewport { width: 918, height: 1188 });
    }

    #[test]
    fn test_non_pdf_bytes_fail_without_panicking() {
        let renderer = PdfPageRenderer::new(&CoverOptions::default());
        let outcome = renderer.render_first_page(b"<html>not a pdf</html>");
        assert!(matches!(
            outcome,
            RenderOutcome::Failed(RenderFailure::Malformed(_))
        ));
    }

    #[test]
    fn test_truncated_pdf_fails() {
        let renderer = PdfPageRenderer::new(&CoverOptions::default());
        let pdf = letter_pdf(1);
        let outcome = renderer.render_first_page(&pdf[..40]);
        assert!(!outcome.is_rendered());
    }

    #[test]
    fn test_missing_rasterizer_fails() {
        let mut opts = CoverOptions::default();
        opts.pdftoppm_path = PathBuf::from("/nonexistent/pdftoppm");
        let renderer = PdfPageRenderer::new(&opts);
        let outcome = renderer.render_first_page(&letter_pdf(1));
        assert!(matches!(
            outcome,
            RenderOutcome::Failed(RenderFailure::Rasterizer(_))
        ));
    }

    #[test]
    fn test_renders_first_page_when_pdftoppm_installed() {
        if !pdftoppm_available() {
            eprintln!("pdftoppm not installed; skipping");
            return;
        }
        let renderer = PdfPageRenderer::new(&CoverOptions::default());
        match renderer.render_first_page(&letter_pdf(3)) {
            RenderOutcome::Rendered(frame) => {
                assert_eq!(frame.dimensions(), (918, 1188));
                assert!(frame.is_opaque());
                // Blank corner of the page is white paper.
                assert_eq!(frame.as_rgba().get_pixel(900, 1170).0, [255, 255, 255, 255]);
            }
            RenderOutcome::Failed(reason) => panic!("render failed: {}", reason),
        }
    }

    #[test]
    fn test_only_first_page_is_rasterized() {
        if !pdftoppm_available() {
            eprintln!("pdftoppm not installed; skipping first page colour check");
            return;
        }
        // Page 1 red, page 2 blue, page 3 green.
        let pdf = solid_pages_pdf(&[[1, 0, 0], [0, 0, 1], [0, 1, 0]]);
        let renderer = PdfPageRenderer::new(&CoverOptions::default());
        match renderer.render_first_page(&pdf) {
            RenderOutcome::Rendered(frame) => {
                assert_eq!(frame.dimensions(), (918, 1188));
                for (x, y) in [(10, 10), (459, 20), (900, 100), (459, 1170)] {
                    let [r, g, b, _] = frame.as_rgba().get_pixel(x, y).0;
                    assert!(r > 200 && g < 60 && b < 60, "({}, {}) is {:?}", x, y, (r, g, b));
                }
            }
            RenderOutcome::Failed(reason) => panic!("render failed: {}", reason),
        }
    }
}
