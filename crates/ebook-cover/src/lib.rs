//! ebook-cover: cover thumbnails for uploaded PDF ebooks.
//!
//! Wires the first-page renderer, the gradient placeholder and the JPEG
//! finalizer into one [`CoverPipeline`].

use std::path::{Path, PathBuf};

use cover_core::error::Result;
use cover_core::options::CoverOptions;
use cover_core::pipeline::{CoverPipeline, PipelineBuilder};
use cover_core::plugin::{Finalizer, PlaceholderRenderer};
use cover_input_pdf::PdfPageRenderer;
use cover_placeholder::{CanvasRenderer, CoverDesign, CustomCoverOptions, PlaceholderCover};
use cover_transforms::JpegFinalizer;
use cover_utils::{mime, naming};

pub use cover_core::pipeline::ExtractedCover;
pub use cover_core::storage::{CoverRecord, StorageLayout};

/// The standard pipeline: pdftoppm render, gradient placeholder, JPEG.
pub fn default_pipeline(options: &CoverOptions) -> Result<CoverPipeline> {
    options.validate()?;
    PipelineBuilder::new()
        .renderer(Box::new(PdfPageRenderer::new(options)))
        .placeholder(Box::new(PlaceholderCover::new(options)))
        .finalizer(Box::new(JpegFinalizer::new(options)))
        .build()
}

/// Extract a cover for `pdf_path` into `output_dir`.
///
/// `None` means no cover could be written; the upload should still go ahead.
pub fn extract_cover(
    options: &CoverOptions,
    pdf_path: &Path,
    output_dir: &Path,
) -> Option<PathBuf> {
    match default_pipeline(options) {
        Ok(pipeline) => pipeline.extract(pdf_path, output_dir),
        Err(e) => {
            log::error!("Cover pipeline unavailable: {}", e);
            None
        }
    }
}

/// Write a placeholder cover titled after `name` without reading any PDF.
pub fn render_placeholder_cover(
    options: &CoverOptions,
    name: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    options.validate()?;
    let stem = naming::file_stem(Path::new(name));
    let output_path = std::path::absolute(output_dir)?.join(naming::cover_file_name(&stem));

    let frame = PlaceholderCover::new(options).render_placeholder(&naming::display_title(&stem));
    JpegFinalizer::new(options).finalize(&frame, &output_path)?;
    log::info!("Placeholder cover created: {}", output_path.display());
    Ok(output_path)
}

/// Draw a styled cover and write it at its own size to `output_path`.
pub fn write_custom_cover(
    options: &CoverOptions,
    custom: &CustomCoverOptions,
    output_path: &Path,
) -> Result<()> {
    if !mime::is_jpeg_path(output_path) {
        log::warn!("{} does not end in .jpg; writing JPEG anyway", output_path.display());
    }
    let canvas = CanvasRenderer::discover(options.font_path.as_deref());
    let design = CoverDesign::custom(custom, &canvas)?;
    let frame = canvas.render(&design);
    JpegFinalizer::with_size(custom.width, custom.height, options.jpeg_quality)
        .finalize(&frame, output_path)?;
    log::info!("Custom cover created: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cover_core::frame::CoverSource;
    use image::GenericImageView;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use tempfile::TempDir;

    /// One US Letter page with a red band near the top.
    fn letter_pdf() -> Vec<u8> {
        banded_pdf(&[[1, 0, 0]])
    }

    /// US Letter pages, each with a band near the top in its own colour.
    fn banded_pdf(colors: &[[i64; 3]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();
        for &[r, g, b] in colors {
            let content = Content {
                operations: vec![
                    Operation::new("rg", vec![r.into(), g.into(), b.into()]),
                    Operation::new(
                        "re",
                        vec![50.into(), 600.into(), 512.into(), 150.into()],
                    ),
                    Operation::new("f", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn pdftoppm_available() -> bool {
        std::process::Command::new("pdftoppm")
            .arg("-v")
            .output()
            .is_ok()
    }

    fn setup() -> (TempDir, StorageLayout) {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(dir.path().join("uploads"));
        layout.ensure_dirs().unwrap();
        (dir, layout)
    }

    fn assert_canonical_jpeg(path: &Path) {
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        let img = image::open(path).unwrap();
        assert_eq!(img.dimensions(), (300, 420));
    }

    #[test]
    fn test_valid_pdf_gets_canonical_cover() {
        let (_dir, layout) = setup();
        let pdf = layout.ebooks_dir().join("networks.pdf");
        std::fs::write(&pdf, letter_pdf()).unwrap();

        let path = extract_cover(&CoverOptions::default(), &pdf, &layout.covers_dir()).unwrap();
        assert!(path.is_absolute());
        assert!(path.starts_with(std::path::absolute(layout.covers_dir()).unwrap()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("cover-networks-"));
        assert_canonical_jpeg(&path);
    }

    #[test]
    fn test_rendered_source_when_pdftoppm_present() {
        if !pdftoppm_available() {
            eprintln!("pdftoppm not installed; skipping rendered cover check");
            return;
        }
        let (_dir, layout) = setup();
        let pdf = layout.ebooks_dir().join("networks.pdf");
        std::fs::write(&pdf, letter_pdf()).unwrap();

        let pipeline = default_pipeline(&CoverOptions::default()).unwrap();
        let cover = pipeline.run(&pdf, &layout.covers_dir(), None).unwrap();
        assert_eq!(cover.source, CoverSource::Rendered);
        // The red band sits in the top of the page, inside the cover crop.
        let img = image::open(&cover.path).unwrap().to_rgb8();
        let px = img.get_pixel(150, 60);
        assert!(px[0] > 150 && px[1] < 100, "{:?}", px);
    }

    #[test]
    fn test_cover_comes_from_first_of_many_pages() {
        if !pdftoppm_available() {
            eprintln!("pdftoppm not installed; skipping first page cover check");
            return;
        }
        let (_dir, layout) = setup();
        let pdf = layout.ebooks_dir().join("syllabus.pdf");
        // Red band on page 1, blue on page 2, green on page 3.
        std::fs::write(&pdf, banded_pdf(&[[1, 0, 0], [0, 0, 1], [0, 1, 0]])).unwrap();

        let pipeline = default_pipeline(&CoverOptions::default()).unwrap();
        let cover = pipeline.run(&pdf, &layout.covers_dir(), None).unwrap();
        assert_eq!(cover.source, CoverSource::Rendered);
        assert_canonical_jpeg(&cover.path);
        let img = image::open(&cover.path).unwrap().to_rgb8();
        for x in [60, 150, 240] {
            let px = img.get_pixel(x, 60);
            assert!(px[0] > 150 && px[1] < 100 && px[2] < 100, "({}, 60) is {:?}", x, px);
        }
    }

    #[test]
    fn test_garbage_pdf_gets_placeholder() {
        let (_dir, layout) = setup();
        let pdf = layout.ebooks_dir().join("intro-to-computing.pdf");
        std::fs::write(&pdf, b"this is not a pdf at all").unwrap();

        let pipeline = default_pipeline(&CoverOptions::default()).unwrap();
        let cover = pipeline.run(&pdf, &layout.covers_dir(), None).unwrap();
        assert_eq!(cover.source, CoverSource::Placeholder);
        assert_canonical_jpeg(&cover.path);
    }

    #[test]
    fn test_missing_pdf_gets_placeholder() {
        let (_dir, layout) = setup();
        let pdf = layout.ebooks_dir().join("gone.pdf");
        let path = extract_cover(&CoverOptions::default(), &pdf, &layout.covers_dir()).unwrap();
        assert_canonical_jpeg(&path);
    }

    #[test]
    fn test_same_upload_twice_gets_distinct_covers() {
        let (_dir, layout) = setup();
        let pdf = layout.ebooks_dir().join("algebra.pdf");
        std::fs::write(&pdf, b"%PDF-1.4 truncated").unwrap();

        let options = CoverOptions::default();
        let a = extract_cover(&options, &pdf, &layout.covers_dir()).unwrap();
        let b = extract_cover(&options, &pdf, &layout.covers_dir()).unwrap();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn test_unwritable_dir_yields_null_record() {
        let (dir, layout) = setup();
        let pdf = layout.ebooks_dir().join("algebra.pdf");
        std::fs::write(&pdf, letter_pdf()).unwrap();

        let missing = dir.path().join("no-such-dir");
        let path = extract_cover(&CoverOptions::default(), &pdf, &missing);
        assert!(path.is_none());

        let record = layout.cover_record(path);
        assert_eq!(record.cover_image_path, None);
        assert_eq!(record.cover_url, None);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["cover_image_path"].is_null());
    }

    #[test]
    fn test_record_url_for_written_cover() {
        let (_dir, layout) = setup();
        let pdf = layout.ebooks_dir().join("algebra.pdf");
        std::fs::write(&pdf, b"junk").unwrap();

        let path = extract_cover(&CoverOptions::default(), &pdf, &layout.covers_dir());
        let name = path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap();
        let record = layout.cover_record(path);
        assert_eq!(record.cover_url, Some(format!("/uploads/covers/{}", name)));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = CoverOptions {
            cover_size: (0, 420),
            ..Default::default()
        };
        assert!(default_pipeline(&options).is_err());
        let (_dir, layout) = setup();
        assert!(extract_cover(&options, Path::new("x.pdf"), &layout.covers_dir()).is_none());
    }

    #[test]
    fn test_placeholder_cover_command() {
        let (_dir, layout) = setup();
        let path = render_placeholder_cover(
            &CoverOptions::default(),
            "intro-to-computing.pdf",
            &layout.covers_dir(),
        )
        .unwrap();
        assert_canonical_jpeg(&path);
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("cover-intro-to-computing-"));
    }

    #[test]
    fn test_custom_cover_uses_own_size() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("custom.jpg");
        let custom = CustomCoverOptions {
            title: "Operating Systems".into(),
            author: "Dept. of CS".into(),
            ..Default::default()
        };
        write_custom_cover(&CoverOptions::default(), &custom, &out).unwrap();
        assert_eq!(image::open(&out).unwrap().dimensions(), (400, 600));
    }

    #[test]
    fn test_custom_cover_bad_color() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("custom.jpg");
        let custom = CustomCoverOptions {
            background: "navy".into(),
            ..Default::default()
        };
        assert!(write_custom_cover(&CoverOptions::default(), &custom, &out).is_err());
        assert!(!out.exists());
    }
}
