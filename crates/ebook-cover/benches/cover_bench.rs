//! Cover benchmarks: placeholder drawing, cover fit, full extraction.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use cover_core::frame::RasterFrame;
use cover_core::options::CoverOptions;
use cover_placeholder::{CanvasRenderer, CoverDesign};
use cover_transforms::{cover_fit, encode_jpeg};

fn bench_placeholder(c: &mut Criterion) {
    let mut group = c.benchmark_group("Placeholder");
    let title = "Introduction to Computer Science and Programming Using Python";

    let canvas = CanvasRenderer::discover(None);
    group.bench_function("design", |b| {
        b.iter(|| CoverDesign::placeholder(black_box(title), "OCC Digital Library", &canvas));
    });

    let design = CoverDesign::placeholder(title, "OCC Digital Library", &canvas);
    group.bench_function("raster_400x600", |b| {
        b.iter(|| canvas.render(black_box(&design)));
    });

    group.finish();
}

fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("Finalize");

    // Letter page at 1.5x, the usual render size.
    let page = RasterFrame::blank(918, 1188).unwrap();
    group.bench_function("cover_fit_918x1188", |b| {
        b.iter(|| cover_fit(black_box(&page), 300, 420).unwrap());
    });

    let fitted = cover_fit(&page, 300, 420).unwrap();
    group.bench_function("encode_jpeg_q85", |b| {
        b.iter(|| encode_jpeg(black_box(&fitted), 85).unwrap());
    });

    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("E2E_Extract");
    group.sample_size(10);

    let dir = std::env::temp_dir().join("ebook_cover_bench");
    std::fs::create_dir_all(&dir).unwrap();
    let input_path = dir.join("not-a-real-book.pdf");
    std::fs::write(&input_path, b"garbage").unwrap();

    let pipeline = ebook_cover::default_pipeline(&CoverOptions::default()).unwrap();
    group.bench_function("placeholder_fallback", |b| {
        b.iter(|| {
            let path = pipeline.extract(black_box(&input_path), &dir).unwrap();
            std::fs::remove_file(path).ok();
        });
    });

    group.finish();
    std::fs::remove_dir_all(&dir).ok();
}

criterion_group!(benches, bench_placeholder, bench_finalize, bench_extract);
criterion_main!(benches);
