//! First-page geometry via `lopdf`.
//!
//! Page boxes may be inherited from ancestor `Pages` nodes, so lookups
//! walk the `Parent` chain.

use lopdf::{Dictionary, Document, Object, ObjectId};

use cover_core::frame::RenderFailure;

/// Guards against `Parent` cycles in hostile files.
const MAX_TREE_DEPTH: usize = 32;

/// Page size in PDF user units, after rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub width: f32,
    pub height: f32,
}

/// Pixel size of the first page at the render scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

pub fn load_document(bytes: &[u8]) -> Result<Document, RenderFailure> {
    Document::load_mem(bytes).map_err(|e| RenderFailure::Malformed(e.to_string()))
}

/// Visible box of page 1: `CropBox` when present, else `MediaBox`,
/// with axes swapped for a 90° or 270° `Rotate`.
pub fn first_page_box(doc: &Document) -> Result<PageBox, RenderFailure> {
    let pages = doc.get_pages();
    let (&page_number, &page_id) = pages.iter().next().ok_or(RenderFailure::NoPages)?;
    log::debug!(
        "First page is #{} (object {} {}) of {}",
        page_number,
        page_id.0,
        page_id.1,
        pages.len()
    );

    let rect = inherited(doc, page_id, b"CropBox")
        .and_then(|obj| rectangle(doc, obj))
        .or_else(|| inherited(doc, page_id, b"MediaBox").and_then(|obj| rectangle(doc, obj)))
        .ok_or_else(|| RenderFailure::InvalidPage("no usable MediaBox".to_string()))?;

    let width = (rect[2] - rect[0]).abs();
    let height = (rect[3] - rect[1]).abs();
    if !(width.is_finite() && height.is_finite()) || width < 1.0 || height < 1.0 {
        return Err(RenderFailure::InvalidPage(format!(
            "degenerate page box {:?}",
            rect
        )));
    }

    let rotation = inherited(doc, page_id, b"Rotate")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360);

    if rotation == 90 || rotation == 270 {
        Ok(PageBox {
            width: height,
            height: width,
        })
    } else {
        Ok(PageBox { width, height })
    }
}

/// Scale a page box to whole pixels. No aspect correction happens here.
pub fn viewport(page: PageBox, scale: f32) -> Viewport {
    let to_px = |v: f32| ((v * scale).round() as u32).max(1);
    Viewport {
        width: to_px(page.width),
        height: to_px(page.height),
    }
}

fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node: &Dictionary = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(doc: &Document, obj: &Object) -> Option<f32> {
    match resolve(doc, obj) {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn rectangle(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let items = resolve(doc, obj).as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let mut rect = [0.0f32; 4];
    for (slot, item) in rect.iter_mut().zip(items) {
        *slot = number(doc, item)?;
    }
    Some(rect)
}
