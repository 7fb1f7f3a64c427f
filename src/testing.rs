//! Small, self-describing PDF documents for tests and the scripted renderer.
//!
//! Every page of a marked document carries one text marker `<label>-<n>`
//! (1-based), which makes page order observable after a merge.

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::path::Path;

use crate::error::{Result, UrlCatError};

/// Build an in-memory document with `pages` marked pages.
pub fn marked_pdf(label: &str, pages: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages as usize);
    for page_num in 1..=pages {
        let content = format!("BT /F1 24 Tf 72 720 Td ({label}-{page_num}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    // MediaBox and Resources are inherited from the tree root so that merging
    // has to keep the source page tree intact to render correctly.
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Write a marked document to `path`.
pub fn write_marked_pdf(path: &Path, label: &str, pages: u32) -> Result<()> {
    let mut doc = marked_pdf(label, pages);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|e| UrlCatError::FailedToWrite {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;
    std::fs::write(path, bytes).map_err(|e| UrlCatError::FailedToWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Page markers of a loaded document, in page order.
pub fn document_markers(doc: &Document) -> Vec<String> {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    page_ids
        .into_iter()
        .filter_map(|id| doc.get_page_content(id).ok())
        .filter_map(|content| marker_in(&content))
        .collect()
}

/// Page markers of the document stored at `path`, in page order.
///
/// # Panics
///
/// Panics if the file is not a readable PDF; intended for assertions.
pub fn page_markers(path: &Path) -> Vec<String> {
    let doc = Document::load(path)
        .unwrap_or_else(|e| panic!("failed to load {}: {e}", path.display()));
    document_markers(&doc)
}

fn marker_in(content: &[u8]) -> Option<String> {
    let start = content.iter().position(|&b| b == b'(')?;
    let end = content[start..].iter().position(|&b| b == b')')?;
    Some(String::from_utf8_lossy(&content[start + 1..start + end]).into_owned())
}
