//! Core PDF merging implementation.
//!
//! Inputs are loaded strictly in the order given and concatenated into a
//! fresh output document. Each input's page tree is grafted under the output
//! root as one subtree, which keeps per-document page order and any
//! attributes the source pages inherit (MediaBox, Resources, Rotate).

use lopdf::{Document, Object, ObjectId, dictionary};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, info};

use crate::error::{Result, UrlCatError};
use crate::io::{PdfReader, PdfWriter};
use crate::utils::{format_file_size, millis};

/// Statistics about a merge operation.
#[derive(Debug, Clone)]
pub struct MergeStatistics {
    /// Number of PDFs merged.
    pub files_merged: usize,

    /// Total number of pages in merged document.
    pub total_pages: usize,

    /// Total time taken for load, merge and write.
    pub merge_time: Duration,

    /// Total size of input files.
    pub input_size: u64,

    /// Size of the written output.
    pub output_size: u64,
}

impl MergeStatistics {
    /// Format input size as human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }
}

/// PDF merger that combines multiple documents.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    /// Reader for loading PDFs.
    reader: PdfReader,

    /// Writer for the final document.
    writer: PdfWriter,
}

impl Merger {
    /// Create a new merger with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the PDFs at `paths`, in order, into one document at `output`.
    ///
    /// # Errors
    ///
    /// Fails without writing `output` if the list is empty or any input is
    /// unreadable or not a valid PDF. There is no best-effort mode: one bad
    /// input aborts the whole merge.
    pub async fn merge(&self, paths: &[PathBuf], output: &Path) -> Result<MergeStatistics> {
        if paths.is_empty() {
            return Err(UrlCatError::merge_failed("No documents to merge"));
        }

        let start = Instant::now();
        let mut documents = Vec::with_capacity(paths.len());
        let mut input_size = 0;

        for (idx, path) in paths.iter().enumerate() {
            let loaded = self.reader.load(path).await?;
            debug!(
                op = "merge::load",
                position = idx + 1,
                of = paths.len(),
                path = %path.display(),
                pages = loaded.page_count,
                "Loaded merge input"
            );
            input_size += loaded.file_size;
            documents.push(loaded.document);
        }

        let merged = task::spawn_blocking(move || concatenate(documents)).await??;
        let total_pages = merged.get_pages().len();

        let write_stats = self.writer.save(merged, output).await?;

        let statistics = MergeStatistics {
            files_merged: paths.len(),
            total_pages,
            merge_time: start.elapsed(),
            input_size,
            output_size: write_stats.file_size,
        };

        info!(
            op = "merge::merge",
            result = "ok",
            files = statistics.files_merged,
            pages = statistics.total_pages,
            input = %statistics.format_input_size(),
            output = %write_stats.format_file_size(),
            elapsed_ms = millis(statistics.merge_time),
            path = %output.display(),
            "Merged documents"
        );

        Ok(statistics)
    }
}

/// Concatenate documents into a new one, preserving document and page order.
///
/// # Errors
///
/// Returns an error if an input has no catalog or page tree.
pub fn concatenate(documents: Vec<Document>) -> Result<Document> {
    if documents.is_empty() {
        return Err(UrlCatError::merge_failed("No documents to merge"));
    }

    let mut merged = Document::with_version("1.5");
    let root_pages_id = merged.new_object_id();
    let mut max_id = merged.max_id;

    let mut kids = Vec::with_capacity(documents.len());
    let mut total_pages = 0_i64;

    for mut doc in documents {
        // Avoid object id collisions by renumbering the incoming document
        doc.renumber_objects_with(max_id + 1);
        max_id = max_id.max(doc.max_id);

        let (catalog_id, pages_id) = page_tree_root(&doc)?;
        let page_count = doc.get_pages().len();

        doc.objects.remove(&catalog_id);
        doc.get_object_mut(pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| UrlCatError::merge_failed(format!("Invalid page tree root: {e}")))?
            .set("Parent", root_pages_id);

        merged.objects.extend(doc.objects);
        kids.push(Object::Reference(pages_id));
        total_pages += page_count as i64;
    }

    merged.max_id = max_id;
    merged.objects.insert(
        root_pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total_pages,
        }),
    );

    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => root_pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    // Old catalogs, outlines and info dictionaries are now unreachable
    merged.prune_objects();
    merged.renumber_objects();

    Ok(merged)
}

fn page_tree_root(doc: &Document) -> Result<(ObjectId, ObjectId)> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| UrlCatError::merge_failed(format!("Failed to get catalog: {e}")))?;

    let pages_id = doc
        .get_dictionary(catalog_id)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| UrlCatError::merge_failed(format!("Failed to get pages reference: {e}")))?;

    Ok((catalog_id, pages_id))
}
