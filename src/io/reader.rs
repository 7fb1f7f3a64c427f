//! PDF reading and loading operations.
//!
//! Artifacts are read fully into memory with non-blocking file I/O and then
//! parsed on the blocking pool, so a large document never stalls the runtime.
//!
//! # Examples
//!
//! ```no_run
//! use urlcat::io::reader::PdfReader;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(Path::new("2024-01-01T00:00:00.000Z_index_0.pdf")).await?;
//! println!("{} pages", loaded.page_count);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{Result, UrlCatError};

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to read and parse the document.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

/// PDF reader that rejects documents without pages.
#[derive(Debug, Clone)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new PDF reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - File is not a valid PDF
    /// - PDF is encrypted
    /// - PDF has no pages
    pub async fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let path_buf = path.to_path_buf();
        let start = Instant::now();

        let bytes = tokio::fs::read(&path_buf)
            .await
            .map_err(|e| UrlCatError::failed_to_load_pdf(path_buf.clone(), e.to_string()))?;
        let file_size = bytes.len() as u64;

        let parse_path = path_buf.clone();
        let document = tokio::task::spawn_blocking(move || {
            Document::load_mem(&bytes).map_err(|e| {
                let err_msg = e.to_string();
                if err_msg.contains("encrypt") || err_msg.contains("password") {
                    UrlCatError::corrupted_pdf(parse_path, format!("encrypted PDF: {err_msg}"))
                } else {
                    UrlCatError::failed_to_load_pdf(parse_path, err_msg)
                }
            })
        })
        .await??;

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(UrlCatError::corrupted_pdf(path_buf, "PDF has no pages"));
        }

        Ok(LoadedPdf {
            document,
            path: path_buf,
            page_count,
            load_time: start.elapsed(),
            file_size,
        })
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}
