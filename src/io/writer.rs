//! PDF writing and saving operations.
//!
//! The merged document is serialized once and written through a `.tmp`
//! sibling that is flushed and then renamed into place, so a consumer polling
//! the output directory never sees a half-written `_merged.pdf`.

use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{Result, UrlCatError};
use crate::utils::format_file_size;

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write to a temp file, then rename.
    pub atomic: bool,

    /// Compress streams before writing.
    pub compress: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            compress: true,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Save a PDF document, consuming it.
    ///
    /// Serialization runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the output (or its temp sibling) cannot be
    /// created, written, flushed, or renamed.
    pub async fn save(&self, mut doc: Document, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        task::spawn_blocking(move || {
            let start = Instant::now();

            if options.compress {
                doc.compress();
            }

            let write_path = if options.atomic {
                path_buf.with_extension("pdf.tmp")
            } else {
                path_buf.clone()
            };

            let file = std::fs::File::create(&write_path).map_err(|e| {
                UrlCatError::FailedToCreateOutput {
                    path: write_path.clone(),
                    source: e,
                }
            })?;

            let written = write_and_place(
                &mut doc,
                file,
                &write_path,
                &path_buf,
                options.buffer_size,
                options.atomic,
            );
            if let Err(e) = written {
                if options.atomic {
                    let _ = std::fs::remove_file(&write_path);
                }
                return Err(e);
            }

            let file_size = std::fs::metadata(&path_buf).map(|m| m.len()).unwrap_or(0);

            Ok::<_, UrlCatError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size,
                output_path: path_buf,
            })
        })
        .await?
    }
}

/// Serialize into `file`, flush, and rename over `target` when atomic.
fn write_and_place(
    doc: &mut Document,
    file: std::fs::File,
    write_path: &Path,
    target: &Path,
    buffer_size: usize,
    atomic: bool,
) -> Result<()> {
    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);

    doc.save_to(&mut writer)
        .map_err(|e| UrlCatError::FailedToWrite {
            path: write_path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    writer.flush().map_err(|e| UrlCatError::FailedToWrite {
        path: write_path.to_path_buf(),
        source: e,
    })?;
    drop(writer);

    if atomic {
        std::fs::rename(write_path, target).map_err(|e| UrlCatError::FailedToWrite {
            path: target.to_path_buf(),
            source: e,
        })?;
    }

    Ok(())
}
