//! Turns an [`ArtifactSet`] into the request's final document.

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use super::artifacts::{ArtifactSet, discard_files};
use crate::error::{Result, UrlCatError};
use crate::io::PdfReader;
use crate::merge::Merger;
use crate::utils::millis;

/// How the final document came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyMode {
    /// The only artifact was moved into place unchanged.
    Passthrough,
    /// Several artifacts were concatenated.
    Merged,
}

/// The final document on disk.
#[derive(Debug, Clone)]
pub struct AssembledOutput {
    /// Where the document was written.
    pub path: PathBuf,

    /// Pages in the document.
    pub total_pages: usize,

    /// Passthrough or merge.
    pub mode: AssemblyMode,
}

/// Decides between passthrough and merge, then produces the output.
#[derive(Debug, Clone, Default)]
pub struct OutputAssembler {
    reader: PdfReader,
    merger: Merger,
}

impl OutputAssembler {
    /// Create an assembler with default reader and merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce `output` from `artifacts`.
    ///
    /// - no artifact: [`UrlCatError::TotalFailure`], nothing is written
    /// - one artifact: checked to be a readable PDF, then renamed to `output`
    /// - several: merged in order into `output`, then removed
    ///
    /// On error the artifacts are left where they are; the caller owns the
    /// cleanup decision.
    pub async fn assemble(&self, artifacts: &ArtifactSet, output: &Path) -> Result<AssembledOutput> {
        let start = Instant::now();
        let paths = artifacts.paths();

        let assembled = match paths.as_slice() {
            [] => {
                return Err(UrlCatError::TotalFailure {
                    attempted: artifacts.attempted(),
                });
            }
            [single] => {
                let loaded = self.reader.load(single).await?;
                tokio::fs::rename(single, output)
                    .await
                    .map_err(|source| UrlCatError::FailedToWrite {
                        path: output.to_path_buf(),
                        source,
                    })?;

                AssembledOutput {
                    path: output.to_path_buf(),
                    total_pages: loaded.page_count,
                    mode: AssemblyMode::Passthrough,
                }
            }
            _ => {
                let stats = self.merger.merge(&paths, output).await?;
                discard_files(&paths).await;

                AssembledOutput {
                    path: output.to_path_buf(),
                    total_pages: stats.total_pages,
                    mode: AssemblyMode::Merged,
                }
            }
        };

        info!(
            op = "convert::assemble",
            result = "ok",
            mode = ?assembled.mode,
            artifacts = paths.len(),
            pages = assembled.total_pages,
            elapsed_ms = millis(start.elapsed()),
            path = %assembled.path.display(),
            "Assembled output"
        );

        Ok(assembled)
    }
}
