//! Requests, per-URL render tasks and the artifacts they leave behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::RenderOptions;
use crate::error::{RenderError, Result, UrlCatError};

/// One conversion: render every URL, then concatenate in URL order.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// URLs to render. Order decides page order in the output.
    pub urls: Vec<String>,

    /// Directory for artifacts and the merged document.
    pub pdf_dir: Option<PathBuf>,

    /// Options handed to the renderer for every URL.
    pub options: RenderOptions,
}

impl ConversionRequest {
    /// Request with default render options.
    pub fn new(urls: Vec<String>, pdf_dir: impl Into<PathBuf>) -> Self {
        Self {
            urls,
            pdf_dir: Some(pdf_dir.into()),
            options: RenderOptions::default(),
        }
    }

    /// Replace the render options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Check the request before anything touches the filesystem.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no URL was given, a URL is blank, the
    /// target directory is missing, or the options have an unusable shape.
    pub fn validate(&self) -> Result<&Path> {
        if self.urls.is_empty() {
            return Err(UrlCatError::validation("No PDF link provided!"));
        }

        if let Some(index) = self.urls.iter().position(|url| url.trim().is_empty()) {
            return Err(UrlCatError::validation(format!(
                "PDF link #{index} is empty"
            )));
        }

        let dir = match self.pdf_dir.as_deref() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => return Err(UrlCatError::validation("No PDF directory provided!")),
        };

        self.options.to_cli_args()?;
        Ok(dir)
    }
}

/// Render one URL to one destination.
#[derive(Debug, Clone)]
pub struct RenderTask {
    /// Position of the URL in the request.
    pub index: usize,

    /// URL to render.
    pub url: String,

    /// Artifact path, unique within the request.
    pub destination: PathBuf,

    /// Shared render options of the request.
    pub options: Arc<RenderOptions>,
}

/// Terminal state of a [`RenderTask`].
#[derive(Debug)]
pub enum RenderOutcome {
    /// The artifact at this path is complete.
    Rendered(PathBuf),
    /// Rendering failed; the URL contributes no pages.
    Failed(RenderError),
}

/// A URL that contributed no pages.
#[derive(Debug)]
pub struct RenderFailure {
    /// Position of the URL in the request.
    pub index: usize,

    /// The URL.
    pub url: String,

    /// Why the render failed.
    pub error: RenderError,
}

impl RenderFailure {
    /// Wrap into the crate error, keeping index and URL.
    pub fn into_error(self) -> UrlCatError {
        UrlCatError::Render {
            index: self.index,
            url: self.url,
            source: self.error,
        }
    }
}

/// Successfully rendered artifacts, ordered by request index.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    attempted: usize,
    rendered: Vec<(usize, PathBuf)>,
    failures: Vec<RenderFailure>,
}

impl ArtifactSet {
    /// Pair every task with the outcome in its slot.
    ///
    /// `slots[i]` holds the outcome of `tasks[i]`. Slots are filled as tasks
    /// settle, in any order; walking them by index keeps request order no
    /// matter which render finished first. An empty slot counts as a
    /// failure.
    pub fn from_slots(tasks: &[RenderTask], slots: Vec<Option<RenderOutcome>>) -> Self {
        let mut set = Self {
            attempted: tasks.len(),
            ..Self::default()
        };

        for (task, slot) in tasks.iter().zip(slots) {
            let outcome = slot.unwrap_or_else(|| {
                RenderOutcome::Failed(RenderError::Io(std::io::Error::other(
                    "render task never settled",
                )))
            });

            match outcome {
                RenderOutcome::Rendered(path) => set.rendered.push((task.index, path)),
                RenderOutcome::Failed(error) => set.failures.push(RenderFailure {
                    index: task.index,
                    url: task.url.clone(),
                    error,
                }),
            }
        }

        set
    }

    /// Number of URLs that were rendered or attempted.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Number of successful renders.
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    /// True when every render failed.
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// Artifact paths in request order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.rendered.iter().map(|(_, path)| path.clone()).collect()
    }

    /// Request indices that rendered, ascending.
    pub fn indices(&self) -> Vec<usize> {
        self.rendered.iter().map(|(index, _)| *index).collect()
    }

    /// Failed renders, ordered by request index.
    pub fn failures(&self) -> &[RenderFailure] {
        &self.failures
    }

    /// Take the failures out, leaving the rendered artifacts.
    pub fn take_failures(&mut self) -> Vec<RenderFailure> {
        std::mem::take(&mut self.failures)
    }
}

/// Remove files, ignoring ones that are already gone.
///
/// Runs sequentially; a file that cannot be removed is logged and skipped.
pub(crate) async fn discard_files(paths: &[PathBuf]) -> usize {
    let mut removed = 0;

    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                removed += 1;
                debug!(op = "convert::discard", path = %path.display(), "Removed artifact");
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                warn!(
                    op = "convert::discard",
                    result = "error",
                    path = %path.display(),
                    error = %err,
                    "Failed to remove artifact"
                );
            }
        }
    }

    removed
}
