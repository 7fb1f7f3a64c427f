//! The conversion pipeline: fan out renders, fan in by index, assemble.

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::artifacts::{
    ArtifactSet, ConversionRequest, RenderFailure, RenderOutcome, RenderTask, discard_files,
};
use super::assembler::{AssemblyMode, OutputAssembler};
use super::naming::{StampSource, artifact_path, merged_path};
use crate::config::{CleanupPolicy, Config};
use crate::error::{RenderError, Result, UrlCatError};
use crate::render::Renderer;
use crate::utils::millis;

/// What a successful conversion produced.
#[derive(Debug)]
pub struct ConversionReport {
    /// The final document.
    pub merged_path: PathBuf,

    /// Pages in the final document.
    pub total_pages: usize,

    /// URLs in the request.
    pub attempted: usize,

    /// URLs whose pages made it into the document.
    pub rendered: usize,

    /// URLs that contributed nothing, as [`UrlCatError::Render`] in request
    /// order.
    pub failures: Vec<UrlCatError>,

    /// Passthrough or merge.
    pub mode: AssemblyMode,

    /// Wall time of the whole conversion.
    pub elapsed: Duration,
}

impl ConversionReport {
    /// True when some, but not all, renders failed.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Drives one conversion per call.
///
/// Renders run concurrently, each into its own artifact file, so no locking
/// is needed between them. The renderer is injected, which lets the same
/// pipeline run against the real engine or a scripted one.
#[derive(Clone)]
pub struct Orchestrator {
    renderer: Arc<dyn Renderer>,
    assembler: OutputAssembler,
    cleanup: CleanupPolicy,
    render_timeout: Option<Duration>,
    max_concurrency: Option<usize>,
    stamps: &'static StampSource,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("renderer", &self.renderer.name())
            .field("cleanup", &self.cleanup)
            .field("render_timeout", &self.render_timeout)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

impl Orchestrator {
    /// Orchestrator with no timeout, no concurrency limit and
    /// [`CleanupPolicy::Remove`].
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            renderer,
            assembler: OutputAssembler::new(),
            cleanup: CleanupPolicy::default(),
            render_timeout: None,
            max_concurrency: None,
            stamps: StampSource::global(),
        }
    }

    /// Orchestrator tuned by the service configuration.
    pub fn from_config(config: &Config, renderer: Arc<dyn Renderer>) -> Self {
        Self::new(renderer)
            .with_cleanup(config.cleanup)
            .with_render_timeout(config.render_timeout)
            .with_max_concurrency(config.max_concurrency)
    }

    /// Set the artifact cleanup policy.
    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Give up on a single render after `timeout`.
    pub fn with_render_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Cap the number of renders in flight.
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Render every URL of `request` and assemble one document.
    ///
    /// Waits for every render to settle before assembling; a failed render
    /// only drops that URL's pages. Output page order always follows the
    /// request's URL order, never render completion order.
    ///
    /// # Errors
    ///
    /// - validation errors, before any file or directory is created
    /// - [`UrlCatError::TotalFailure`] when no render succeeded
    /// - merge errors when an artifact cannot be read or parsed
    pub async fn convert(&self, request: ConversionRequest) -> Result<ConversionReport> {
        let start = Instant::now();
        let dir = request.validate()?.to_path_buf();

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| UrlCatError::FailedToCreateOutput {
                path: dir.clone(),
                source,
            })?;

        let stamp = self.stamps.next()?;
        let options = Arc::new(request.options);
        let tasks: Vec<RenderTask> = request
            .urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| RenderTask {
                index,
                destination: artifact_path(&dir, &stamp, index),
                url,
                options: Arc::clone(&options),
            })
            .collect();

        info!(
            op = "convert::start",
            renderer = self.renderer.name(),
            urls = tasks.len(),
            dir = %dir.display(),
            stamp = %stamp,
            "Starting conversion"
        );

        let mut artifacts = self.render_all(&tasks).await;
        // Failed renders may still have left a partial file behind
        let failed_destinations: Vec<PathBuf> = artifacts
            .failures()
            .iter()
            .map(|failure| tasks[failure.index].destination.clone())
            .collect();
        let failures: Vec<UrlCatError> = artifacts
            .take_failures()
            .into_iter()
            .map(RenderFailure::into_error)
            .collect();
        for failure in &failures {
            if let UrlCatError::Render { index, url, source } = failure {
                warn!(
                    op = "convert::render",
                    result = "error",
                    error_code = failure.kind(),
                    index = *index,
                    url = %url,
                    error = %source,
                    "Render failed, URL skipped"
                );
            }
        }

        let output = merged_path(&dir, &stamp);
        match self.assembler.assemble(&artifacts, &output).await {
            Ok(assembled) => {
                if self.cleanup == CleanupPolicy::Remove {
                    discard_files(&failed_destinations).await;
                }

                let report = ConversionReport {
                    merged_path: assembled.path,
                    total_pages: assembled.total_pages,
                    attempted: artifacts.attempted(),
                    rendered: artifacts.len(),
                    failures,
                    mode: assembled.mode,
                    elapsed: start.elapsed(),
                };

                info!(
                    op = "convert::finish",
                    result = "ok",
                    rendered = report.rendered,
                    failed = report.failures.len(),
                    pages = report.total_pages,
                    elapsed_ms = millis(report.elapsed),
                    path = %report.merged_path.display(),
                    "Conversion finished"
                );

                Ok(report)
            }
            Err(err) => {
                if self.cleanup == CleanupPolicy::Remove {
                    let destinations: Vec<PathBuf> =
                        tasks.iter().map(|task| task.destination.clone()).collect();
                    discard_files(&destinations).await;
                }

                error!(
                    op = "convert::finish",
                    result = "error",
                    error_code = err.kind(),
                    cleanup = ?self.cleanup,
                    elapsed_ms = millis(start.elapsed()),
                    error = %err,
                    "Conversion failed"
                );

                Err(err)
            }
        }
    }

    async fn render_all(&self, tasks: &[RenderTask]) -> ArtifactSet {
        let limit = self.max_concurrency.unwrap_or(tasks.len()).max(1);
        let mut slots: Vec<Option<RenderOutcome>> = tasks.iter().map(|_| None).collect();

        let renders: Vec<BoxFuture<'_, (usize, RenderOutcome)>> = tasks
            .iter()
            .map(|task| self.render_one(task).boxed())
            .collect();
        let mut settled = stream::iter(renders).buffer_unordered(limit);

        while let Some((index, outcome)) = settled.next().await {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(outcome);
            }
        }

        ArtifactSet::from_slots(tasks, slots)
    }

    async fn render_one(&self, task: &RenderTask) -> (usize, RenderOutcome) {
        let render = self
            .renderer
            .render(&task.url, &task.destination, &task.options);

        let result = match self.render_timeout {
            Some(after) => match tokio::time::timeout(after, render).await {
                Ok(result) => result,
                Err(_) => Err(RenderError::Timeout { after }),
            },
            None => render.await,
        };

        let outcome = match result {
            Ok(()) => RenderOutcome::Rendered(task.destination.clone()),
            Err(error) => RenderOutcome::Failed(error),
        };

        (task.index, outcome)
    }
}
