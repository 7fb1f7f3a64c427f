//! Subprocess renderer driving `wkhtmltopdf`.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{info, warn};
use url::Url;

use super::Renderer;
use crate::config::RenderOptions;
use crate::error::RenderError;
use crate::utils::millis;

/// Renderer backed by the `wkhtmltopdf` executable.
///
/// The process writes straight to the destination and only exits once the
/// file is closed, so a zero exit status means the artifact is complete.
#[derive(Debug, Clone)]
pub struct WkHtmlToPdf {
    bin: PathBuf,
}

impl WkHtmlToPdf {
    /// Create a renderer that invokes `bin`.
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Default for WkHtmlToPdf {
    fn default() -> Self {
        Self::new("wkhtmltopdf")
    }
}

#[async_trait]
impl Renderer for WkHtmlToPdf {
    async fn render(
        &self,
        url: &str,
        destination: &Path,
        options: &RenderOptions,
    ) -> Result<(), RenderError> {
        let parsed = Url::parse(url).map_err(|e| RenderError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RenderError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let args = options
            .to_cli_args()
            .map_err(|e| RenderError::InvalidOptions {
                reason: e.to_string(),
            })?;

        let started_at = Instant::now();
        let output = Command::new(&self.bin)
            .args(args)
            .arg("--quiet")
            .arg(parsed.as_str())
            .arg(destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                warn!(
                    target = "render::wkhtmltopdf",
                    op = "render",
                    result = "error",
                    error_code = "spawn_cli",
                    bin = %self.bin.display(),
                    error = %err,
                    "Failed to spawn renderer"
                );
                if err.kind() == ErrorKind::NotFound {
                    RenderError::NotFound(err)
                } else {
                    RenderError::Io(err)
                }
            })?;

        if !output.status.success() {
            let exit_code = output.status.code();
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                target = "render::wkhtmltopdf",
                op = "render",
                result = "error",
                elapsed_ms = millis(started_at.elapsed()),
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                error_code = "renderer_cli",
                url = %url,
                stderr = %stderr,
                "Renderer invocation failed"
            );
            return Err(RenderError::Cli { exit_code, stderr });
        }

        let size = match tokio::fs::metadata(destination).await {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == ErrorKind::NotFound => 0,
            Err(err) => return Err(RenderError::Io(err)),
        };
        if size == 0 {
            return Err(RenderError::EmptyOutput {
                path: destination.to_path_buf(),
            });
        }

        info!(
            target = "render::wkhtmltopdf",
            op = "render",
            result = "ok",
            elapsed_ms = millis(started_at.elapsed()),
            url = %url,
            path = %destination.display(),
            bytes = size,
            "Rendered URL to PDF"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "wkhtmltopdf"
    }
}
