//! The renderer capability: turn one URL into one PDF file.
//!
//! The orchestrator only sees the [`Renderer`] trait. [`WkHtmlToPdf`] drives
//! the real engine as a subprocess. With the `testing` feature,
//! `ScriptedRenderer` produces scripted documents and failures for tests.

#[cfg(any(test, feature = "testing"))]
pub mod scripted;
pub mod wkhtmltopdf;

pub use crate::error::RenderError;
#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedRenderer;
pub use wkhtmltopdf::WkHtmlToPdf;

use async_trait::async_trait;
use std::path::Path;

use crate::config::RenderOptions;

/// Renders a single URL to a PDF file.
///
/// One call is one attempt; implementations do not retry.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `url` into `destination`.
    ///
    /// When this returns `Ok(())` the file at `destination` is complete and
    /// flushed; a caller may read it immediately.
    async fn render(
        &self,
        url: &str,
        destination: &Path,
        options: &RenderOptions,
    ) -> Result<(), RenderError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
