//! urlcat - Render web pages to PDF and concatenate them into one document.
//!
//! This library provides the conversion pipeline behind the `urlcat` HTTP
//! service:
//!
//! - Concurrent rendering of URLs through a pluggable renderer
//! - Order-preserving merge of the rendered documents
//! - Single-document passthrough without re-encoding
//! - Explicit artifact cleanup policy
//!
//! # Examples
//!
//! ## Converting without the HTTP layer
//!
//! ```no_run
//! use std::sync::Arc;
//! use urlcat::convert::{ConversionRequest, Orchestrator};
//! use urlcat::render::WkHtmlToPdf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::new(Arc::new(WkHtmlToPdf::default()));
//! let request = ConversionRequest::new(
//!     vec!["https://example.com/a".to_string(), "https://example.com/b".to_string()],
//!     "public/pdf",
//! );
//!
//! let report = orchestrator.convert(request).await?;
//! println!("{} pages at {}", report.total_pages, report.merged_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Running the service
//!
//! ```no_run
//! use std::sync::Arc;
//! use urlcat::config::Config;
//! use urlcat::render::WkHtmlToPdf;
//! use urlcat::server::Service;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let running = Service::start(Config::default(), Arc::new(WkHtmlToPdf::default())).await?;
//! println!("listening on {}", running.local_addr());
//! running.stop().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod io;
pub mod merge;
pub mod render;
pub mod server;
pub mod telemetry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{RenderError, Result, UrlCatError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
