//! CLI argument parsing for urlcat.
//!
//! This module defines the command-line interface structure using `clap`.
//! Every option also reads from an environment variable so the service can be
//! configured entirely from its process environment.
//!
//! # Examples
//!
//! ```no_run
//! use urlcat::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! println!("Listening on port {}", cli.port);
//! ```

use clap::Parser;
use clap::builder::BoolishValueParser;
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_PORT};
use crate::error::Result;

/// Render web pages to PDF and merge them into a single document.
///
/// urlcat serves `GET /topdf?pdf=<url>&pdf=<url>&pdfDir=<dir>`, renders each
/// URL with an external renderer, and concatenates the results in request
/// order into `<dir>/<timestamp>_merged.pdf`.
#[derive(Parser, Debug)]
#[command(name = "urlcat")]
#[command(version)]
#[command(about = "Render web pages to PDF and merge them over HTTP", long_about = None)]
#[command(author)]
pub struct Cli {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "URLCAT_HOST", default_value = "0.0.0.0", value_name = "HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT, value_name = "PORT")]
    pub port: u16,

    /// Base directory for relative `pdfDir` values
    ///
    /// Absolute `pdfDir` values are used as given.
    #[arg(long, env = "URLCAT_BASE_DIR", default_value = ".", value_name = "DIR")]
    pub base_dir: PathBuf,

    /// Renderer executable
    ///
    /// Invoked as `<bin> [options...] --quiet <url> <destination>`.
    #[arg(
        long,
        env = "URLCAT_RENDERER_BIN",
        default_value = "wkhtmltopdf",
        value_name = "PATH"
    )]
    pub renderer_bin: PathBuf,

    /// Abort a single render after this many seconds
    ///
    /// A timed-out URL is treated like any other failed render: its pages are
    /// missing from the merged document. Without this option a hung render
    /// blocks its request indefinitely.
    #[arg(long, env = "URLCAT_RENDER_TIMEOUT_SECS", value_name = "SECONDS")]
    pub render_timeout_secs: Option<u64>,

    /// Maximum renders in flight per request
    ///
    /// By default every URL of a request is rendered at once.
    #[arg(long, env = "URLCAT_MAX_CONCURRENCY", value_name = "COUNT")]
    pub max_concurrency: Option<usize>,

    /// What to do with per-URL artifacts when a request fails
    ///
    /// - remove: delete them (default)
    /// - retain: leave them next to the would-be merged file
    #[arg(long, env = "URLCAT_CLEANUP", default_value = "remove", value_name = "POLICY")]
    #[arg(value_parser = ["remove", "retain"])]
    pub cleanup: String,

    /// Base log level (trace|debug|info|warn|error|off)
    ///
    /// `RUST_LOG` directives take precedence when set.
    #[arg(long, env = "URLCAT_LOG_LEVEL", default_value = "info", value_name = "LEVEL")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(
        long,
        env = "URLCAT_LOG_JSON",
        default_value = "false",
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: bool,
}

impl Cli {
    /// Convert CLI arguments to a validated configuration.
    pub fn to_config(&self) -> Result<Config> {
        Config::try_from(self)
    }
}
