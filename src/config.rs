//! Configuration module for urlcat.
//!
//! This module turns CLI arguments (and their environment fallbacks) into a
//! validated [`Config`] that drives the HTTP service, and defines the
//! per-request [`RenderOptions`] passed through to the renderer.

use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

use crate::cli::Cli;
use crate::error::{Result, UrlCatError};

/// Default listen port, matching the historical deployment.
pub const DEFAULT_PORT: u16 = 3003;

/// Default render resolution.
pub const DEFAULT_DPI: u32 = 270;

/// Default paper size.
pub const DEFAULT_PAGE_SIZE: &str = "A4";

/// What happens to per-URL artifacts when a request does not end in a merged
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Delete the request's artifacts after a failed merge or failed render.
    #[default]
    Remove,
    /// Leave artifacts on disk for inspection.
    Retain,
}

impl FromStr for CleanupPolicy {
    type Err = UrlCatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "remove" => Ok(Self::Remove),
            "retain" => Ok(Self::Retain),
            _ => Err(UrlCatError::invalid_config(format!(
                "Invalid cleanup policy: {s}. Must be one of: remove, retain"
            ))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable single-line output.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Renderer options for one request.
///
/// Kept as a JSON object so arbitrary renderer-specific keys survive the trip
/// from the query string to the renderer untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions(Map<String, Value>);

impl Default for RenderOptions {
    fn default() -> Self {
        let mut map = Map::new();
        map.insert("dpi".to_string(), Value::from(DEFAULT_DPI));
        map.insert("pageSize".to_string(), Value::from(DEFAULT_PAGE_SIZE));
        map.insert("printMediaType".to_string(), Value::Bool(true));
        Self(map)
    }
}

impl RenderOptions {
    /// Options with no keys at all (no defaults applied).
    pub fn empty() -> Self {
        Self(Map::new())
    }

    /// Defaults with `overrides` merged over them key by key.
    pub fn with_overrides(overrides: Map<String, Value>) -> Self {
        let mut options = Self::default();
        options.merge(overrides);
        options
    }

    /// Merge `overrides` over the current options.
    pub fn merge(&mut self, overrides: Map<String, Value>) {
        for (key, value) in overrides {
            self.0.insert(key, value);
        }
    }

    /// Look up a single option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a single option.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Convert the options into command-line arguments.
    ///
    /// Keys are camelCase in requests and become kebab-case flags:
    /// `pageSize: "A4"` → `--page-size A4`, `printMediaType: true` →
    /// `--print-media-type`. `false` and `null` drop the flag and
    /// single-letter keys use one dash.
    ///
    /// An array repeats the flag once per element, so every value stays
    /// bound to its own flag. Flags that take a name and a value (`cookie`,
    /// `customHeader`, `post`, `postFile`, `replace`) must be given as
    /// `[[name, value], ...]`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for objects, nested arrays outside the
    /// paired flags, or a paired flag not given as two-element pairs.
    pub fn to_cli_args(&self) -> Result<Vec<String>> {
        let mut args = Vec::new();

        for (key, value) in &self.0 {
            let flag = to_flag(key);
            let paired = PAIRED_FLAGS.contains(&flag.as_str());
            match value {
                Value::Null | Value::Bool(false) => {}
                Value::Bool(true) if !paired => args.push(flag),
                Value::Array(items) => {
                    for item in items {
                        args.push(flag.clone());
                        args.extend(flag_values(key, item, paired)?);
                    }
                }
                other => {
                    let values = flag_values(key, other, paired)?;
                    args.push(flag);
                    args.extend(values);
                }
            }
        }

        Ok(args)
    }
}

/// Flags whose every occurrence takes a name and a value.
const PAIRED_FLAGS: &[&str] = &[
    "--cookie",
    "--custom-header",
    "--post",
    "--post-file",
    "--replace",
];

fn to_flag(key: &str) -> String {
    if key.chars().count() == 1 {
        return format!("-{key}");
    }

    let mut flag = String::with_capacity(key.len() + 4);
    flag.push_str("--");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            flag.push('-');
            flag.push(ch.to_ascii_lowercase());
        } else {
            flag.push(ch);
        }
    }
    flag
}

/// Arguments following one occurrence of the flag for `key`.
fn flag_values(key: &str, value: &Value, paired: bool) -> Result<Vec<String>> {
    match value {
        Value::Array(pair) if paired => match pair.as_slice() {
            [name, value] => Ok(vec![scalar(key, name)?, scalar(key, value)?]),
            _ => Err(invalid_option(key, "expects [name, value] pairs")),
        },
        _ if paired => Err(invalid_option(key, "expects [name, value] pairs")),
        Value::Array(_) => Err(invalid_option(key, "nested arrays are not allowed")),
        other => Ok(vec![scalar(key, other)?]),
    }
}

fn scalar(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid_option(key, "values must be strings or numbers")),
    }
}

fn invalid_option(key: &str, reason: &str) -> UrlCatError {
    UrlCatError::validation(format!("Invalid option '{key}': {reason}"))
}

/// Validated service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub host: String,

    /// Port the HTTP listener binds to.
    pub port: u16,

    /// Directory that relative `pdfDir` values resolve against.
    pub base_dir: PathBuf,

    /// Renderer executable.
    pub renderer_bin: PathBuf,

    /// Per-task render timeout. `None` waits indefinitely.
    pub render_timeout: Option<Duration>,

    /// Maximum renders in flight per request. `None` launches all at once.
    pub max_concurrency: Option<usize>,

    /// Artifact retention after failures.
    pub cleanup: CleanupPolicy,

    /// Base log level.
    pub log_level: LevelFilter,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            base_dir: PathBuf::from("."),
            renderer_bin: PathBuf::from("wkhtmltopdf"),
            render_timeout: None,
            max_concurrency: None,
            cleanup: CleanupPolicy::default(),
            log_level: LevelFilter::INFO,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Check invariants that clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == Some(0) {
            return Err(UrlCatError::invalid_config(
                "max concurrency must be at least 1",
            ));
        }

        if self.render_timeout == Some(Duration::ZERO) {
            return Err(UrlCatError::invalid_config(
                "render timeout must be greater than zero",
            ));
        }

        if self.renderer_bin.as_os_str().is_empty() {
            return Err(UrlCatError::invalid_config("renderer binary is empty"));
        }

        Ok(())
    }

    /// Socket address for the listener.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                UrlCatError::invalid_config(format!(
                    "Invalid listen address {}:{}: {e}",
                    self.host, self.port
                ))
            })
    }

    /// Resolve a request's `pdfDir` against the base directory.
    pub fn resolve_dir(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.base_dir.join(dir)
        }
    }
}

impl TryFrom<&Cli> for Config {
    type Error = UrlCatError;

    fn try_from(cli: &Cli) -> Result<Self> {
        let log_level = LevelFilter::from_str(&cli.log_level).map_err(|_| {
            UrlCatError::invalid_config(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error, off",
                cli.log_level
            ))
        })?;

        let config = Self {
            host: cli.host.clone(),
            port: cli.port,
            base_dir: cli.base_dir.clone(),
            renderer_bin: cli.renderer_bin.clone(),
            render_timeout: cli.render_timeout_secs.map(Duration::from_secs),
            max_concurrency: cli.max_concurrency,
            cleanup: CleanupPolicy::from_str(&cli.cleanup)?,
            log_level,
            log_format: if cli.log_json {
                LogFormat::Json
            } else {
                LogFormat::Compact
            },
        };

        config.validate()?;
        Ok(config)
    }
}
