//! Tracing subscriber installation.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::LogFormat;
use crate::error::{Result, UrlCatError};

/// Install a global tracing subscriber.
///
/// `level` is the default directive; `RUST_LOG` overrides it when set. Fails
/// if a global subscriber has already been installed.
pub fn init(level: LevelFilter, format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| UrlCatError::other(format!("failed to install tracing subscriber: {err}")))
}
