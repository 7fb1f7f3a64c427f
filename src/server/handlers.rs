//! HTTP handlers.
//!
//! Every response is HTTP 200 with `{ message, success }` in the body;
//! failures are reported in-band only.

use axum::{
    Json,
    extract::{RawQuery, State},
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::AppState;
use super::query::TopdfQuery;
use crate::config::RenderOptions;
use crate::convert::{ConversionReport, ConversionRequest};
use crate::error::Result;
use crate::utils::millis;

/// Message sent with a successful conversion.
pub const SUCCESS_MESSAGE: &str = "PDFs merged successfully!";

/// Uniform response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    /// Human readable outcome.
    pub message: String,

    /// Whether the operation succeeded.
    pub success: bool,

    /// Merged document path, on successful conversions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
            path: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
            path: None,
        }
    }
}

/// Handler: GET /
pub async fn handle_health() -> Json<ApiResponse> {
    Json(ApiResponse::ok("OK"))
}

/// Handler: GET /topdf
pub async fn handle_topdf(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Json<ApiResponse> {
    let start = Instant::now();

    match convert(&state, raw.as_deref()).await {
        Ok(report) => {
            info!(
                op = "http::topdf",
                result = "ok",
                partial = report.is_partial(),
                elapsed_ms = millis(start.elapsed()),
                path = %report.merged_path.display(),
                "Request served"
            );

            Json(ApiResponse {
                message: SUCCESS_MESSAGE.to_string(),
                success: true,
                path: Some(report.merged_path.display().to_string()),
            })
        }
        Err(err) => {
            warn!(
                op = "http::topdf",
                result = "error",
                error_code = err.kind(),
                elapsed_ms = millis(start.elapsed()),
                error = %err,
                "Request failed"
            );

            Json(ApiResponse::failed(err.to_string()))
        }
    }
}

async fn convert(state: &AppState, raw: Option<&str>) -> Result<ConversionReport> {
    let query = TopdfQuery::parse(raw)?;

    let request = ConversionRequest {
        urls: query.pdf,
        pdf_dir: query
            .pdf_dir
            .map(|dir| state.config.resolve_dir(Path::new(&dir))),
        options: RenderOptions::with_overrides(query.options),
    };

    // Runs to completion even if the client disconnects
    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move { orchestrator.convert(request).await }).await?
}
