//! Request handlers.
//!
//! Each handler moves its blocking work (cache lookup, aggregation,
//! rendering) onto `spawn_blocking` and converts the outcome to a response.

use super::error::AppError;
use super::state::AppState;
use crate::page::{self, PageOptions};
use crate::report::{self, report_filename, ReportOptions};
use crate::reports::Analysis;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /
///
/// A dataset that fails to load yields an error page naming the cause,
/// with no charts.
pub async fn dashboard(State(state): State<AppState>) -> Result<(StatusCode, Html<String>), AppError> {
    let page = tokio::task::spawn_blocking(move || match state.cache.get() {
        Ok(dataset) => {
            let analysis = Analysis::compute(&dataset);
            let options = PageOptions {
                title: state.settings.title.clone(),
                sample_rows: state.settings.sample_rows,
            };
            (StatusCode::OK, page::dashboard(&dataset, &analysis, &options))
        }
        Err(e) => {
            warn!(error = %e, "dashboard unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                page::error_page(&state.settings.title, &e.to_string()),
            )
        }
    })
    .await?;
    Ok((page.0, Html(page.1)))
}

/// POST /report
///
/// Returns the PDF as an attachment. Failures return a JSON error body.
pub async fn export_report(State(state): State<AppState>) -> Result<Response, AppError> {
    let (filename, bytes) = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let dataset = state.cache.get()?;
        let options = ReportOptions::now(state.settings.title.clone());
        let bytes = report::generate(&dataset, &options)?;
        Ok((report_filename(options.generated_at), bytes))
    })
    .await??;

    info!(file = %filename, bytes = bytes.len(), "report served");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response())
}
