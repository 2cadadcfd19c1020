//! Batch export handlers.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::super::state::AppState;
use super::{ApiError, ApiResult, attachment};
use crate::batch::{BatchOrchestrator, csv_template, parse_batch_csv};
use crate::model::ExportSettings;

/// POST /api/session/batch
///
/// Multipart fields: `csv` (the product list) and an optional `settings`
/// (JSON `ExportSettings`). Responds with the zip, or 204 when the CSV has no
/// rows.
pub async fn run(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> ApiResult<Response> {
    let mut csv: Option<String> = None;
    let mut settings = ExportSettings::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read field {}: {}", name, e)))?;
        match name.as_str() {
            "csv" => csv = Some(text),
            "settings" => {
                settings = serde_json::from_str(&text)
                    .map_err(|e| ApiError::bad_request(format!("Invalid export settings: {}", e)))?;
            }
            _ => {}
        }
    }

    let csv = csv.ok_or_else(|| ApiError::bad_request("No csv field found"))?;
    let rows = parse_batch_csv(&csv)?;

    let composer = state.session.read().await.clone();
    let orchestrator = BatchOrchestrator::new(state.fetcher.clone(), state.gate.clone());

    match orchestrator.run(composer, &rows, &settings).await? {
        Some(archive) => Ok(attachment(&archive.filename, "application/zip", archive.bytes)),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// GET /api/batch/template - CSV template download.
pub async fn template() -> Response {
    attachment(
        "batch_template.csv",
        "text/csv",
        csv_template().into_bytes(),
    )
}
