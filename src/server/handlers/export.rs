//! Single export handlers.

use axum::{Json, extract::State, response::Response};
use std::sync::Arc;
use tracing::info;

use super::super::state::AppState;
use super::{ApiResult, attachment, blocking};
use crate::error::AdForgeError;
use crate::export::{export_as_image_file, export_file_name};
use crate::model::{ExportSettings, TargetSize};

/// POST /api/session/export - render the session and download the file.
///
/// The frame is rendered from a snapshot and only accepted if the session
/// was not edited while it rendered.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<ExportSettings>,
) -> ApiResult<Response> {
    let encoding = settings
        .encoding()
        .ok_or(AdForgeError::UnsupportedFormat(settings.format))?;
    let _guard = state.gate.try_begin()?;

    let snapshot = state.session.read().await.clone();
    let target = settings.target_size.clone();
    let frame = blocking(move || snapshot.render_frame(&target)).await?;
    let bitmap = state.session.read().await.capture(frame)?;

    let bytes = blocking(move || export_as_image_file(&bitmap, encoding)).await?;
    let filename = export_file_name(&settings.filename, encoding);
    info!(filename = %filename, bytes = bytes.len(), "export served");

    Ok(attachment(&filename, encoding.mime(), bytes))
}

/// GET /api/export/sizes - built-in target sizes.
pub async fn sizes() -> Json<Vec<TargetSize>> {
    Json(TargetSize::built_in())
}
