//! Editing session handlers.

use axum::{
    Json,
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::super::state::AppState;
use super::{ApiError, ApiResult, blocking};
use crate::export::export_preview;
use crate::model::{ProductContent, ProductImage, TemplateSettings};
use crate::preprocess::{encode_png, remove_background};

/// The editing session as seen by the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub content: ProductContent,
    pub settings: TemplateSettings,
    pub generation: u64,
    pub is_exporting: bool,
}

pub(super) async fn snapshot(state: &AppState) -> SessionView {
    let session = state.session.read().await;
    SessionView {
        content: session.content().clone(),
        settings: session.settings().clone(),
        generation: session.generation(),
        is_exporting: state.gate.is_exporting(),
    }
}

/// GET /api/session
pub async fn get(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(snapshot(&state).await)
}

/// PUT /api/session/content
pub async fn set_content(
    State(state): State<Arc<AppState>>,
    Json(content): Json<ProductContent>,
) -> Json<SessionView> {
    state.session.write().await.set_content(content);
    Json(snapshot(&state).await)
}

/// PUT /api/session/settings
pub async fn set_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<TemplateSettings>,
) -> Json<SessionView> {
    state.session.write().await.set_settings(settings);
    Json(snapshot(&state).await)
}

/// Response from the image upload endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub filename: String,
    /// False when the photo could not be decoded and was kept as uploaded.
    pub background_removed: bool,
    pub cleared_pixels: usize,
}

/// POST /api/session/image - multipart field `image`.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("image") {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read image: {}", e)))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::bad_request("No image field found"))?;

    let hint = filename.clone();
    let processed = blocking(move || Ok(remove_background(&bytes, Some(&hint)))).await?;

    let image = if processed.removed {
        ProductImage::png(processed.bytes)
    } else {
        let mime = image::guess_format(&processed.bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        ProductImage::Encoded {
            mime: mime.to_string(),
            data: processed.bytes,
        }
    };

    {
        let mut session = state.session.write().await;
        let mut content = session.content().clone();
        content.image = Some(image);
        session.set_content(content);
    }
    info!(filename = %filename, removed = processed.removed, "product image uploaded");

    Ok(Json(UploadResponse {
        filename,
        background_removed: processed.removed,
        cleared_pixels: processed.cleared_pixels,
    }))
}

/// GET /api/session/preview - 1x PNG of the current session.
pub async fn preview(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let composer = state.session.read().await.clone();
    let png = blocking(move || {
        let bitmap = export_preview(&composer.renderer(), composer.settings().background_color)?;
        encode_png(&bitmap)
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
