//! Preset API handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::super::state::AppState;
use super::ApiResult;
use super::session::{SessionView, snapshot};
use crate::error::AdForgeError;
use crate::model::{Preset, list_presets, preset_by_name};
use crate::preprocess::resolve_product_image;

/// GET /api/presets - list built-in demo products.
pub async fn list() -> Json<Vec<Preset>> {
    Json(list_presets())
}

/// POST /api/presets/:name/load - fetch the preset image and load it.
///
/// A failed image fetch loads the preset without an image.
pub async fn load(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<SessionView>> {
    let preset = preset_by_name(&name).ok_or_else(|| AdForgeError::NotFound(format!("preset {}", name)))?;

    let mut content = preset.content;
    content.image = resolve_product_image(state.fetcher.as_ref(), content.image.take()).await;

    state.session.write().await.set_content(content);
    Ok(Json(snapshot(&state).await))
}
