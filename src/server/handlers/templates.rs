//! Saved template handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

use super::super::state::AppState;
use super::session::{SessionView, snapshot};
use super::{ApiError, ApiResult, blocking};
use crate::error::AdForgeError;
use crate::templates::SavedTemplate;

fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request("Invalid template ID"))
}

/// GET /api/templates
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SavedTemplate>>> {
    let store = state.templates.clone();
    Ok(Json(blocking(move || store.list()).await?))
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub name: String,
}

/// POST /api/templates - save the current session under a name.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveRequest>,
) -> ApiResult<Json<SavedTemplate>> {
    let (content, settings) = {
        let session = state.session.read().await;
        (session.content().clone(), session.settings().clone())
    };
    let store = state.templates.clone();
    let template = blocking(move || store.add(&req.name, &content, &settings)).await?;
    Ok(Json(template))
}

/// DELETE /api/templates/:id
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    let store = state.templates.clone();
    let removed = blocking(move || store.remove(id)).await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}

/// POST /api/templates/:id/load - replace the session with a saved template.
pub async fn load(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    let uuid = parse_id(&id)?;
    let store = state.templates.clone();
    let template = blocking(move || store.get(uuid))
        .await?
        .ok_or_else(|| AdForgeError::NotFound(format!("template {}", id)))?;

    state
        .session
        .write()
        .await
        .load(template.content, template.settings);
    Ok(Json(snapshot(&state).await))
}
