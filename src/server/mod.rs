//! # HTTP Server for Ad Composition and Export
//!
//! Exposes the single editing session, exports, batch runs, presets and saved
//! templates over a JSON API.
//!
//! ## Usage
//!
//! ```bash
//! adforge serve --listen 0.0.0.0:8080 --templates ./templates.json
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/session` | Current content and settings |
//! | PUT | `/api/session/content` | Replace content |
//! | PUT | `/api/session/settings` | Replace settings |
//! | POST | `/api/session/image` | Upload a product photo (multipart `image`) |
//! | GET | `/api/session/preview` | 1x PNG preview |
//! | POST | `/api/session/export` | Export with `ExportSettings` |
//! | POST | `/api/session/batch` | Multipart `csv` + `settings` → zip |
//! | GET | `/api/batch/template` | CSV template download |
//! | GET | `/api/export/sizes` | Built-in target sizes |
//! | GET | `/api/presets` | Built-in demo products |
//! | POST | `/api/presets/:name/load` | Load a preset into the session |
//! | GET/POST | `/api/templates` | List / save the session as a template |
//! | DELETE | `/api/templates/:id` | Delete a template |
//! | POST | `/api/templates/:id/load` | Load a template into the session |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{AdForgeError, Result};

/// Build the API router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        // Editing session
        .route("/api/session", get(handlers::session::get))
        .route("/api/session/content", put(handlers::session::set_content))
        .route("/api/session/settings", put(handlers::session::set_settings))
        .route(
            "/api/session/image",
            post(handlers::session::upload_image).layer(upload_limit),
        )
        .route("/api/session/preview", get(handlers::session::preview))
        // Export
        .route("/api/session/export", post(handlers::export::export))
        .route("/api/export/sizes", get(handlers::export::sizes))
        // Batch
        .route(
            "/api/session/batch",
            post(handlers::batch::run).layer(upload_limit),
        )
        .route("/api/batch/template", get(handlers::batch::template))
        // Presets
        .route("/api/presets", get(handlers::presets::list))
        .route("/api/presets/:name/load", post(handlers::presets::load))
        // Saved templates
        .route(
            "/api/templates",
            get(handlers::templates::list).post(handlers::templates::save),
        )
        .route("/api/templates/:id", delete(handlers::templates::remove))
        .route("/api/templates/:id/load", post(handlers::templates::load))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use adforge::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), adforge::error::AdForgeError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<()> {
    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(AppState::new(config)?);

    info!(
        listen = %listen_addr,
        templates = ?state.config.template_store_path,
        font = ?state.config.font_path,
        "adforge server starting"
    );

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| {
            AdForgeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", listen_addr, e),
            ))
        })?;

    axum::serve(listener, router(state)).await?;

    Ok(())
}
