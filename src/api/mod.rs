//! HTTP surface.
//!
//! - `POST /api/ask` - forward a question about a video to the agent
//! - `GET /health` - liveness
//! - everything else - the frontend build directory, if it exists

mod handlers;
mod models;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::AppState;

pub use handlers::{ask, frontend_missing, health, not_found};
pub use models::{AskRequest, AskResponse, ErrorResponse, FrontendMissingResponse, HealthResponse};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/ask", post(ask))
        .route("/health", get(health));

    let app = if state.frontend_dir.is_dir() {
        tracing::info!(dir = %state.frontend_dir.display(), "serving frontend");
        api.fallback_service(
            ServeDir::new(&state.frontend_dir).append_index_html_on_directories(true),
        )
    } else {
        tracing::warn!(dir = %state.frontend_dir.display(), "frontend directory not found");
        api.route("/", get(frontend_missing)).fallback(not_found)
    };

    app.with_state(state)
}
