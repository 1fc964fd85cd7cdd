use std::path::{Path, PathBuf};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::AppState;

use super::models::{
    AskRequest, AskResponse, ErrorResponse, FrontendMissingResponse, HealthResponse,
};

pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "rejected ask request");
            return (
                rejection.status(),
                Json(ErrorResponse::new(rejection.body_text())),
            )
                .into_response();
        }
    };

    let Some(agent) = state.agent.as_ref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::bridge_not_found(&state.import_attempts)),
        )
            .into_response();
    };

    let question = payload.question.unwrap_or_default();
    match agent.run(&payload.video_id, &question).await {
        Ok(result) => (StatusCode::OK, Json(AskResponse::from(result))).into_response(),
        Err(err) => {
            tracing::error!(video_id = %payload.video_id, error = %err, "agent run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::exception(err)),
            )
                .into_response()
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Served on `/` when the frontend build directory doesn't exist.
pub async fn frontend_missing(State(state): State<AppState>) -> Json<FrontendMissingResponse> {
    Json(FrontendMissingResponse {
        ok: false,
        msg: format!(
            "Frontend not found in: {}",
            absolute(&state.frontend_dir).display()
        ),
    })
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
