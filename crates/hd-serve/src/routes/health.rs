use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use hd_core::error::StoreError;
use hd_db::DbStore;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Response {
    let probe = tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        DbStore::open(&state.config.db_path, state.config.store_timeout())?.ping()
    })
    .await;
    let failure = match probe {
        Ok(Ok(())) => return Json(HealthResponse { status: "ok" }).into_response(),
        Ok(Err(err)) => err.to_string(),
        Err(err) => err.to_string(),
    };
    tracing::warn!(error = %failure, "health probe failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(HealthResponse {
            status: "unavailable",
        }),
    )
        .into_response()
}
