use crate::middleware::correlation::CorrelationId;
use crate::routes::batch::{ingest_batch, read_event};
use crate::routes::error::map_rejection;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use hd_core::types::EventStream;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct BulkLogsRequest {
    pub logs: Vec<Value>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ai/logs/bulk", post(bulk_logs))
        .route("/ai/logs/{event_id}", get(get_log))
        .with_state(state)
}

pub(crate) async fn bulk_logs(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    payload: Result<Json<BulkLogsRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => {
            ingest_batch(state, EventStream::AiLog, request.logs, correlation.0).await
        }
        Err(rejection) => map_rejection(&rejection, Some(correlation.0)),
    }
}

pub(crate) async fn get_log(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(event_id): Path<String>,
) -> Response {
    read_event(state, EventStream::AiLog, event_id, correlation.0).await
}
