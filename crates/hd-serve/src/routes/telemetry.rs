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
pub struct TelemetryBatchRequest {
    pub events: Vec<Value>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/telemetry/events", post(ingest_events))
        .route("/telemetry/events/{event_id}", get(get_event))
        .with_state(state)
}

pub(crate) async fn ingest_events(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    payload: Result<Json<TelemetryBatchRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => {
            ingest_batch(state, EventStream::Telemetry, request.events, correlation.0).await
        }
        Err(rejection) => map_rejection(&rejection, Some(correlation.0)),
    }
}

pub(crate) async fn get_event(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(event_id): Path<String>,
) -> Response {
    read_event(state, EventStream::Telemetry, event_id, correlation.0).await
}
