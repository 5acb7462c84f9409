use crate::routes::error::{error_response, map_error};
use crate::{AppState, build_ingestor};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hd_core::error::IngestError;
use hd_core::reject_all;
use hd_core::types::{BatchResult, EventId, EventStream};
use serde_json::Value;

/// Runs one batch on a blocking worker. The answer is 200 whenever the batch
/// was accepted, whatever happened to individual items.
pub(crate) async fn ingest_batch(
    state: AppState,
    stream: EventStream,
    items: Vec<Value>,
    correlation_id: String,
) -> Response {
    let span = tracing::Span::current();
    let outcome =
        tokio::task::spawn_blocking(move || span.in_scope(|| run_batch(&state, stream, &items)))
            .await;
    match outcome {
        Ok(Ok(result)) => Json(result).into_response(),
        Ok(Err(err)) => map_error(&err, Some(correlation_id)).into_response(),
        Err(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
            Some(correlation_id),
        ),
    }
}

fn run_batch(
    state: &AppState,
    stream: EventStream,
    items: &[Value],
) -> Result<BatchResult, IngestError> {
    match build_ingestor(state) {
        Ok(ingestor) => ingestor.stream(stream).ingest(items),
        Err(err) => {
            tracing::error!(%stream, error = %err, "store unreachable, failing batch");
            reject_all(&state.config.ingest_config(), items, &err.to_string())
        }
    }
}

pub(crate) async fn read_event(
    state: AppState,
    stream: EventStream,
    raw_id: String,
    correlation_id: String,
) -> Response {
    let event_id = match EventId::new(raw_id) {
        Ok(id) => id,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_input",
                err.to_string(),
                Some(correlation_id),
            );
        }
    };
    let lookup = tokio::task::spawn_blocking(move || -> Result<_, IngestError> {
        let ingestor = build_ingestor(&state)?;
        ingestor.stream(stream).get(&event_id)
    })
    .await;
    match lookup {
        Ok(Ok(Some(record))) => Json(record).into_response(),
        Ok(Ok(None)) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{stream} event not found"),
            Some(correlation_id),
        ),
        Ok(Err(err)) => map_error(&err, Some(correlation_id)).into_response(),
        Err(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
            Some(correlation_id),
        ),
    }
}
