use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hd_core::error::{IngestError, StoreError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &IngestError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code) = match err {
        IngestError::BatchTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
        IngestError::Store(store) => map_store_error(store),
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    envelope(status, code, err.to_string(), correlation_id)
}

fn map_store_error(err: &StoreError) -> (StatusCode, &'static str) {
    match err {
        StoreError::Timeout | StoreError::Unavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
        }
        StoreError::DuplicateKey | StoreError::Corrupt { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    }
}

/// Body problems are a whole-request failure. An over-limit body is 413,
/// anything else about the request shape is 400.
pub fn map_rejection(rejection: &JsonRejection, correlation_id: Option<String>) -> Response {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            rejection.body_text(),
            correlation_id,
        );
    }
    error_response(
        StatusCode::BAD_REQUEST,
        "invalid_input",
        rejection.body_text(),
        correlation_id,
    )
}

pub fn error_response(
    status: StatusCode,
    code: &'static str,
    message: String,
    correlation_id: Option<String>,
) -> Response {
    envelope(status, code, message, correlation_id).into_response()
}

fn envelope(
    status: StatusCode,
    code: &'static str,
    message: String,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    (
        status,
        Json(ErrorEnvelope {
            code: code.to_string(),
            message,
            correlation_id,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_batches_map_to_413() {
        let err = IngestError::BatchTooLarge {
            limit: 1000,
            received: 1001,
        };
        let (status, Json(body)) = map_error(&err, Some("corr_1".to_string()));
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body.code, "payload_too_large");
        assert_eq!(body.message, "batch too large: 1001 events exceeds limit of 1000");
        assert_eq!(body.correlation_id.as_deref(), Some("corr_1"));
    }

    #[test]
    fn store_outages_map_to_503() {
        let err = IngestError::Store(StoreError::Timeout);
        let (status, Json(body)) = map_error(&err, None);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "store_unavailable");
    }
}
