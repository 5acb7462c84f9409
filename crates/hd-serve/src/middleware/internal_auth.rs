use crate::config::fingerprint;
use crate::routes::error::error_response;
use crate::{AppState, correlation_id_from_request};
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

pub const HEADER_NAME: &str = "x-internal-token";

/// Gate for `/internal/*`. A missing header is 401, an unknown token 403.
pub async fn require_internal_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let Some(token) = presented else {
        tracing::debug!("missing internal token");
        return error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing internal token".to_string(),
            correlation_id_from_request(&request),
        );
    };

    if !state.tokens.verify(token) {
        tracing::warn!(token = %fingerprint(token), "rejected internal token");
        return error_response(
            StatusCode::FORBIDDEN,
            "forbidden",
            "invalid internal token".to_string(),
            correlation_id_from_request(&request),
        );
    }

    next.run(request).await
}
