pub mod ai_logs;
pub mod batch;
pub mod error;
pub mod health;
pub mod telemetry;

use crate::AppState;
use crate::middleware::correlation::{CorrelationId, correlation_middleware};
use crate::middleware::internal_auth::require_internal_token;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::middleware;
use tower_http::trace::TraceLayer;
use tracing::Level;

pub fn router(state: AppState) -> Router {
    let internal = Router::new()
        .merge(ai_logs::router(state.clone()))
        .merge(telemetry::router(state.clone()))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_internal_token,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes));

    Router::new()
        .nest("/internal", internal)
        .merge(health::router(state))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let correlation_id = request
                    .extensions()
                    .get::<CorrelationId>()
                    .map(|value| value.0.as_str())
                    .unwrap_or_default();
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    correlation_id
                )
            }),
        )
        .layer(middleware::from_fn(correlation_middleware))
}
