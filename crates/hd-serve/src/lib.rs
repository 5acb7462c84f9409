pub mod config;
pub mod middleware;
pub mod routes;

use axum::Router;
use axum::http::Request;
use config::{Config, InternalTokens};
use hd_core::Ingestor;
use hd_core::error::StoreError;
use hd_db::{DbStore, schema};
use middleware::correlation::CorrelationId;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<InternalTokens>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let tokens = InternalTokens::new(&config.internal_tokens);
        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }

    /// Builds the state and brings the schema up to date once, before any
    /// request opens its own connection.
    pub fn initialize(config: Config) -> Result<Self, StoreError> {
        schema::open_and_migrate(&config.db_path, config.store_timeout())
            .map_err(|err| hd_db::util::map_sqlite_error(&err))?;
        Ok(Self::new(config))
    }
}

/// One connection per request; concurrent batches meet only at the
/// database's primary-key constraint.
pub fn build_ingestor(state: &AppState) -> Result<Ingestor<DbStore>, StoreError> {
    let store = DbStore::open(&state.config.db_path, state.config.store_timeout())?;
    Ok(Ingestor::new(store, state.config.ingest_config()))
}

pub fn correlation_id_from_request<B>(request: &Request<B>) -> Option<String> {
    request
        .extensions()
        .get::<CorrelationId>()
        .map(|value| value.0.clone())
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app(state)).await
}
