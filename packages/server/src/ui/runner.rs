//! Server runner: router construction, binding and serving.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;

use super::{
    config::ServerConfig, handler::websocket_handler, signal::shutdown_signal, state::AppState,
};

/// Path of the WebSocket endpoint
pub const WEBSOCKET_PATH: &str = "/ws";

/// Build the router for the given state.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(WEBSOCKET_PATH, get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until a shutdown signal arrives.
///
/// Fails immediately if the address cannot be bound.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr,
            source,
        })?;

    tracing::info!(
        "Origins: {:?}, duplicate announce: {:?}",
        config.origin_policy,
        config.duplicate_announce
    );
    let state = Arc::new(AppState::new(&config));

    serve(listener, state, shutdown_signal()).await
}

/// Serve `state` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr().map_err(ServerError::Serve)?;
    tracing::info!("Listening on ws://{}{}", local_addr, WEBSOCKET_PATH);

    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}
