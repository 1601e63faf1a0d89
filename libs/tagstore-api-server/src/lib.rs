mod error;
mod http;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;

use tagstore_engine::SharedStore;

pub use error::{ApiError, ServeError};

#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
    cache_control: Arc<str>,
}

impl AppState {
    pub fn new(store: SharedStore, cache_control: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            cache_control: cache_control.into(),
        }
    }
}

/// Routes of the conditional-request API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/users/{id}",
            get(http::handle_get_user).put(http::handle_put_user),
        )
        .route("/api/time", get(http::handle_time))
        .with_state(state)
}

/// HTTP API сервер. Runs until `shutdown` is cancelled.
pub async fn run(addr: &str, state: AppState, shutdown: CancellationToken) -> Result<(), ServeError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    tracing::info!(addr = %addr, "api server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(ServeError::Serve)?;

    Ok(())
}
