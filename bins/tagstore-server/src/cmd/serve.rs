use std::time::Duration;

use tokio_util::sync::CancellationToken;

use tagstore_api_server::AppState;
use tagstore_engine::config::TagstoreConfig;
use tagstore_engine::SharedStore;

use crate::cli::ServeArgs;
use crate::error::ServerError;

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("tagstore-server starting");

    // --- Load config ---
    let mut config = match &args.config {
        Some(path) => {
            let config = TagstoreConfig::load(path)?;
            tracing::info!(config = %path, "loaded config");
            config
        }
        None => {
            tracing::info!("no config file, using defaults");
            TagstoreConfig::default()
        }
    };
    if let Some(port) = args.port {
        config.api_port = port;
    }

    // --- Seed store ---
    let store = SharedStore::new(config.build_store());
    tracing::info!(
        records = store.len().await,
        fingerprint = %store.strategy(),
        "seeded store"
    );

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    let addr = config.listen_addr();
    let state = AppState::new(store, config.cache_control.clone());
    let api_token = token.clone();
    let mut api_handle = tokio::spawn(async move {
        tagstore_api_server::run(&addr, state, api_token).await
    });

    tracing::info!(port = config.api_port, "server ready");

    // --- Ожидание Ctrl+C ---
    tokio::select! {
        // listener died before any signal (bind failure etc.)
        res = &mut api_handle => {
            res??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
        }
    }
    tracing::info!("shutting down...");

    token.cancel();

    // Drain: give in-flight requests up to 5s
    match tokio::time::timeout(Duration::from_secs(5), &mut api_handle).await {
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "api server error"),
        Ok(_) => {}
        Err(_) => {
            tracing::warn!("api server did not stop in time, aborting");
            api_handle.abort();
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}
