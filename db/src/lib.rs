pub mod cli;
pub mod engine;
pub mod errors;
pub mod http;
pub mod logging;
pub mod persistence_task;

use std::sync::Arc;
use std::time::Duration;

use tokio_graceful::Shutdown;

use cli::ServerConfig;
use engine::{persistence, VectorStore};
use errors::ServerError;
use persistence_task::PersistenceTask;

/// Loads a store from `config.file` if it exists and parses cleanly;
/// otherwise starts empty. A corrupt or dimension-mismatched file is
/// logged and discarded rather than aborting startup, matching the
/// lifecycle described for the CLI adapter.
pub fn load_or_init(config: &ServerConfig) -> VectorStore {
    if config.file.exists() {
        match persistence::load(&config.file, config.dimension) {
            Ok(records) => {
                tracing::info!(count = records.len(), path = ?config.file, "loaded store from disk");
                return VectorStore::from_records(config.dimension, records);
            }
            Err(e) => {
                tracing::warn!(error = %e, path = ?config.file, "failed to load persisted store, starting empty");
            }
        }
    }
    VectorStore::new(config.dimension, 0)
}

/// Runs the HTTP server until a shutdown signal arrives, then flushes a
/// final snapshot to disk.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    if config.vector_size != config.dimension {
        tracing::warn!(
            vector_size = config.vector_size,
            dimension = config.dimension,
            "configured vector size does not match dimension; dimension governs validation"
        );
    }

    let store = Arc::new(load_or_init(&config));
    let shutdown = Shutdown::default();

    let persistence_store = store.clone();
    let persistence_path = config.file.clone();
    let persistence_interval_ms = config.persistence_interval_ms;
    let persistence_guard = shutdown.guard();
    tokio::spawn(async move {
        let task = PersistenceTask::new(persistence_store, persistence_path, persistence_interval_ms);
        task.monitor(persistence_guard).await;
    });

    let app = http::router(store.clone());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, dimension = config.dimension, "listening");

    let server_guard = shutdown.guard();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            server_guard.cancelled().await;
        })
        .await?;

    if shutdown.shutdown_with_limit(Duration::from_secs(10)).await.is_err() {
        tracing::error!("shutdown took longer than timeout");
    }

    let records = store.snapshot();
    persistence::save(&config.file, &records)?;
    tracing::info!(count = records.len(), "persisted store on shutdown");

    Ok(())
}
