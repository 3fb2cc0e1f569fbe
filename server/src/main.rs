use std::process;
use std::sync::Arc;

use todo_core::{DocumentStore, InMemoryStore};
use todo_server::lifecycle::shutdown_signal;
use todo_server::{app_with_timeout, AppState, DrainOutcome, MongoStore, ServerConfig, StoreBackend, TodoServer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "configuration error");
            process::exit(1);
        }
    };
    tracing::info!(
        backend = ?config.backend,
        database = %config.database,
        collection = %config.collection,
        "configuration loaded"
    );

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(error) => {
            tracing::error!(%error, "failed to connect to the document store");
            process::exit(1);
        }
    };

    let addr = match config.listen_addr() {
        Ok(addr) => addr,
        Err(error) => {
            tracing::error!(%error, "invalid listen address");
            process::exit(1);
        }
    };

    let router = app_with_timeout(
        AppState::new(store, config.store_timeout),
        config.request_timeout,
    );
    let server = match TodoServer::bind(addr, router, config.shutdown_grace).await {
        Ok(server) => server,
        Err(error) => {
            tracing::error!(%error, "failed to start server");
            process::exit(1);
        }
    };

    match server.run_until(shutdown_signal()).await {
        Ok(DrainOutcome::Completed) => tracing::info!("server gracefully stopped"),
        Ok(DrainOutcome::GraceElapsed) => {
            tracing::warn!("server stopped with requests still in flight");
        }
        Err(error) => {
            tracing::error!(%error, "server error");
            process::exit(1);
        }
    }
}

async fn open_store(config: &ServerConfig) -> Result<Arc<dyn DocumentStore>, todo_core::StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::Mongo => {
            let store = MongoStore::connect(
                &config.mongodb_uri,
                &config.database,
                &config.collection,
                config.connect_timeout,
            )
            .await?;
            match tokio::time::timeout(config.connect_timeout, store.ping()).await {
                Ok(result) => result?,
                Err(_) => return Err(todo_core::StoreError::Timeout(config.connect_timeout)),
            }
            tracing::info!(uri = %config.mongodb_uri, "connected to MongoDB");
            Ok(Arc::new(store))
        }
    }
}
