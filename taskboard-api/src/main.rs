//! # Taskboard API Server
//!
//! Serves the users/tasks REST API. Backed by PostgreSQL when `DATABASE_URL`
//! is set, otherwise by an in-memory store that is lost on exit.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskboard cargo run -p taskboard-api
//! ```

use std::sync::Arc;
use taskboard_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use taskboard_shared::db::{migrations, pool};
use taskboard_shared::store::{MemoryStore, PgStore, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let store = open_store(&config).await?;
    tracing::info!(backend = store.backend(), "Store ready");

    let bind_address = config.bind_address();
    let state = AppState::new(store.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "taskboard_api=debug,taskboard_shared=debug,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Connects to PostgreSQL and migrates, or falls back to memory
async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let Some(database) = &config.database else {
        tracing::warn!("DATABASE_URL is not set; using the in-memory store, data will not persist");
        return Ok(Arc::new(MemoryStore::new()));
    };

    migrations::ensure_database_exists(&database.url).await?;

    let pool = pool::create_pool(database).await?;

    migrations::run_migrations(&pool).await?;

    Ok(Arc::new(PgStore::new(pool)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
