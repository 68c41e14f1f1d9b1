use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use setinsider_common::Config;
use setinsider_scout::{Orchestrator, Scheduler, SetFacade};
use setinsider_store::{migrate, MemoryRecordStore, PgRecordStore, RecordStore};

mod rest;

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub symbols: Arc<Vec<String>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("setinsider=info".parse()?))
        .init();

    let config = Config::from_env()?;
    config.log_redacted();

    let store = open_store(&config).await;
    let fetcher = SetFacade::new(Duration::from_secs(config.http_timeout_secs))?;
    let scheduler = Scheduler::new(Arc::new(fetcher), store, config.max_ongoing_scrapes);

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(Arc::new(scheduler)),
        symbols: Arc::new(config.stock_symbols.clone()),
    });

    let app = rest::router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("SET insider API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SET insider API stopped");
    Ok(())
}

/// Postgres when configured and reachable, otherwise the in-memory store.
async fn open_store(config: &Config) -> Arc<dyn RecordStore> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, scraped records will not survive a restart");
        return Arc::new(MemoryRecordStore::new());
    };

    let connected = async {
        let store = PgRecordStore::connect(url).await?;
        migrate(store.pool()).await?;
        anyhow::Ok(store)
    }
    .await;

    match connected {
        Ok(store) => {
            info!("Connected to Postgres");
            Arc::new(store)
        }
        Err(e) => {
            warn!(error = %e, "Postgres unavailable, falling back to in-memory store");
            Arc::new(MemoryRecordStore::new())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
