//! Fan a category out across every configured symbol.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use setinsider_common::types::ScrapeCategory;

use crate::category::Category;
use crate::scheduler::Scheduler;

/// Identity of one fan-out. Every log line of the run carries `run_id`.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub category: ScrapeCategory,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new(category: ScrapeCategory) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            category,
            started_at: Utc::now(),
        }
    }
}

/// Returned as soon as a run is started. Awaiting it is optional.
pub struct RunHandle {
    run_id: Uuid,
    handle: JoinHandle<()>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait until every symbol task of the run has finished.
    pub async fn wait(self) -> Result<()> {
        let Self { run_id, handle } = self;
        handle
            .await
            .map_err(|e| anyhow::anyhow!("Scrape run {run_id} driver failed: {e}"))
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    scheduler: Arc<Scheduler>,
}

impl Orchestrator {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Start one task per symbol and return immediately.
    ///
    /// Submissions go through the scheduler's admission gate, so a long list
    /// is fed in as slots free up. A symbol that fails is logged and does
    /// not affect the others.
    pub fn run_all<C: Category>(&self, symbols: Vec<String>, category: C) -> RunHandle {
        let run = RunContext::new(category.kind());
        let run_id = run.run_id;
        let span = info_span!("scrape_run", %run_id, category = %run.category);

        let scheduler = self.scheduler.clone();
        let category = Arc::new(category);

        let driver = async move {
            info!(symbols = symbols.len(), "Scrape run started");
            let mut handles = Vec::with_capacity(symbols.len());

            for symbol in symbols {
                // Created here so the spawned task stays a child of the run span.
                let symbol_span = info_span!("scrape_symbol", symbol = %symbol);
                let task = scrape_one(scheduler.clone(), category.clone(), run.clone(), symbol)
                    .instrument(symbol_span);
                match scheduler.submit(task).await {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        error!(error = %e, "Stopped submitting symbols");
                        break;
                    }
                }
            }

            let panicked = join_all(handles)
                .await
                .into_iter()
                .filter(|r| matches!(r, Err(e) if e.is_panic()))
                .count();
            if panicked > 0 {
                error!(panicked, "Symbol tasks panicked");
            }
            info!("Scrape run finished");
        }
        .instrument(span);

        RunHandle {
            run_id,
            handle: tokio::spawn(driver),
        }
    }
}

async fn scrape_one<C: Category>(
    scheduler: Arc<Scheduler>,
    category: Arc<C>,
    run: RunContext,
    symbol: String,
) {
    match scheduler
        .scrape_symbol(&symbol, category.as_ref(), &run)
        .await
    {
        Ok(stats) => info!(%stats, "{} for {} completed", run.category, symbol),
        Err(e) => error!(error = %e, "{} for {} failed", run.category, symbol),
    }
}
