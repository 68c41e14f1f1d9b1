//! Bounded admission of per-symbol scrape tasks.
//!
//! At most `max_ongoing_scrapes` tasks run at once across every category and
//! every run. A submission past the ceiling waits for a permit; it is never
//! rejected and never dropped.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use setinsider_common::types::StockSymbol;
use setinsider_common::ScrapeError;
use setinsider_store::RecordStore;

use crate::category::Category;
use crate::fetcher::PageFetcher;
use crate::orchestrator::RunContext;
use crate::pipeline::sync_if_absent;
use crate::stats::ScrapeStats;

pub struct Scheduler {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn RecordStore>,
    admission: Arc<Semaphore>,
    ceiling: usize,
}

impl Scheduler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn RecordStore>,
        max_ongoing_scrapes: usize,
    ) -> Self {
        let ceiling = max_ongoing_scrapes.max(1);
        Self {
            fetcher,
            store,
            admission: Arc::new(Semaphore::new(ceiling)),
            ceiling,
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Tasks currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.ceiling - self.admission.available_permits()
    }

    /// Wait for a free slot, then spawn `task` holding it.
    ///
    /// The permit moves into the spawned task and is released when the task
    /// finishes, including when it panics.
    pub async fn submit<F>(&self, task: F) -> Result<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = self
            .admission
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| anyhow::anyhow!("Scrape admission semaphore closed"))?;

        Ok(tokio::spawn(async move {
            let _permit = permit;
            task.await;
        }))
    }

    /// Scrape one symbol for one category.
    ///
    /// Registry or fetch failures abort the task. A bad row is counted and
    /// skipped; the rows after it still go through.
    pub async fn scrape_symbol<C: Category>(
        &self,
        symbol: &str,
        category: &C,
        run: &RunContext,
    ) -> Result<ScrapeStats, ScrapeError> {
        let stock = self.resolve_symbol(symbol).await?;

        let rows = category
            .fetch(self.fetcher.as_ref(), symbol)
            .await
            .map_err(ScrapeError::fetch)?;

        let store = self.store.as_ref();
        let mut stats = ScrapeStats::default();

        for raw in rows {
            stats.records_seen += 1;

            let record = match category.normalize(&stock, raw, run) {
                Ok(record) => record,
                Err(e) => {
                    warn!(symbol, error = %e, "Skipping malformed row");
                    stats.record_malformed();
                    continue;
                }
            };

            let result = sync_if_absent(
                record,
                |r| category.key(r),
                |key| async move { category.exists(store, &key).await },
                |record| async move { category.write(store, &record).await },
            )
            .await;

            match result {
                Ok(outcome) => stats.record_outcome(outcome),
                Err(e) => {
                    warn!(symbol, error = %e, "Failed to persist row");
                    stats.record_persistence_failure();
                }
            }
        }

        Ok(stats)
    }

    /// Look up the symbol, registering it first if this is the first time
    /// it has been seen.
    async fn resolve_symbol(&self, ticker: &str) -> Result<StockSymbol, ScrapeError> {
        if let Some(stock) = self
            .store
            .find_symbol(ticker)
            .await
            .map_err(ScrapeError::persistence)?
        {
            return Ok(stock);
        }

        let stock = StockSymbol::new(ticker);
        self.store
            .save_symbol(&stock)
            .await
            .map_err(ScrapeError::persistence)?;
        debug!(symbol = ticker, "Registered new symbol");
        Ok(stock)
    }
}
