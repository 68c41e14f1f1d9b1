// Test mocks for the scrape pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockFetcher (PageFetcher): HashMap-based symbol→rows, with gauges
// - MockRecordStore (RecordStore): MemoryRecordStore plus call log and faults
//
// Plus row builders for canned page content.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Semaphore;

use setinsider_common::types::{
    MentionKey, OfficialNews, OfficialNewsKey, PriceBar, PriceBarKey, RawMentionRow,
    RawOfficialNewsRow, RawPriceRow, SocialMediaMention, StockSymbol,
};
use setinsider_store::{MemoryRecordStore, RecordStore};

use crate::fetcher::PageFetcher;

// ---------------------------------------------------------------------------
// Row builders
// ---------------------------------------------------------------------------

/// A well-formed price row for `date` (DD/MM/YYYY).
pub fn price_row(date: &str) -> RawPriceRow {
    RawPriceRow {
        date: date.to_string(),
        open: "34.00".into(),
        high: "35.50".into(),
        low: "33.75".into(),
        close: "35.25".into(),
        change_value: "+1.25".into(),
        change_pct: "+3.68".into(),
        volume: "1,234,500".into(),
        value: "43,210.50".into(),
    }
}

pub fn official_news_row(headline: &str, link: &str) -> RawOfficialNewsRow {
    RawOfficialNewsRow {
        date: "12/01/2021 17:45".into(),
        source: "SET".into(),
        headline: headline.to_string(),
        link: link.to_string(),
    }
}

pub fn mention_row(headline: &str, link: &str) -> RawMentionRow {
    RawMentionRow {
        headline: Some(headline.to_string()),
        link: Some(link.to_string()),
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Gauges {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

struct InFlight<'a>(&'a Gauges);

impl<'a> InFlight<'a> {
    fn enter(gauges: &'a Gauges) -> Self {
        gauges.calls.fetch_add(1, Ordering::SeqCst);
        let now = gauges.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        gauges.peak.fetch_max(now, Ordering::SeqCst);
        Self(gauges)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Canned page content per symbol. Unregistered symbols return no rows.
/// Builder pattern: `.on_prices()`, `.on_official_news()`, `.on_mentions()`.
///
/// `gated()` makes every fetch wait for one permit from the given semaphore,
/// consumed for good, so a test can release fetches one at a time with
/// `add_permits(1)`.
#[derive(Default)]
pub struct MockFetcher {
    prices: HashMap<String, Vec<RawPriceRow>>,
    official_news: HashMap<String, Vec<RawOfficialNewsRow>>,
    mentions: HashMap<String, Vec<RawMentionRow>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    gauges: Gauges,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_prices(mut self, symbol: &str, rows: Vec<RawPriceRow>) -> Self {
        self.prices.insert(symbol.to_string(), rows);
        self
    }

    pub fn on_official_news(mut self, symbol: &str, rows: Vec<RawOfficialNewsRow>) -> Self {
        self.official_news.insert(symbol.to_string(), rows);
        self
    }

    pub fn on_mentions(mut self, symbol: &str, rows: Vec<RawMentionRow>) -> Self {
        self.mentions.insert(symbol.to_string(), rows);
        self
    }

    /// Every fetch for `symbol` fails, as if the page were unreachable.
    pub fn failing_for(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fetches currently in progress.
    pub fn in_flight(&self) -> usize {
        self.gauges.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of fetches ever in progress at once.
    pub fn peak(&self) -> usize {
        self.gauges.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.gauges.calls.load(Ordering::SeqCst)
    }

    async fn serve<T: Clone>(
        &self,
        symbol: &str,
        table: &HashMap<String, Vec<T>>,
    ) -> Result<Vec<T>> {
        let _guard = InFlight::enter(&self.gauges);

        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(symbol) {
            bail!("MockFetcher: page for {symbol} unreachable");
        }

        Ok(table.get(symbol).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn price_rows(&self, symbol: &str) -> Result<Vec<RawPriceRow>> {
        self.serve(symbol, &self.prices).await
    }

    async fn official_news_rows(&self, symbol: &str) -> Result<Vec<RawOfficialNewsRow>> {
        self.serve(symbol, &self.official_news).await
    }

    async fn mention_rows(&self, symbol: &str) -> Result<Vec<RawMentionRow>> {
        self.serve(symbol, &self.mentions).await
    }
}

// ---------------------------------------------------------------------------
// MockRecordStore
// ---------------------------------------------------------------------------

/// MemoryRecordStore with a call log and fault injection.
///
/// Operations are logged as `"<method> <symbol>"` in call order.
#[derive(Default)]
pub struct MockRecordStore {
    inner: MemoryRecordStore,
    operations: Mutex<Vec<String>>,
    exists_calls: AtomicUsize,
    write_calls: AtomicUsize,
    failing_writes: HashSet<String>,
    fail_symbol_saves: bool,
    fail_exists: bool,
    exists_delay: Option<Duration>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Data writes fail when the record's identifying text contains `needle`
    /// (a symbol, a price date, a headline or a link).
    pub fn failing_writes_on(mut self, needle: &str) -> Self {
        self.failing_writes.insert(needle.to_string());
        self
    }

    pub fn failing_symbol_saves(mut self) -> Self {
        self.fail_symbol_saves = true;
        self
    }

    pub fn failing_exists(mut self) -> Self {
        self.fail_exists = true;
        self
    }

    /// Existence checks read the tables, then wait `delay` before answering.
    /// Two tasks on the same key then both see "absent".
    pub fn with_exists_delay(mut self, delay: Duration) -> Self {
        self.exists_delay = Some(delay);
        self
    }

    pub fn inner(&self) -> &MemoryRecordStore {
        &self.inner
    }

    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn log(&self, method: &str, symbol: &str) {
        self.operations
            .lock()
            .unwrap()
            .push(format!("{method} {symbol}"));
    }

    async fn checked(&self, method: &str, symbol: &str, found: Result<bool>) -> Result<bool> {
        self.log(method, symbol);
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exists {
            bail!("MockRecordStore: {method} failed for {symbol}");
        }
        let found = found?;
        if let Some(delay) = self.exists_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(found)
    }

    fn before_write(&self, method: &str, symbol: &str, identity: &[&str]) -> Result<()> {
        self.log(method, symbol);
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let hit = self
            .failing_writes
            .iter()
            .any(|needle| identity.iter().any(|part| part.contains(needle.as_str())));
        if hit {
            bail!("MockRecordStore: {method} failed for {symbol}");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn find_symbol(&self, ticker: &str) -> Result<Option<StockSymbol>> {
        self.log("find_symbol", ticker);
        self.inner.find_symbol(ticker).await
    }

    async fn save_symbol(&self, stock: &StockSymbol) -> Result<()> {
        self.log("save_symbol", &stock.ticker);
        if self.fail_symbol_saves {
            bail!("MockRecordStore: save_symbol failed for {}", stock.ticker);
        }
        self.inner.save_symbol(stock).await
    }

    async fn price_bar_exists(&self, key: &PriceBarKey) -> Result<bool> {
        let found = self.inner.price_bar_exists(key).await;
        self.checked("price_bar_exists", &key.symbol, found).await
    }

    async fn save_price_bar(&self, bar: &PriceBar) -> Result<()> {
        self.before_write("save_price_bar", &bar.symbol, &[bar.symbol.as_str(), bar.date.as_str()])?;
        self.inner.save_price_bar(bar).await
    }

    async fn official_news_exists(&self, key: &OfficialNewsKey) -> Result<bool> {
        let found = self.inner.official_news_exists(key).await;
        self.checked("official_news_exists", &key.symbol, found).await
    }

    async fn save_official_news(&self, news: &OfficialNews) -> Result<()> {
        self.before_write(
            "save_official_news",
            &news.symbol,
            &[news.symbol.as_str(), news.headline.as_str(), news.link.as_str()],
        )?;
        self.inner.save_official_news(news).await
    }

    async fn mention_exists(&self, key: &MentionKey) -> Result<bool> {
        let found = self.inner.mention_exists(key).await;
        self.checked("mention_exists", &key.symbol, found).await
    }

    async fn save_mention(&self, mention: &SocialMediaMention) -> Result<()> {
        self.before_write(
            "save_mention",
            &mention.symbol,
            &[
                mention.symbol.as_str(),
                mention.headline.as_str(),
                mention.link.as_str(),
            ],
        )?;
        self.inner.save_mention(mention).await
    }
}
