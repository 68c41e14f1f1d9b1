//! Scrape categories. Each one bundles the page extractor, the row
//! normalizer, the natural-key function and the store operations that the
//! scheduler plugs into the dedupe-sync pipeline.

use std::fmt::Debug;

use anyhow::Result;
use async_trait::async_trait;

use setinsider_common::types::{
    MentionKey, OfficialNews, OfficialNewsKey, PriceBar, PriceBarKey, RawMentionRow,
    RawOfficialNewsRow, RawPriceRow, ScrapeCategory, SocialMediaMention, StockSymbol,
};
use setinsider_common::ScrapeError;
use setinsider_store::RecordStore;

use crate::fetcher::PageFetcher;
use crate::orchestrator::RunContext;

#[async_trait]
pub trait Category: Send + Sync + 'static {
    type Raw: Send + 'static;
    type Record: Send + Sync + 'static;
    type Key: Debug + Send + Sync + 'static;

    fn kind(&self) -> ScrapeCategory;

    async fn fetch(&self, fetcher: &dyn PageFetcher, symbol: &str) -> Result<Vec<Self::Raw>>;

    /// Parse one raw row into a typed record. Failures are `MalformedRecord`.
    fn normalize(
        &self,
        stock: &StockSymbol,
        raw: Self::Raw,
        run: &RunContext,
    ) -> Result<Self::Record, ScrapeError>;

    fn key(&self, record: &Self::Record) -> Self::Key;

    async fn exists(&self, store: &dyn RecordStore, key: &Self::Key) -> Result<bool>;

    async fn write(&self, store: &dyn RecordStore, record: &Self::Record) -> Result<()>;
}

// --- Daily price bars ---

#[derive(Debug, Clone, Copy, Default)]
pub struct PriceCategory;

#[async_trait]
impl Category for PriceCategory {
    type Raw = RawPriceRow;
    type Record = PriceBar;
    type Key = PriceBarKey;

    fn kind(&self) -> ScrapeCategory {
        ScrapeCategory::Price
    }

    async fn fetch(&self, fetcher: &dyn PageFetcher, symbol: &str) -> Result<Vec<RawPriceRow>> {
        fetcher.price_rows(symbol).await
    }

    fn normalize(
        &self,
        stock: &StockSymbol,
        raw: RawPriceRow,
        _run: &RunContext,
    ) -> Result<PriceBar, ScrapeError> {
        PriceBar::from_raw(stock, raw)
    }

    fn key(&self, record: &PriceBar) -> PriceBarKey {
        record.key()
    }

    async fn exists(&self, store: &dyn RecordStore, key: &PriceBarKey) -> Result<bool> {
        store.price_bar_exists(key).await
    }

    async fn write(&self, store: &dyn RecordStore, record: &PriceBar) -> Result<()> {
        store.save_price_bar(record).await
    }
}

// --- Exchange announcements ---

#[derive(Debug, Clone, Copy, Default)]
pub struct OfficialNewsCategory;

#[async_trait]
impl Category for OfficialNewsCategory {
    type Raw = RawOfficialNewsRow;
    type Record = OfficialNews;
    type Key = OfficialNewsKey;

    fn kind(&self) -> ScrapeCategory {
        ScrapeCategory::OfficialNews
    }

    async fn fetch(
        &self,
        fetcher: &dyn PageFetcher,
        symbol: &str,
    ) -> Result<Vec<RawOfficialNewsRow>> {
        fetcher.official_news_rows(symbol).await
    }

    fn normalize(
        &self,
        stock: &StockSymbol,
        raw: RawOfficialNewsRow,
        _run: &RunContext,
    ) -> Result<OfficialNews, ScrapeError> {
        OfficialNews::from_raw(stock, raw)
    }

    fn key(&self, record: &OfficialNews) -> OfficialNewsKey {
        record.key()
    }

    async fn exists(&self, store: &dyn RecordStore, key: &OfficialNewsKey) -> Result<bool> {
        store.official_news_exists(key).await
    }

    async fn write(&self, store: &dyn RecordStore, record: &OfficialNews) -> Result<()> {
        store.save_official_news(record).await
    }
}

// --- Social media mentions ---

#[derive(Debug, Clone, Copy, Default)]
pub struct SocialMediaCategory;

#[async_trait]
impl Category for SocialMediaCategory {
    type Raw = RawMentionRow;
    type Record = SocialMediaMention;
    type Key = MentionKey;

    fn kind(&self) -> ScrapeCategory {
        ScrapeCategory::SocialMediaNews
    }

    async fn fetch(&self, fetcher: &dyn PageFetcher, symbol: &str) -> Result<Vec<RawMentionRow>> {
        fetcher.mention_rows(symbol).await
    }

    /// The thread page has no publication date; stamp the run's start time.
    fn normalize(
        &self,
        stock: &StockSymbol,
        raw: RawMentionRow,
        run: &RunContext,
    ) -> Result<SocialMediaMention, ScrapeError> {
        SocialMediaMention::from_raw(stock, raw, run.started_at)
    }

    fn key(&self, record: &SocialMediaMention) -> MentionKey {
        record.key()
    }

    async fn exists(&self, store: &dyn RecordStore, key: &MentionKey) -> Result<bool> {
        store.mention_exists(key).await
    }

    async fn write(&self, store: &dyn RecordStore, record: &SocialMediaMention) -> Result<()> {
        store.save_mention(record).await
    }
}
