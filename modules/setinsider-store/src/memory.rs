//! In-process store. Nothing survives a restart.
//!
//! Saves append without a uniqueness check, so the check-then-write race
//! between two tasks on the same key shows up here as a duplicate row.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::warn;

use setinsider_common::types::{
    MentionKey, OfficialNews, OfficialNewsKey, PriceBar, PriceBarKey, SocialMediaMention,
    StockSymbol,
};

use crate::record_store::RecordStore;

#[derive(Default)]
struct Tables {
    symbols: Vec<StockSymbol>,
    price_bars: Vec<PriceBar>,
    official_news: Vec<OfficialNews>,
    mentions: Vec<SocialMediaMention>,
}

#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> Vec<StockSymbol> {
        self.snapshot(|t| t.symbols.clone())
    }

    pub fn price_bars(&self) -> Vec<PriceBar> {
        self.snapshot(|t| t.price_bars.clone())
    }

    pub fn official_news(&self) -> Vec<OfficialNews> {
        self.snapshot(|t| t.official_news.clone())
    }

    pub fn mentions(&self) -> Vec<SocialMediaMention> {
        self.snapshot(|t| t.mentions.clone())
    }

    /// Read-only copy of a table. A poisoned lock still holds every row
    /// saved before the panic, so those rows are returned rather than hidden.
    fn snapshot<T>(&self, read: impl FnOnce(&Tables) -> T) -> T {
        match self.tables.lock() {
            Ok(tables) => read(&*tables),
            Err(poisoned) => {
                warn!("Memory store lock poisoned, reading the last saved state");
                read(&*poisoned.into_inner())
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_symbol(&self, ticker: &str) -> Result<Option<StockSymbol>> {
        Ok(self
            .lock()?
            .symbols
            .iter()
            .find(|s| s.ticker == ticker)
            .cloned())
    }

    async fn save_symbol(&self, stock: &StockSymbol) -> Result<()> {
        let mut tables = self.lock()?;
        if !tables.symbols.iter().any(|s| s.ticker == stock.ticker) {
            tables.symbols.push(stock.clone());
        }
        Ok(())
    }

    async fn price_bar_exists(&self, key: &PriceBarKey) -> Result<bool> {
        Ok(self
            .lock()?
            .price_bars
            .iter()
            .any(|b| b.symbol == key.symbol && b.date == key.date))
    }

    async fn save_price_bar(&self, bar: &PriceBar) -> Result<()> {
        self.lock()?.price_bars.push(bar.clone());
        Ok(())
    }

    async fn official_news_exists(&self, key: &OfficialNewsKey) -> Result<bool> {
        Ok(self.lock()?.official_news.iter().any(|n| {
            n.symbol == key.symbol && n.headline == key.headline && n.link == key.link
        }))
    }

    async fn save_official_news(&self, news: &OfficialNews) -> Result<()> {
        self.lock()?.official_news.push(news.clone());
        Ok(())
    }

    async fn mention_exists(&self, key: &MentionKey) -> Result<bool> {
        Ok(self
            .lock()?
            .mentions
            .iter()
            .any(|m| m.symbol == key.symbol && m.link == key.link))
    }

    async fn save_mention(&self, mention: &SocialMediaMention) -> Result<()> {
        self.lock()?.mentions.push(mention.clone());
        Ok(())
    }
}
