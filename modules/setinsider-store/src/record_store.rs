use anyhow::Result;
use async_trait::async_trait;

use setinsider_common::types::{
    MentionKey, OfficialNews, OfficialNewsKey, PriceBar, PriceBarKey, SocialMediaMention,
    StockSymbol,
};

/// Keyed existence checks and saves, one pair per entity kind.
///
/// Check and save are separate calls. Two callers racing on the same natural
/// key can both see "absent"; whether the second save lands as a duplicate is
/// up to the implementation.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // --- Symbol registry ---

    async fn find_symbol(&self, ticker: &str) -> Result<Option<StockSymbol>>;

    async fn save_symbol(&self, stock: &StockSymbol) -> Result<()>;

    // --- Price bars ---

    async fn price_bar_exists(&self, key: &PriceBarKey) -> Result<bool>;

    async fn save_price_bar(&self, bar: &PriceBar) -> Result<()>;

    // --- Official news ---

    async fn official_news_exists(&self, key: &OfficialNewsKey) -> Result<bool>;

    async fn save_official_news(&self, news: &OfficialNews) -> Result<()>;

    // --- Social media mentions ---

    async fn mention_exists(&self, key: &MentionKey) -> Result<bool>;

    async fn save_mention(&self, mention: &SocialMediaMention) -> Result<()>;
}
