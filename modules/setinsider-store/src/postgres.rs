//! Postgres-backed record store.
//!
//! Each natural key has a unique index and saves use `ON CONFLICT DO NOTHING`,
//! so two tasks that both pass the existence check for one key leave a single
//! row behind instead of failing or duplicating.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

use setinsider_common::SetInsiderError;
use setinsider_common::types::{
    MentionKey, OfficialNews, OfficialNewsKey, PriceBar, PriceBarKey, SocialMediaMention,
    StockSymbol,
};

use crate::record_store::RecordStore;

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| {
                SetInsiderError::Database(format!("failed to connect to Postgres: {e}"))
            })?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_symbol(&self, ticker: &str) -> Result<Option<StockSymbol>> {
        let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            "SELECT ticker, created_at FROM stocks WHERE ticker = $1",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(ticker, created_at)| StockSymbol { ticker, created_at }))
    }

    async fn save_symbol(&self, stock: &StockSymbol) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stocks (ticker, created_at)
            VALUES ($1, $2)
            ON CONFLICT (ticker) DO NOTHING
            "#,
        )
        .bind(&stock.ticker)
        .bind(stock.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn price_bar_exists(&self, key: &PriceBarKey) -> Result<bool> {
        let row = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (SELECT 1 FROM prices WHERE symbol = $1 AND date = $2)",
        )
        .bind(&key.symbol)
        .bind(&key.date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn save_price_bar(&self, bar: &PriceBar) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO prices (symbol, date, open_price, close_price, highest_price, lowest_price,
                                change_in_value, change_in_percentage, total_volume, total_value)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (symbol, date) DO NOTHING
            "#,
        )
        .bind(&bar.symbol)
        .bind(&bar.date)
        .bind(bar.open_price)
        .bind(bar.close_price)
        .bind(bar.highest_price)
        .bind(bar.lowest_price)
        .bind(bar.change_in_value)
        .bind(bar.change_in_percentage)
        .bind(bar.total_volume)
        .bind(bar.total_value)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                symbol = bar.symbol.as_str(),
                date = bar.date.as_str(),
                "Price bar already stored by a concurrent writer"
            );
        }
        Ok(())
    }

    async fn official_news_exists(&self, key: &OfficialNewsKey) -> Result<bool> {
        let row = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM official_news WHERE symbol = $1 AND headline = $2 AND link = $3
            )
            "#,
        )
        .bind(&key.symbol)
        .bind(&key.headline)
        .bind(&key.link)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn save_official_news(&self, news: &OfficialNews) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO official_news (symbol, date, source, headline, link)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (symbol, headline, link) DO NOTHING
            "#,
        )
        .bind(&news.symbol)
        .bind(&news.date)
        .bind(&news.source)
        .bind(&news.headline)
        .bind(&news.link)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mention_exists(&self, key: &MentionKey) -> Result<bool> {
        let row = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS (SELECT 1 FROM social_media_news WHERE symbol = $1 AND link = $2)",
        )
        .bind(&key.symbol)
        .bind(&key.link)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn save_mention(&self, mention: &SocialMediaMention) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO social_media_news (symbol, observed_at, headline, link)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (symbol, link) DO NOTHING
            "#,
        )
        .bind(&mention.symbol)
        .bind(mention.observed_at)
        .bind(&mention.headline)
        .bind(&mention.link)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
