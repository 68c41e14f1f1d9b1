//! Schema sync run at startup. Every statement is idempotent.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS stocks (
        ticker      TEXT         PRIMARY KEY,
        created_at  TIMESTAMPTZ  NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS prices (
        id                    BIGSERIAL         PRIMARY KEY,
        symbol                TEXT              NOT NULL REFERENCES stocks(ticker),
        date                  TEXT              NOT NULL,
        open_price            DOUBLE PRECISION  NOT NULL,
        close_price           DOUBLE PRECISION  NOT NULL,
        highest_price         DOUBLE PRECISION  NOT NULL,
        lowest_price          DOUBLE PRECISION  NOT NULL,
        change_in_value       DOUBLE PRECISION  NOT NULL,
        change_in_percentage  DOUBLE PRECISION  NOT NULL,
        total_volume          DOUBLE PRECISION  NOT NULL,
        total_value           DOUBLE PRECISION  NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS prices_natural_key ON prices (symbol, date)",
    r#"
    CREATE TABLE IF NOT EXISTS official_news (
        id        BIGSERIAL  PRIMARY KEY,
        symbol    TEXT       NOT NULL REFERENCES stocks(ticker),
        date      TEXT       NOT NULL,
        source    TEXT       NOT NULL,
        headline  TEXT       NOT NULL,
        link      TEXT       NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS official_news_natural_key ON official_news (symbol, headline, link)",
    r#"
    CREATE TABLE IF NOT EXISTS social_media_news (
        id           BIGSERIAL    PRIMARY KEY,
        symbol       TEXT         NOT NULL REFERENCES stocks(ticker),
        observed_at  TIMESTAMPTZ  NOT NULL,
        headline     TEXT         NOT NULL,
        link         TEXT         NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS social_media_news_natural_key ON social_media_news (symbol, link)",
];

pub async fn migrate(pool: &PgPool) -> Result<()> {
    for &statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("migration failed: {}", statement.trim()))?;
    }
    info!(statements = SCHEMA.len(), "Schema up to date");
    Ok(())
}
