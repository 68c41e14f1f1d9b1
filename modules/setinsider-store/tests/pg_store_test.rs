//! Integration tests for PgRecordStore.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use chrono::Utc;
use setinsider_common::types::{
    MentionKey, OfficialNews, OfficialNewsKey, PriceBar, PriceBarKey, SocialMediaMention,
    StockSymbol,
};
use setinsider_store::{migrate, PgRecordStore, RecordStore};
use sqlx::PgPool;

/// Get a migrated, empty test database, or skip if no test DB is available.
async fn test_store() -> Option<PgRecordStore> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    migrate(&pool).await.ok()?;

    sqlx::query("TRUNCATE prices, official_news, social_media_news, stocks RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .ok()?;

    Some(PgRecordStore::new(pool))
}

fn bar(symbol: &str, date: &str, close: f64) -> PriceBar {
    PriceBar {
        symbol: symbol.into(),
        date: date.into(),
        open_price: 34.0,
        close_price: close,
        highest_price: 35.5,
        lowest_price: 33.75,
        change_in_value: 0.25,
        change_in_percentage: 0.71,
        total_volume: 1_234_500.0,
        total_value: 43_210.5,
    }
}

async fn registered(store: &PgRecordStore, ticker: &str) {
    store.save_symbol(&StockSymbol::new(ticker)).await.unwrap();
}

// =========================================================================
// Symbol registry
// =========================================================================

#[tokio::test]
async fn find_symbol_returns_none_until_saved() {
    let Some(store) = test_store().await else {
        return;
    };

    assert!(store.find_symbol("XYZ").await.unwrap().is_none());
    registered(&store, "XYZ").await;

    let found = store.find_symbol("XYZ").await.unwrap().unwrap();
    assert_eq!(found.ticker, "XYZ");
}

#[tokio::test]
async fn saving_a_symbol_twice_keeps_one_row() {
    let Some(store) = test_store().await else {
        return;
    };

    registered(&store, "PTT").await;
    registered(&store, "PTT").await;

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stocks WHERE ticker = 'PTT'")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

// =========================================================================
// Natural-key existence and conflict-as-skip
// =========================================================================

#[tokio::test]
async fn price_bar_exists_after_save() {
    let Some(store) = test_store().await else {
        return;
    };
    registered(&store, "PTT").await;

    let key = PriceBarKey {
        symbol: "PTT".into(),
        date: "2021/03/05".into(),
    };
    assert!(!store.price_bar_exists(&key).await.unwrap());

    store.save_price_bar(&bar("PTT", "2021/03/05", 35.0)).await.unwrap();
    assert!(store.price_bar_exists(&key).await.unwrap());
}

#[tokio::test]
async fn racing_price_writes_leave_one_row() {
    let Some(store) = test_store().await else {
        return;
    };
    registered(&store, "PTT").await;

    // Both writers passed the existence check; the unique index absorbs the second.
    store.save_price_bar(&bar("PTT", "2021/03/05", 35.0)).await.unwrap();
    store.save_price_bar(&bar("PTT", "2021/03/05", 36.0)).await.unwrap();

    let (count, close): (i64, f64) = sqlx::query_as(
        "SELECT COUNT(*), MIN(close_price) FROM prices WHERE symbol = 'PTT' AND date = '2021/03/05'",
    )
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(count, 1);
    assert_eq!(close, 35.0, "first write wins");
}

#[tokio::test]
async fn official_news_key_includes_headline_and_link() {
    let Some(store) = test_store().await else {
        return;
    };
    registered(&store, "AOT").await;

    store
        .save_official_news(&OfficialNews {
            symbol: "AOT".into(),
            date: "2021/01/12".into(),
            source: "SET".into(),
            headline: "Financial statement Q4".into(),
            link: "/news/1".into(),
        })
        .await
        .unwrap();

    let key = |headline: &str, link: &str| OfficialNewsKey {
        symbol: "AOT".into(),
        headline: headline.into(),
        link: link.into(),
    };
    assert!(store.official_news_exists(&key("Financial statement Q4", "/news/1")).await.unwrap());
    assert!(!store.official_news_exists(&key("Financial statement Q4", "/news/2")).await.unwrap());
    assert!(!store.official_news_exists(&key("Dividend", "/news/1")).await.unwrap());
}

#[tokio::test]
async fn mention_key_is_symbol_and_link() {
    let Some(store) = test_store().await else {
        return;
    };
    registered(&store, "CPALL").await;
    registered(&store, "PTT").await;

    store
        .save_mention(&SocialMediaMention {
            symbol: "CPALL".into(),
            observed_at: Utc::now(),
            headline: "CPALL breaking out?".into(),
            link: "https://stock.gapfocus.com/talk/1".into(),
        })
        .await
        .unwrap();

    let key = |symbol: &str| MentionKey {
        symbol: symbol.into(),
        link: "https://stock.gapfocus.com/talk/1".into(),
    };
    assert!(store.mention_exists(&key("CPALL")).await.unwrap());
    assert!(!store.mention_exists(&key("PTT")).await.unwrap());
}
