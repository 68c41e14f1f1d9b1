use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::parse::{parse_number, reorder_date, required_text};

// --- Category ---

/// A scrape target type with its own page, row shape and storage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeCategory {
    Price,
    OfficialNews,
    SocialMediaNews,
}

impl fmt::Display for ScrapeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeCategory::Price => write!(f, "Price"),
            ScrapeCategory::OfficialNews => write!(f, "Official News"),
            ScrapeCategory::SocialMediaNews => write!(f, "Social Media News"),
        }
    }
}

// --- Stored entities ---

/// Registry entry for a ticker. Created lazily the first time a symbol is scraped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSymbol {
    pub ticker: String,
    pub created_at: DateTime<Utc>,
}

impl StockSymbol {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            created_at: Utc::now(),
        }
    }
}

/// One daily trading bar. Natural key: (symbol, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    /// `YYYY/MM/DD`, as reordered from the page.
    pub date: String,
    pub open_price: f64,
    pub close_price: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub change_in_value: f64,
    pub change_in_percentage: f64,
    pub total_volume: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceBarKey {
    pub symbol: String,
    pub date: String,
}

impl PriceBar {
    pub fn from_raw(stock: &StockSymbol, raw: RawPriceRow) -> Result<Self, ScrapeError> {
        Ok(Self {
            symbol: stock.ticker.clone(),
            date: reorder_date(&raw.date)?,
            open_price: parse_number("open", &raw.open)?,
            close_price: parse_number("close", &raw.close)?,
            highest_price: parse_number("high", &raw.high)?,
            lowest_price: parse_number("low", &raw.low)?,
            change_in_value: parse_number("change", &raw.change_value)?,
            change_in_percentage: parse_number("change %", &raw.change_pct)?,
            total_volume: parse_number("volume", &raw.volume)?,
            total_value: parse_number("value", &raw.value)?,
        })
    }

    pub fn key(&self) -> PriceBarKey {
        PriceBarKey {
            symbol: self.symbol.clone(),
            date: self.date.clone(),
        }
    }
}

/// A company announcement from the exchange. Natural key: (symbol, headline, link).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialNews {
    pub symbol: String,
    pub date: String,
    pub source: String,
    pub headline: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OfficialNewsKey {
    pub symbol: String,
    pub headline: String,
    pub link: String,
}

impl OfficialNews {
    pub fn from_raw(stock: &StockSymbol, raw: RawOfficialNewsRow) -> Result<Self, ScrapeError> {
        Ok(Self {
            symbol: stock.ticker.clone(),
            // Dates the reorder cannot read (Thai month names) are kept as published.
            date: reorder_date(&raw.date).unwrap_or_else(|_| raw.date.trim().to_string()),
            source: raw.source.trim().to_string(),
            headline: required_text("headline", Some(&raw.headline))?,
            link: required_text("link", Some(&raw.link))?,
        })
    }

    pub fn key(&self) -> OfficialNewsKey {
        OfficialNewsKey {
            symbol: self.symbol.clone(),
            headline: self.headline.clone(),
            link: self.link.clone(),
        }
    }
}

/// A social media thread mentioning a symbol. Natural key: (symbol, link).
///
/// The source page carries no publication date, so `observed_at` is the
/// timestamp of the scrape run that first saw the mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialMediaMention {
    pub symbol: String,
    pub observed_at: DateTime<Utc>,
    pub headline: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MentionKey {
    pub symbol: String,
    pub link: String,
}

impl SocialMediaMention {
    pub fn from_raw(
        stock: &StockSymbol,
        raw: RawMentionRow,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            symbol: stock.ticker.clone(),
            observed_at,
            headline: required_text("headline", raw.headline.as_deref())?,
            link: required_text("link", raw.link.as_deref())?,
        })
    }

    pub fn key(&self) -> MentionKey {
        MentionKey {
            symbol: self.symbol.clone(),
            link: self.link.clone(),
        }
    }
}

// --- Raw rows as extracted from the pages (all text) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRow {
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub change_value: String,
    pub change_pct: String,
    pub volume: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOfficialNewsRow {
    pub date: String,
    pub source: String,
    pub headline: String,
    pub link: String,
}

/// Either field may be absent when the row markup is incomplete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMentionRow {
    pub headline: Option<String>,
    pub link: Option<String>,
}
