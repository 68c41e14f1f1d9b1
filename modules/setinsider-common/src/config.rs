use std::env;

use tracing::info;

use crate::error::SetInsiderError;
use crate::symbols::SET50_SYMBOLS;

const DEFAULT_MAX_ONGOING_SCRAPES: usize = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres. None means run against the in-memory store.
    pub database_url: Option<String>,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Scraping
    pub max_ongoing_scrapes: usize,
    pub stock_symbols: Vec<String>,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, after filling in any
    /// unset ones from a `.env` file.
    pub fn from_env() -> Result<Self, SetInsiderError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SetInsiderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let web_host = lookup("WEB_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let web_port = match lookup("PORT").or_else(|| lookup("WEB_PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| SetInsiderError::Config(format!("PORT must be a number, got {raw:?}")))?,
            None => 3000,
        };

        let max_ongoing_scrapes = match lookup("MAX_ONGOING_SCRAPES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(SetInsiderError::Config(format!(
                        "MAX_ONGOING_SCRAPES must be a positive integer, got {raw:?}"
                    )))
                }
            },
            None => DEFAULT_MAX_ONGOING_SCRAPES,
        };

        let stock_symbols = match lookup("STOCK_SYMBOLS") {
            Some(raw) => parse_symbol_list(&raw),
            None => SET50_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };
        if stock_symbols.is_empty() {
            return Err(SetInsiderError::Config(
                "STOCK_SYMBOLS must name at least one ticker".to_string(),
            ));
        }

        let http_timeout_secs = match lookup("SCRAPE_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                SetInsiderError::Config(format!(
                    "SCRAPE_HTTP_TIMEOUT_SECS must be a number, got {raw:?}"
                ))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url,
            web_host,
            web_port,
            max_ongoing_scrapes,
            stock_symbols,
            http_timeout_secs,
        })
    }

    /// Log the effective configuration with credentials masked.
    pub fn log_redacted(&self) {
        let database = self
            .database_url
            .as_deref()
            .map(redact_url)
            .unwrap_or_else(|| "<in-memory>".to_string());

        info!(
            database = database.as_str(),
            web_host = self.web_host.as_str(),
            web_port = self.web_port,
            max_ongoing_scrapes = self.max_ongoing_scrapes,
            symbols = self.stock_symbols.len(),
            http_timeout_secs = self.http_timeout_secs,
            "Loaded configuration"
        );
    }
}

fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}
