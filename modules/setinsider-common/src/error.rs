use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetInsiderError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Failure classes of the scrape core.
///
/// `Fetch` aborts one symbol's task. `MalformedRecord` and `Persistence` skip a
/// single record and the task carries on with the rest of the page.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl ScrapeError {
    pub fn fetch(err: anyhow::Error) -> Self {
        Self::Fetch(format!("{err:#}"))
    }

    pub fn persistence(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord(_))
    }
}
