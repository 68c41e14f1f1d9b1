pub mod config;
pub mod error;
pub mod parse;
pub mod symbols;
pub mod types;

pub use config::Config;
pub use error::{ScrapeError, SetInsiderError};
pub use types::*;
