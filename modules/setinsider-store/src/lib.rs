//! Record persistence for scraped market data.
//!
//! `RecordStore` is the boundary the scrape core talks to: keyed existence
//! checks plus write-once saves per entity kind. `PgRecordStore` backs it with
//! Postgres; `MemoryRecordStore` keeps everything in process and is used when
//! no database is configured.

pub mod memory;
pub mod migrate;
pub mod postgres;
pub mod record_store;

pub use memory::MemoryRecordStore;
pub use migrate::migrate;
pub use postgres::PgRecordStore;
pub use record_store::RecordStore;
