pub mod category;
pub mod fetcher;
pub mod orchestrator;
pub mod pipeline;
pub mod scheduler;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use category::{Category, OfficialNewsCategory, PriceCategory, SocialMediaCategory};
pub use fetcher::{PageFetcher, SetFacade};
pub use orchestrator::{Orchestrator, RunContext, RunHandle};
pub use pipeline::{sync_if_absent, SyncOutcome};
pub use scheduler::Scheduler;
pub use stats::ScrapeStats;
