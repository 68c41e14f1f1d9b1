use std::sync::Arc;

use axum::extract::State;
use tracing::info;

use setinsider_scout::{Category, OfficialNewsCategory, PriceCategory, SocialMediaCategory};

use crate::AppState;

/// Start a run over every configured symbol. Returns immediately; the run
/// finishes in the background and reports through the logs.
fn start_run<C: Category>(state: &AppState, category: C) {
    let kind = category.kind();
    let run = state
        .orchestrator
        .run_all(state.symbols.as_ref().clone(), category);
    info!(run_id = %run.run_id(), category = %kind, "Scrape run accepted");
}

pub async fn scrape_all_stock_prices(State(state): State<Arc<AppState>>) -> &'static str {
    start_run(&state, PriceCategory);
    "started all stock prices scrape"
}

pub async fn scrape_all_stock_official_news(State(state): State<Arc<AppState>>) -> &'static str {
    start_run(&state, OfficialNewsCategory);
    "started all stock official news scrape"
}

pub async fn scrape_all_stock_news(State(state): State<Arc<AppState>>) -> &'static str {
    start_run(&state, SocialMediaCategory);
    "started all stock social media news scrape"
}
