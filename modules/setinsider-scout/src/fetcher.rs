use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use setinsider_common::types::{RawMentionRow, RawOfficialNewsRow, RawPriceRow};

// --- PageFetcher trait ---

/// Fetch one page for a symbol and pull its rows out as raw text fields.
///
/// Errors cover network failures and pages whose markup no longer matches
/// what the extractor expects. Callers do not retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn price_rows(&self, symbol: &str) -> Result<Vec<RawPriceRow>>;

    async fn official_news_rows(&self, symbol: &str) -> Result<Vec<RawOfficialNewsRow>>;

    async fn mention_rows(&self, symbol: &str) -> Result<Vec<RawMentionRow>>;
}

// --- SET / gapfocus scraper ---

const SET_HISTORICAL_TRADING_URL: &str = "https://www.set.or.th/set/historicaltrading.do";
const SET_COMPANY_NEWS_URL: &str = "https://www.set.or.th/set/companynews.do";
const GAPFOCUS_DETAIL_URL: &str = "https://stock.gapfocus.com/detail/";

/// Live fetcher for the Stock Exchange of Thailand pages and gapfocus talk threads.
pub struct SetFacade {
    client: reqwest::Client,
}

impl SetFacade {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("setinsider/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        info!(timeout_secs = timeout.as_secs(), "Using SetFacade");
        Ok(Self { client })
    }

    async fn get_html(&self, url: &str) -> Result<String> {
        debug!(url, "Fetching page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;

        let html = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {url}"))?;
        debug!(url, bytes = html.len(), "Fetched page");
        Ok(html)
    }
}

#[async_trait]
impl PageFetcher for SetFacade {
    async fn price_rows(&self, symbol: &str) -> Result<Vec<RawPriceRow>> {
        let url = price_page_url(symbol)?;
        let html = self.get_html(&url).await?;
        extract_price_rows(&html).with_context(|| format!("Unexpected price page for {symbol}"))
    }

    async fn official_news_rows(&self, symbol: &str) -> Result<Vec<RawOfficialNewsRow>> {
        let url = official_news_page_url(symbol)?;
        let html = self.get_html(&url).await?;
        extract_official_news_rows(&html)
            .with_context(|| format!("Unexpected company news page for {symbol}"))
    }

    async fn mention_rows(&self, symbol: &str) -> Result<Vec<RawMentionRow>> {
        let url = mention_page_url(symbol)?;
        let html = self.get_html(&url).await?;
        extract_mention_rows(&html)
    }
}

// --- Page URLs ---

pub fn price_page_url(symbol: &str) -> Result<String> {
    let url = url::Url::parse_with_params(
        SET_HISTORICAL_TRADING_URL,
        &[
            ("symbol", symbol),
            ("ssoPageId", "2"),
            ("language", "th"),
            ("country", "TH"),
        ],
    )?;
    Ok(url.into())
}

pub fn official_news_page_url(symbol: &str) -> Result<String> {
    let url = url::Url::parse_with_params(
        SET_COMPANY_NEWS_URL,
        &[
            ("symbol", symbol),
            ("ssoPageId", "8"),
            ("language", "th"),
            ("country", "TH"),
        ],
    )?;
    Ok(url.into())
}

pub fn mention_page_url(symbol: &str) -> Result<String> {
    let url = url::Url::parse(GAPFOCUS_DETAIL_URL)?.join(symbol)?;
    Ok(url.into())
}

// --- Extraction ---
//
// Short rows are kept with empty cells rather than failing the page; the
// pipeline rejects them one at a time as malformed records.

/// Historical trading table: the first `.table`, one body row per trading day.
pub fn extract_price_rows(html: &str) -> Result<Vec<RawPriceRow>> {
    let document = Html::parse_document(html);
    let table = document
        .select(&selector(".table")?)
        .next()
        .ok_or_else(|| anyhow!("price table not found"))?;

    let row_selector = selector("tbody > tr")?;
    let cell_selector = selector("td")?;

    let rows = table
        .select(&row_selector)
        .map(|row| {
            let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
            RawPriceRow {
                date: cell_text(&cells, 0),
                open: cell_text(&cells, 1),
                high: cell_text(&cells, 2),
                low: cell_text(&cells, 3),
                close: cell_text(&cells, 4),
                change_value: first_child_text(&cells, 5),
                change_pct: first_child_text(&cells, 6),
                volume: cell_text(&cells, 7),
                value: cell_text(&cells, 8),
            }
        })
        .collect();

    Ok(rows)
}

/// Company news listing: rows of the second `tbody` on the page.
pub fn extract_official_news_rows(html: &str) -> Result<Vec<RawOfficialNewsRow>> {
    let document = Html::parse_document(html);
    let body = document
        .select(&selector("tbody")?)
        .nth(1)
        .ok_or_else(|| anyhow!("news table body not found"))?;

    let cell_selector = selector("td")?;

    let rows = body
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .map(|row| {
            let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
            RawOfficialNewsRow {
                date: cell_text(&cells, 0),
                source: cell_text(&cells, 2),
                headline: cell_text(&cells, 3),
                link: cells
                    .get(4)
                    .and_then(|cell| first_child(*cell))
                    .and_then(|a| a.value().attr("href"))
                    .unwrap_or_default()
                    .to_string(),
            }
        })
        .collect();

    Ok(rows)
}

/// gapfocus talk threads: each `div.talk-row` sits inside the anchor that
/// links to the thread; the title is in a nested `<l>` element.
pub fn extract_mention_rows(html: &str) -> Result<Vec<RawMentionRow>> {
    let document = Html::parse_document(html);
    let title_selector = selector("l")?;

    let rows = document
        .select(&selector("div.talk-row")?)
        .map(|row| RawMentionRow {
            headline: row
                .select(&title_selector)
                .next()
                .map(text_of)
                .filter(|t| !t.is_empty()),
            link: row
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|parent| parent.value().attr("href"))
                .map(str::to_string),
        })
        .collect();

    Ok(rows)
}

fn selector(css: &str) -> Result<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Ok(sel),
        Err(e) => bail!("invalid selector {css:?}: {e}"),
    }
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_child(el: ElementRef) -> Option<ElementRef> {
    el.children().find_map(ElementRef::wrap)
}

fn cell_text(cells: &[ElementRef], index: usize) -> String {
    cells.get(index).map(|c| text_of(*c)).unwrap_or_default()
}

/// Change cells wrap the number in a coloured span; fall back to the cell
/// itself when there is no child element.
fn first_child_text(cells: &[ElementRef], index: usize) -> String {
    cells
        .get(index)
        .map(|cell| first_child(*cell).map(text_of).unwrap_or_else(|| text_of(*cell)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICE_PAGE: &str = r#"
        <html><body>
          <table class="table">
            <thead><tr><th>Date</th><th>Open</th></tr></thead>
            <tbody>
              <tr>
                <td>05/03/2021</td><td>35.00</td><td>35.75</td><td>34.50</td><td>35.25</td>
                <td><span class="up">+0.50</span></td><td><span class="up">+1.44</span></td>
                <td>12,345,600</td><td>1,234.50</td>
              </tr>
              <tr>
                <td>04/03/2021</td><td>34.50</td><td>35.00</td><td>34.25</td><td>34.75</td>
                <td>-0.25</td><td>-0.71</td><td>9,876</td><td>345.10</td>
              </tr>
              <tr><td>03/03/2021</td></tr>
            </tbody>
          </table>
          <table class="table"><tbody><tr><td>ignored</td></tr></tbody></table>
        </body></html>
    "#;

    #[test]
    fn price_rows_read_first_table_in_column_order() {
        let rows = extract_price_rows(PRICE_PAGE).unwrap();
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.date, "05/03/2021");
        assert_eq!(first.open, "35.00");
        assert_eq!(first.high, "35.75");
        assert_eq!(first.low, "34.50");
        assert_eq!(first.close, "35.25");
        assert_eq!(first.change_value, "+0.50");
        assert_eq!(first.change_pct, "+1.44");
        assert_eq!(first.volume, "12,345,600");
        assert_eq!(first.value, "1,234.50");
    }

    #[test]
    fn change_cells_without_span_use_cell_text() {
        let rows = extract_price_rows(PRICE_PAGE).unwrap();
        assert_eq!(rows[1].change_value, "-0.25");
        assert_eq!(rows[1].change_pct, "-0.71");
    }

    #[test]
    fn short_price_row_keeps_empty_cells() {
        let rows = extract_price_rows(PRICE_PAGE).unwrap();
        assert_eq!(rows[2].date, "03/03/2021");
        assert!(rows[2].open.is_empty());
        assert!(rows[2].value.is_empty());
    }

    #[test]
    fn missing_price_table_is_an_error() {
        assert!(extract_price_rows("<html><body><p>maintenance</p></body></html>").is_err());
    }

    const NEWS_PAGE: &str = r#"
        <html><body>
          <table><tbody><tr><td>search form</td></tr></tbody></table>
          <table>
            <tbody>
              <tr>
                <td>12/01/2021 17:32</td><td>17:32</td><td>SET</td>
                <td>Financial statement Q4</td>
                <td><a href="/set/newsdetails.do?newsId=1">view</a></td>
              </tr>
              <tr>
                <td>11/01/2021</td><td></td><td>AOT</td><td>Dividend notice</td><td></td>
              </tr>
            </tbody>
          </table>
        </body></html>
    "#;

    #[test]
    fn official_news_reads_second_tbody() {
        let rows = extract_official_news_rows(NEWS_PAGE).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            RawOfficialNewsRow {
                date: "12/01/2021 17:32".into(),
                source: "SET".into(),
                headline: "Financial statement Q4".into(),
                link: "/set/newsdetails.do?newsId=1".into(),
            }
        );
        assert!(rows[1].link.is_empty());
    }

    #[test]
    fn news_page_with_one_tbody_is_an_error() {
        let html = "<table><tbody><tr><td>x</td></tr></tbody></table>";
        assert!(extract_official_news_rows(html).is_err());
    }

    #[test]
    fn mentions_take_title_and_wrapping_link() {
        let html = r#"
            <html><body>
              <a href="https://stock.gapfocus.com/talk/1"><div class="talk-row"><l>CPALL breaking out?</l></div></a>
              <a href="https://stock.gapfocus.com/talk/2"><div class="talk-row"><span>no title</span></div></a>
              <section><div class="talk-row"><l>no link</l></div></section>
            </body></html>
        "#;
        let rows = extract_mention_rows(html).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].headline.as_deref(), Some("CPALL breaking out?"));
        assert_eq!(rows[0].link.as_deref(), Some("https://stock.gapfocus.com/talk/1"));
        assert_eq!(rows[1].headline, None);
        assert_eq!(rows[2].link, None);
    }

    #[test]
    fn page_urls_carry_the_symbol() {
        assert_eq!(
            price_page_url("PTT").unwrap(),
            "https://www.set.or.th/set/historicaltrading.do?symbol=PTT&ssoPageId=2&language=th&country=TH"
        );
        assert_eq!(
            official_news_page_url("AOT").unwrap(),
            "https://www.set.or.th/set/companynews.do?symbol=AOT&ssoPageId=8&language=th&country=TH"
        );
        assert_eq!(
            mention_page_url("CPALL").unwrap(),
            "https://stock.gapfocus.com/detail/CPALL"
        );
    }
}
