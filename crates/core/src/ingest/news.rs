use crate::config::{NewsFallbackPolicy, Settings};
use crate::domain::news::{NewsItem, NewsProvenance};
use crate::ingest::extract::{extract_news, ExtractOptions};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Returns the raw search results markup.
    async fn fetch_page(&self) -> Result<String>;
}

/// Google's news tab, fetched as a desktop browser would.
#[derive(Debug, Clone)]
pub struct GoogleNewsScraper {
    http: reqwest::Client,
    search_url: String,
    query: String,
}

impl GoogleNewsScraper {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = news_timeout(std::env::var("NEWS_TIMEOUT_SECS").ok().as_deref());
        Self::with_timeout(settings, timeout)
    }

    /// Browser headers and the given request timeout.
    pub fn with_timeout(settings: &Settings, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(browser_headers())
            .build()
            .context("failed to build news http client")?;

        Ok(Self::new(
            http,
            settings.news_search_url.clone(),
            settings.news_query.clone(),
        ))
    }

    pub fn new(http: reqwest::Client, search_url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            http,
            search_url: search_url.into(),
            query: query.into(),
        }
    }
}

#[async_trait::async_trait]
impl NewsSource for GoogleNewsScraper {
    fn source_name(&self) -> &'static str {
        "google_news"
    }

    async fn fetch_page(&self) -> Result<String> {
        let res = self
            .http
            .get(&self.search_url)
            .query(&[("q", self.query.as_str()), ("tbm", "nws")])
            .send()
            .await
            .context("news search request failed")?;

        let status = res.status();
        anyhow::ensure!(status.is_success(), "news search HTTP {status}");

        res.text()
            .await
            .context("failed to read news search response")
    }
}

/// `NEWS_TIMEOUT_SECS` when it parses, otherwise 15 seconds.
fn news_timeout(raw: Option<&str>) -> Duration {
    let secs = raw
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    headers
}

/// Fetches and parses the results page. Never fails: transport and parse
/// problems only shrink the list.
pub async fn scrape_news(source: &dyn NewsSource, opts: &ExtractOptions) -> Vec<NewsItem> {
    let html = match source.fetch_page().await {
        Ok(html) => html,
        Err(err) => {
            tracing::warn!(source = source.source_name(), error = %err, "news scrape failed");
            return Vec::new();
        }
    };

    // `Html` is !Send; keep parsing synchronous so it never spans an await.
    let extraction = extract_news(&html, opts);
    tracing::info!(
        source = source.source_name(),
        strategy = extraction.strategy.map(|s| s.name()).unwrap_or("none"),
        items = extraction.items.len(),
        "parsed news page"
    );
    extraction.items
}

/// Applies the configured policy when scraping produced nothing.
pub fn apply_fallback(items: Vec<NewsItem>, policy: NewsFallbackPolicy) -> Vec<NewsItem> {
    if !items.is_empty() {
        return items;
    }
    match policy {
        NewsFallbackPolicy::None => items,
        NewsFallbackPolicy::Curated => {
            tracing::info!("no scraped news; using curated headlines");
            curated_news()
        }
    }
}

pub fn curated_news() -> Vec<NewsItem> {
    [
        (
            "Pepe Coin Price Prediction: Bullish Setup Targets $0.000015",
            "Pepe Coin (PEPE), the second-largest meme coin on the Ethereum blockchain, is drawing renewed attention from traders and analysts.",
            "BanklessTimes • 8 hours ago",
        ),
        (
            "PEPE Price Prediction: Sudden Volume Surge Could Trigger Parabolic Run to $1",
            "The meme coin frenzy is heating up again as PEPE sparks fresh excitement following months of consolidation.",
            "Coinspeaker • 1 day ago",
        ),
        (
            "Shiba Inu and Pepe Fall Further Out Of Favor As Smart Money Is Backing This Potential 100x Coin",
            "While Shiba Inu coin attempts to add substance and Pepe Coin relies on renewed hype, 'smart money' typically favors predictable growth.",
            "CoinCentral • 12 hours ago",
        ),
        (
            "Pepe Price Prediction: What Warren Buffett's Retirement Means for $PEPE's Future",
            "Pepe coin's drop mirrors market anxiety as investors react to Buffett's warnings on the deficit, tariffs, and global tensions.",
            "The Cryptonomist • 2 days ago",
        ),
        (
            "Pepe Price Prediction and Market Outlook: More Upside or Correction Ahead?",
            "Pepe Coin has returned to the spotlight, driven by rapid price fluctuations and increasing interest on social platforms.",
            "The Tribune • 4 days ago",
        ),
    ]
    .into_iter()
    .map(|(headline, description, source)| {
        NewsItem::new(headline, NewsProvenance::Curated)
            .with_description(description)
            .with_source(source)
    })
    .collect()
}
