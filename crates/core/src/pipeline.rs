use crate::advice::extract_advice;
use crate::config::{NewsFallbackPolicy, Settings};
use crate::domain::metrics::MetricsSnapshot;
use crate::domain::news::NewsItem;
use crate::domain::recommendation::TradingAdvice;
use crate::domain::report::{normalize_summary, Report};
use crate::ingest::extract::ExtractOptions;
use crate::ingest::metrics::{fetch_snapshot, HttpMetricsSource, MetricsSource};
use crate::ingest::news::{apply_fallback, scrape_news, GoogleNewsScraper, NewsSource};
use crate::llm::openai::OpenAiClient;
use crate::llm::prompt::{build_prompt, PromptStyle};
use crate::llm::SummaryClient;
use std::sync::Arc;

/// Request-scoped inputs gathered before the model is called.
#[derive(Debug, Clone)]
pub struct Gathered {
    pub metrics: MetricsSnapshot,
    pub news: Vec<NewsItem>,
}

/// The whole fetch → summarize → advise flow, built once at startup.
///
/// Holds no per-request state; every call to [`Pipeline::run`] starts fresh.
#[derive(Clone)]
pub struct Pipeline {
    metrics: Arc<dyn MetricsSource>,
    news: Arc<dyn NewsSource>,
    summarizer: Arc<dyn SummaryClient>,
    extract: ExtractOptions,
    fallback: NewsFallbackPolicy,
}

impl Pipeline {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(HttpMetricsSource::from_settings(settings)?),
            Arc::new(GoogleNewsScraper::from_settings(settings)?),
            Arc::new(OpenAiClient::from_settings(settings)?),
        )
        .with_extract_options(ExtractOptions::from_env())
        .with_fallback(settings.news_fallback))
    }

    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        news: Arc<dyn NewsSource>,
        summarizer: Arc<dyn SummaryClient>,
    ) -> Self {
        Self {
            metrics,
            news,
            summarizer,
            extract: ExtractOptions::default(),
            fallback: NewsFallbackPolicy::default(),
        }
    }

    pub fn with_extract_options(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    pub fn with_fallback(mut self, fallback: NewsFallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Metrics and news, fetched concurrently. Both absorb their own failures.
    pub async fn gather(&self) -> Gathered {
        let (metrics, news) = tokio::join!(
            fetch_snapshot(self.metrics.as_ref()),
            scrape_news(self.news.as_ref(), &self.extract),
        );
        Gathered {
            metrics,
            news: apply_fallback(news, self.fallback),
        }
    }

    /// Runs the full flow. Only a failed model call is an error.
    pub async fn run(&self, style: PromptStyle) -> anyhow::Result<Report> {
        let gathered = self.gather().await;
        let prompt = build_prompt(&gathered.metrics, &gathered.news, style);
        tracing::debug!(%prompt, "built summarization prompt");

        let summary = normalize_summary(self.summarizer.summarize(&prompt).await?);
        let advice = extract_advice(&summary);
        tracing::info!(
            provider = ?self.summarizer.provider(),
            recommendation = %advice.recommendation,
            news = gathered.news.len(),
            "summary ready"
        );

        Ok(assemble(gathered.metrics, gathered.news, summary, advice))
    }
}

pub fn assemble(
    metrics: MetricsSnapshot,
    news: Vec<NewsItem>,
    summary: String,
    advice: TradingAdvice,
) -> Report {
    Report {
        pepe_data: metrics,
        google_news: news,
        summary,
        trading_advice: advice,
        generated_at: chrono::Utc::now(),
    }
}
