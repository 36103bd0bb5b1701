use crate::config::Settings;
use crate::domain::metrics::{Metric, MetricsSnapshot};
use anyhow::{Context, Result};
use std::time::Duration;

#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Returns the raw scalar the upstream serves for `metric`.
    async fn fetch_metric(&self, metric: Metric) -> Result<String>;
}

/// Block explorer API serving one bare scalar per endpoint.
#[derive(Debug, Clone)]
pub struct HttpMetricsSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpMetricsSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout_secs = std::env::var("PEPE_METRICS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .context("failed to build metrics http client")?;

        Ok(Self::new(http, settings.metrics_base_url.clone()))
    }

    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, metric: Metric) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), metric.path())
    }
}

#[async_trait::async_trait]
impl MetricsSource for HttpMetricsSource {
    fn source_name(&self) -> &'static str {
        "pepecoin_explorer"
    }

    async fn fetch_metric(&self, metric: Metric) -> Result<String> {
        let res = self
            .http
            .get(self.url(metric))
            .send()
            .await
            .with_context(|| format!("{} request failed", metric.name()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read {} response", metric.name()))?;
        if !status.is_success() {
            anyhow::bail!("{} HTTP {status}: {text}", metric.name());
        }

        anyhow::ensure!(!text.trim().is_empty(), "{} response was empty", metric.name());
        Ok(text)
    }
}

/// Fetches all four figures, or none of them.
///
/// Any single failure discards the whole attempt; see [`fetch_snapshot`] for
/// the variant that substitutes the fallback snapshot instead of erroring.
pub async fn try_fetch_snapshot(source: &dyn MetricsSource) -> Result<MetricsSnapshot> {
    let (price, market_cap, supply, block_count) = tokio::try_join!(
        source.fetch_metric(Metric::Price),
        source.fetch_metric(Metric::MarketCap),
        source.fetch_metric(Metric::Supply),
        source.fetch_metric(Metric::BlockCount),
    )?;

    tracing::debug!(%price, %market_cap, %supply, %block_count, "fetched metrics");

    Ok(MetricsSnapshot {
        price,
        market_cap,
        supply,
        block_count,
    })
}

pub async fn fetch_snapshot(source: &dyn MetricsSource) -> MetricsSnapshot {
    match try_fetch_snapshot(source).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::warn!(
                source = source.source_name(),
                error = %err,
                "metrics fetch failed; using fallback snapshot"
            );
            MetricsSnapshot::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::{http::StatusCode, routing::get, Router};

    fn explorer(supply_status: StatusCode) -> Router {
        Router::new()
            .route("/api/v1/lastprice", get(|| async { "0.00030000" }))
            .route("/api/v1/marketcap", get(|| async { "26400000.5" }))
            .route(
                "/api/v1/coinsupply",
                get(move || async move { (supply_status, "88000000000.0") }),
            )
            .route("/api/v1/blockcount", get(|| async { "308001\n" }))
    }

    #[tokio::test]
    async fn passes_raw_bodies_through_unchanged() {
        let base = testing::serve(explorer(StatusCode::OK)).await;
        let source = HttpMetricsSource::new(reqwest::Client::new(), format!("{base}/api/v1/"));

        let snapshot = fetch_snapshot(&source).await;
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                price: "0.00030000".to_string(),
                market_cap: "26400000.5".to_string(),
                supply: "88000000000.0".to_string(),
                block_count: "308001\n".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn one_failed_endpoint_yields_full_fallback() {
        let base = testing::serve(explorer(StatusCode::INTERNAL_SERVER_ERROR)).await;
        let source = HttpMetricsSource::new(reqwest::Client::new(), format!("{base}/api/v1"));

        assert!(try_fetch_snapshot(&source).await.is_err());
        assert_eq!(fetch_snapshot(&source).await, MetricsSnapshot::fallback());
    }

    #[tokio::test]
    async fn unreachable_upstream_yields_fallback() {
        let source = HttpMetricsSource::new(reqwest::Client::new(), "http://127.0.0.1:1");
        assert_eq!(fetch_snapshot(&source).await, MetricsSnapshot::fallback());
    }

    #[tokio::test]
    async fn blank_body_counts_as_failure() {
        let app = Router::new().route("/lastprice", get(|| async { " \n" }));
        let base = testing::serve(app).await;
        let source = HttpMetricsSource::new(reqwest::Client::new(), base);

        assert!(source.fetch_metric(Metric::Price).await.is_err());
    }

    struct FailingOn(Metric);

    #[async_trait::async_trait]
    impl MetricsSource for FailingOn {
        fn source_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_metric(&self, metric: Metric) -> Result<String> {
            if metric == self.0 {
                anyhow::bail!("boom");
            }
            Ok("1.0".to_string())
        }
    }

    #[tokio::test]
    async fn never_blends_live_and_fallback_values() {
        for metric in Metric::ALL {
            let snapshot = fetch_snapshot(&FailingOn(metric)).await;
            assert_eq!(snapshot, MetricsSnapshot::fallback(), "failing on {metric:?}");
        }
    }
}
