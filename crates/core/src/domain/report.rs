use crate::domain::metrics::MetricsSnapshot;
use crate::domain::news::NewsItem;
use crate::domain::recommendation::TradingAdvice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Substituted when the model returns no text.
pub const EMPTY_SUMMARY_PLACEHOLDER: &str = "No summary available.";

/// Everything one request produced, ready to be serialized for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub pepe_data: MetricsSnapshot,
    pub google_news: Vec<NewsItem>,
    pub summary: String,
    pub trading_advice: TradingAdvice,
    pub generated_at: DateTime<Utc>,
}

/// The digest view of a [`Report`]: the list is named `news` rather than `googleNews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestResponse {
    pub pepe_data: MetricsSnapshot,
    pub news: Vec<NewsItem>,
    pub summary: String,
    pub trading_advice: TradingAdvice,
    pub generated_at: DateTime<Utc>,
}

impl From<Report> for DigestResponse {
    fn from(r: Report) -> Self {
        Self {
            pepe_data: r.pepe_data,
            news: r.google_news,
            summary: r.summary,
            trading_advice: r.trading_advice,
            generated_at: r.generated_at,
        }
    }
}

/// Falls back to [`EMPTY_SUMMARY_PLACEHOLDER`] for blank model output.
pub fn normalize_summary(raw: String) -> String {
    if raw.trim().is_empty() {
        EMPTY_SUMMARY_PLACEHOLDER.to_string()
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::news::NewsProvenance;
    use crate::domain::recommendation::Recommendation;

    fn report() -> Report {
        Report {
            pepe_data: MetricsSnapshot::fallback(),
            google_news: vec![NewsItem::new("Pepe volume doubles", NewsProvenance::GoogleNews)],
            summary: normalize_summary("  ".to_string()),
            trading_advice: TradingAdvice {
                recommendation: Recommendation::Hold,
                reason: "flat".to_string(),
            },
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn digest_renames_news_list() {
        let digest = serde_json::to_value(DigestResponse::from(report())).unwrap();

        assert!(digest.get("googleNews").is_none());
        assert_eq!(digest["news"][0]["headline"], "Pepe volume doubles");
        assert_eq!(digest["summary"], EMPTY_SUMMARY_PLACEHOLDER);
        assert_eq!(digest["tradingAdvice"]["recommendation"], "HOLD");
    }
}
