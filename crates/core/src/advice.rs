//! Keyword heuristics that turn free-form model text into a BUY/SELL/HOLD call.
//!
//! This is string matching, not classification. A summary that says "don't
//! buy, we recommend waiting" will come out as BUY. Both tables below are
//! consulted top to bottom and the first hit wins.

use crate::domain::recommendation::{Recommendation, TradingAdvice};
use regex::Regex;
use std::sync::LazyLock;

/// A signal fires when the text contains `keyword` and at least one of `confirmations`.
#[derive(Debug, Clone, Copy)]
pub struct SignalRule {
    pub keyword: &'static str,
    pub confirmations: &'static [&'static str],
    pub outcome: Recommendation,
}

pub const SIGNAL_RULES: &[SignalRule] = &[
    SignalRule {
        keyword: "buy",
        confirmations: &["recommend", "recommendation", "bullish"],
        outcome: Recommendation::Buy,
    },
    SignalRule {
        keyword: "sell",
        confirmations: &["recommend", "recommendation", "bearish"],
        outcome: Recommendation::Sell,
    },
];

/// Case-insensitive patterns whose first group is taken as the reason.
pub const REASON_PATTERNS: &[&str] = &[
    r"(?i)recommendation:([^\n]+)",
    r"(?i)\brecommend(?:ations?|ed|ing|s)?\b([^\n.]+)",
    r"(?i)\bbecause\b([^\n.]+)",
    r"(?i)\bdue to\b([^\n.]+)",
];

static REASON_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    REASON_PATTERNS
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!(pattern = *pattern, error = %err, "invalid reason pattern");
                None
            }
        })
        .collect()
});

pub fn generic_reason(recommendation: Recommendation) -> &'static str {
    match recommendation {
        Recommendation::Buy => "Positive sentiment in recent news",
        Recommendation::Sell => "Negative sentiment in recent news",
        Recommendation::Hold => "Mixed or neutral sentiment in recent news",
    }
}

pub fn extract_advice(summary: &str) -> TradingAdvice {
    let recommendation = classify(summary);
    let reason = extract_reason(summary)
        .unwrap_or_else(|| generic_reason(recommendation).to_string());

    TradingAdvice {
        recommendation,
        reason,
    }
}

pub fn classify(summary: &str) -> Recommendation {
    let lower = summary.to_lowercase();
    SIGNAL_RULES
        .iter()
        .find(|rule| {
            lower.contains(rule.keyword) && rule.confirmations.iter().any(|c| lower.contains(c))
        })
        .map(|rule| rule.outcome)
        .unwrap_or_default()
}

/// A capture that is blank once leading `:`/`,` are stripped lets the next pattern try.
pub fn extract_reason(summary: &str) -> Option<String> {
    REASON_REGEXES.iter().find_map(|re| {
        re.captures(summary)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_reason(m.as_str()))
            .filter(|reason| !reason.is_empty())
    })
}

fn clean_reason(capture: &str) -> String {
    capture
        .trim_start_matches(|c: char| c == ':' || c == ',' || c.is_whitespace())
        .trim_end()
        .to_string()
}
