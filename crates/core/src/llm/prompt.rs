use crate::domain::metrics::MetricsSnapshot;
use crate::domain::news::NewsItem;
use std::fmt::Write;

const ADVICE_INSTRUCTIONS: &str = "\nBased on this information, please provide:\n\
1. A friendly summary of the news for a regular user\n\
2. A clear buy, sell, or hold recommendation for PEPE coin based on the news sentiment\n\
3. A brief explanation for your recommendation\n\
4. List the news as clickable links\n\n\
Format your response with clear sections for the summary, recommendation, and news links.";

const DIGEST_INSTRUCTIONS: &str = "\nSummarize these news headlines for a regular user. \
Give a friendly summary and list the news as clickable links.";

/// Which closing instruction the prompt ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Summary plus an explicit buy/sell/hold call with justification.
    #[default]
    Advice,
    /// Friendly news digest only.
    Digest,
}

pub fn build_prompt(metrics: &MetricsSnapshot, news: &[NewsItem], style: PromptStyle) -> String {
    let mut out = format!(
        "Here's the latest data about Pepe coin (crypto):\n\n\
         Price: ${}\nMarket Cap: ${}\nCoin Supply: {}\nBlock Count: {}\n\n\
         Recent headlines and news:\n",
        metrics.price, metrics.market_cap, metrics.supply, metrics.block_count
    );

    for (i, item) in news.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}. {}", i + 1, item.headline);
        if let Some(description) = item.description.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(out, "   {description}");
        }
        if let Some(source) = item.source.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(out, "   Source: {source}");
        }
        out.push('\n');
    }

    out.push_str(match style {
        PromptStyle::Advice => ADVICE_INSTRUCTIONS,
        PromptStyle::Digest => DIGEST_INSTRUCTIONS,
    });
    out
}
