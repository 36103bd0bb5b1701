use serde::{Deserialize, Serialize};

/// Link used when a record has no resolvable destination.
pub const PLACEHOLDER_URL: &str = "#";

/// Where a news record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewsProvenance {
    #[serde(rename = "Google News")]
    GoogleNews,
    #[serde(rename = "Curated")]
    Curated,
}

/// A single headline pulled from the search results page.
///
/// `description` and `source` are omitted from JSON when absent; `url` falls
/// back to [`PLACEHOLDER_URL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "placeholder_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub provenance: NewsProvenance,
}

impl NewsItem {
    pub fn new(headline: impl Into<String>, provenance: NewsProvenance) -> Self {
        Self {
            headline: headline.into(),
            description: None,
            url: PLACEHOLDER_URL.to_string(),
            source: None,
            provenance,
        }
    }

    /// Stores the description, treating blank text as absent.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(description.into());
        self
    }

    /// Stores the url, treating blank text as unresolvable.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = non_blank(url.into()).unwrap_or_else(placeholder_url);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = non_blank(source.into());
        self
    }
}

fn placeholder_url() -> String {
    PLACEHOLDER_URL.to_string()
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
