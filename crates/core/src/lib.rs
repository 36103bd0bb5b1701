pub mod advice;
pub mod domain;
pub mod ingest;
pub mod llm;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

pub mod config {
    use anyhow::Context;

    const DEFAULT_METRICS_BASE_URL: &str = "https://pepecoinexplorer.com/api/v1";
    const DEFAULT_NEWS_SEARCH_URL: &str = "https://www.google.com/search";
    const DEFAULT_NEWS_QUERY: &str = "pepe coin";

    /// What to do when every extraction strategy comes back empty.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum NewsFallbackPolicy {
        /// Leave the news list empty.
        #[default]
        None,
        /// Substitute the curated headline set.
        Curated,
    }

    impl NewsFallbackPolicy {
        pub fn parse(s: &str) -> anyhow::Result<Self> {
            match s.trim().to_ascii_lowercase().as_str() {
                "" | "none" => Ok(Self::None),
                "curated" => Ok(Self::Curated),
                other => anyhow::bail!("unknown NEWS_FALLBACK policy: {other}"),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub openai_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub metrics_base_url: String,
        pub news_search_url: String,
        pub news_query: String,
        pub news_fallback: NewsFallbackPolicy,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let news_fallback = match std::env::var("NEWS_FALLBACK") {
                Ok(s) => NewsFallbackPolicy::parse(&s).context("invalid NEWS_FALLBACK")?,
                Err(_) => NewsFallbackPolicy::default(),
            };

            Ok(Self {
                openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                metrics_base_url: env_or("PEPE_METRICS_BASE_URL", DEFAULT_METRICS_BASE_URL),
                news_search_url: env_or("NEWS_SEARCH_URL", DEFAULT_NEWS_SEARCH_URL),
                news_query: env_or("NEWS_QUERY", DEFAULT_NEWS_QUERY),
                news_fallback,
            })
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .context("OPENAI_API_KEY is required")
        }
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                openai_api_key: None,
                sentry_dsn: None,
                metrics_base_url: DEFAULT_METRICS_BASE_URL.to_string(),
                news_search_url: DEFAULT_NEWS_SEARCH_URL.to_string(),
                news_query: DEFAULT_NEWS_QUERY.to_string(),
                news_fallback: NewsFallbackPolicy::None,
            }
        }
    }

    fn env_or(key: &str, default: &str) -> String {
        std::env::var(key)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

}
