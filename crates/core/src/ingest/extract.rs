//! Pulls news records out of a search results page.
//!
//! Three strategies run in order and the first one that yields anything wins:
//! result cards by CSS class, then bare headings mentioning the keyword, then
//! regexes over the raw markup. Google's class names churn, so every strategy
//! is best effort.

use crate::domain::news::{NewsItem, NewsProvenance, PLACEHOLDER_URL};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Hard ceiling on records returned by any strategy.
pub const MAX_NEWS_ITEMS: usize = 8;
/// Result-card headlines must be strictly longer than this many characters.
pub const MIN_HEADLINE_LEN: usize = 10;
pub const DEFAULT_KEYWORD: &str = "pepe";

const CARD_SELECTOR: &str = ".SoaBEf, .WlydOe, .DBQmFf, .T1diZc";
const CARD_HEADLINE_SELECTOR: &str = ".n0jPhd, .mCBkyc, h3";
const CARD_DESCRIPTION_SELECTOR: &str = ".GI74Re, .Y3v8qd, .s3v9rd";
const CARD_SOURCE_SELECTOR: &str = ".CEMjEf, .UMOHqf";
const CARD_TIME_SELECTOR: &str = ".OSrXXb";
const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

const RAW_HEADLINE_PATTERN: &str = r#"<div class="[^"]*n0jPhd[^"]*"[^>]*>([^<]+)</div>"#;
const RAW_DESCRIPTION_PATTERN: &str = r#"<div class="[^"]*GI74Re[^"]*"[^>]*>([^<]+)</div>"#;
const TAG_PATTERN: &str = r"<[^>]+>";

const REDIRECT_PREFIX: &str = "/url?";
const REDIRECT_ORIGIN: &str = "https://google.com";
const REDIRECT_TARGET_PARAM: &str = "q";

const DEFAULT_CARD_SOURCE: &str = "News Source";
const DEFAULT_SOURCE: &str = "Google News";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum records to keep; never above [`MAX_NEWS_ITEMS`].
    pub max_items: usize,

    /// Minimum headline length (exclusive) for result cards.
    pub min_headline_len: usize,

    /// Lowercase keyword a bare heading must mention.
    pub keyword: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_items: MAX_NEWS_ITEMS,
            min_headline_len: MIN_HEADLINE_LEN,
            keyword: DEFAULT_KEYWORD.to_string(),
        }
    }
}

impl ExtractOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("NEWS_MAX_ITEMS") {
            if let Ok(n) = s.parse::<usize>() {
                out.max_items = n;
            }
        }

        if let Ok(s) = std::env::var("NEWS_MIN_HEADLINE_LEN") {
            if let Ok(n) = s.parse::<usize>() {
                out.min_headline_len = n;
            }
        }

        if let Ok(s) = std::env::var("NEWS_KEYWORD") {
            if !s.trim().is_empty() {
                out.keyword = s;
            }
        }

        out.normalized()
    }

    fn normalized(mut self) -> Self {
        self.max_items = self.max_items.min(MAX_NEWS_ITEMS);
        self.keyword = self.keyword.trim().to_lowercase();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Cards,
    Headings,
    RawText,
}

impl Strategy {
    pub const ORDER: [Strategy; 3] = [Strategy::Cards, Strategy::Headings, Strategy::RawText];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Cards => "cards",
            Strategy::Headings => "headings",
            Strategy::RawText => "raw_text",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Strategy that produced `items`; `None` when all came back empty.
    pub strategy: Option<Strategy>,
    pub items: Vec<NewsItem>,
}

pub fn extract_news(html: &str, opts: &ExtractOptions) -> Extraction {
    let opts = opts.clone().normalized();
    if opts.max_items == 0 {
        return Extraction::default();
    }

    let doc = Html::parse_document(html);
    for strategy in Strategy::ORDER {
        let items = match strategy {
            Strategy::Cards => extract_cards(&doc, &opts),
            Strategy::Headings => extract_headings(&doc, &opts),
            Strategy::RawText => extract_raw_text(html, &opts),
        };
        if !items.is_empty() {
            return Extraction {
                strategy: Some(strategy),
                items,
            };
        }
    }

    Extraction::default()
}

fn extract_cards(doc: &Html, opts: &ExtractOptions) -> Vec<NewsItem> {
    let (Some(cards), Some(headline), Some(description), Some(source), Some(time), Some(anchor)) = (
        parse_selector(CARD_SELECTOR),
        parse_selector(CARD_HEADLINE_SELECTOR),
        parse_selector(CARD_DESCRIPTION_SELECTOR),
        parse_selector(CARD_SOURCE_SELECTOR),
        parse_selector(CARD_TIME_SELECTOR),
        parse_selector("a"),
    ) else {
        return Vec::new();
    };

    let mut out: Vec<NewsItem> = Vec::new();
    for card in doc.select(&cards) {
        if out.len() >= opts.max_items {
            break;
        }

        let title = joined_text(card, &headline);
        if title.chars().count() <= opts.min_headline_len {
            continue;
        }
        // Cards nest (an anchor card inside a wrapper card) and repeat the headline.
        if out.iter().any(|item| item.headline == title) {
            continue;
        }

        let source_name = joined_text(card, &source);
        let when = joined_text(card, &time);
        let source_name = if source_name.is_empty() {
            DEFAULT_CARD_SOURCE
        } else {
            source_name.as_str()
        };
        let source_line = if when.is_empty() {
            source_name.to_string()
        } else {
            format!("{source_name} • {when}")
        };

        let href = card_href(card, &anchor).map(unwrap_redirect);

        out.push(
            NewsItem::new(title, NewsProvenance::GoogleNews)
                .with_description(joined_text(card, &description))
                .with_url(href.unwrap_or_default())
                .with_source(source_line),
        );
    }
    out
}

fn extract_headings(doc: &Html, opts: &ExtractOptions) -> Vec<NewsItem> {
    let Some(headings) = parse_selector(HEADING_SELECTOR) else {
        return Vec::new();
    };

    doc.select(&headings)
        .filter_map(|heading| {
            let title = element_text(heading);
            if title.is_empty() || !title.to_lowercase().contains(&opts.keyword) {
                return None;
            }
            let url = enclosing_href(heading).unwrap_or_else(|| PLACEHOLDER_URL.to_string());
            Some(
                NewsItem::new(title, NewsProvenance::GoogleNews)
                    .with_url(url)
                    .with_source(DEFAULT_SOURCE),
            )
        })
        .take(opts.max_items)
        .collect()
}

fn extract_raw_text(html: &str, opts: &ExtractOptions) -> Vec<NewsItem> {
    let (Some(headline_re), Some(description_re), Some(tag_re)) = (
        compile_regex(RAW_HEADLINE_PATTERN),
        compile_regex(RAW_DESCRIPTION_PATTERN),
        compile_regex(TAG_PATTERN),
    ) else {
        return Vec::new();
    };

    let strip = |fragment: &str| tag_re.replace_all(fragment, "").trim().to_string();
    let descriptions: Vec<String> = description_re
        .find_iter(html)
        .map(|m| strip(m.as_str()))
        .collect();

    headline_re
        .find_iter(html)
        .take(opts.max_items)
        .enumerate()
        .filter_map(|(i, m)| {
            let title = strip(m.as_str());
            if title.is_empty() {
                return None;
            }
            let description = descriptions.get(i).cloned().unwrap_or_default();
            Some(
                NewsItem::new(title, NewsProvenance::GoogleNews)
                    .with_description(description)
                    .with_source(DEFAULT_SOURCE),
            )
        })
        .collect()
}

/// Resolves Google's `/url?q=<target>&...` wrapper to its destination.
pub fn unwrap_redirect(href: String) -> String {
    if !href.starts_with(REDIRECT_PREFIX) {
        return href;
    }

    let target = url::Url::parse(&format!("{REDIRECT_ORIGIN}{href}"))
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == REDIRECT_TARGET_PARAM)
                .map(|(_, v)| v.into_owned())
        })
        .filter(|v| !v.is_empty());

    target.unwrap_or(href)
}

fn card_href(card: ElementRef<'_>, anchor: &Selector) -> Option<String> {
    let own = (card.value().name() == "a")
        .then(|| card.value().attr("href"))
        .flatten();
    own.or_else(|| card.select(anchor).next().and_then(|a| a.value().attr("href")))
        .map(str::to_string)
}

fn enclosing_href(el: ElementRef<'_>) -> Option<String> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

/// Concatenated text of every match under `root`, trimmed.
fn joined_text(root: ElementRef<'_>, sel: &Selector) -> String {
    let mut out = String::new();
    for el in root.select(sel) {
        out.extend(el.text());
    }
    out.trim().to_string()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(err) => {
            tracing::warn!(css, error = %err, "invalid selector");
            None
        }
    }
}

fn compile_regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "invalid regex");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(headline: &str, href: &str) -> String {
        format!(
            r#"<div class="SoaBEf"><a href="{href}">
                 <div class="n0jPhd">{headline}</div>
                 <div class="GI74Re">Meme coins are moving again.</div>
                 <div class="CEMjEf">CoinDesk</div>
                 <div class="OSrXXb">3 hours ago</div>
               </a></div>"#
        )
    }

    fn page(body: &str) -> String {
        format!("<html><body>{body}</body></html>")
    }

    #[test]
    fn cards_win_when_present() {
        let html = page(&format!(
            "{}<h3>Pepe heading that should be ignored</h3>",
            card("Pepe coin jumps 20% overnight", "https://example.com/a")
        ));

        let out = extract_news(&html, &ExtractOptions::default());
        assert_eq!(out.strategy, Some(Strategy::Cards));
        assert_eq!(out.items.len(), 1);

        let item = &out.items[0];
        assert_eq!(item.headline, "Pepe coin jumps 20% overnight");
        assert_eq!(item.description.as_deref(), Some("Meme coins are moving again."));
        assert_eq!(item.url, "https://example.com/a");
        assert_eq!(item.source.as_deref(), Some("CoinDesk • 3 hours ago"));
        assert_eq!(item.provenance, NewsProvenance::GoogleNews);
    }

    #[test]
    fn card_unwraps_redirect_links() {
        let html = page(&card(
            "Pepe coin jumps 20% overnight",
            "/url?q=https://news.example.com/pepe%3Fref%3D1&amp;sa=U",
        ));

        let out = extract_news(&html, &ExtractOptions::default());
        assert_eq!(out.items[0].url, "https://news.example.com/pepe?ref=1");
    }

    #[test]
    fn card_defaults_source_and_url() {
        let html = page(
            r#"<div class="WlydOe"><div class="mCBkyc">Pepe whales accumulate quietly</div></div>"#,
        );

        let out = extract_news(&html, &ExtractOptions::default());
        let item = &out.items[0];
        assert_eq!(item.source.as_deref(), Some("News Source"));
        assert_eq!(item.url, "#");
        assert_eq!(item.description, None);
    }

    #[test]
    fn short_card_headlines_are_rejected() {
        // Exactly 10 characters is not enough.
        let html = page(&format!(
            "{}<h3><a href=\"https://example.com/h\">Pepe headline fallback</a></h3>",
            card("Pepe today", "https://example.com/a")
        ));

        let out = extract_news(&html, &ExtractOptions::default());
        assert_eq!(out.strategy, Some(Strategy::Headings));
    }

    #[test]
    fn nested_cards_do_not_duplicate() {
        let html = page(
            r#"<div class="SoaBEf"><a class="WlydOe" href="https://example.com/n">
                 <div class="n0jPhd">Pepe listed on another exchange</div>
               </a></div>"#,
        );

        let out = extract_news(&html, &ExtractOptions::default());
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].url, "https://example.com/n");
    }

    #[test]
    fn headings_need_keyword_and_resolve_enclosing_link() {
        let html = page(
            r#"<a href="https://example.com/1"><h3>PEPE breaks resistance</h3></a>
               <h3>Bitcoin steady</h3>
               <h3>Why pepe traders are cautious</h3>"#,
        );

        let out = extract_news(&html, &ExtractOptions::default());
        assert_eq!(out.strategy, Some(Strategy::Headings));
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.items[0].headline, "PEPE breaks resistance");
        assert_eq!(out.items[0].url, "https://example.com/1");
        assert_eq!(out.items[0].source.as_deref(), Some("Google News"));
        assert_eq!(out.items[1].url, "#");
    }

    #[test]
    fn raw_text_runs_only_when_dom_strategies_find_nothing() {
        let html = page(
            r#"<h3>Bitcoin steady</h3>
               <div class="x n0jPhd y">Meme market cools</div>
               <div class="GI74Re">Traders take profit.</div>
               <div class="n0jPhd">Second story</div>"#,
        );

        let out = extract_news(&html, &ExtractOptions::default());
        assert_eq!(out.strategy, Some(Strategy::RawText));
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.items[0].headline, "Meme market cools");
        assert_eq!(out.items[0].description.as_deref(), Some("Traders take profit."));
        assert_eq!(out.items[1].description, None);
        assert_eq!(out.items[1].url, "#");
    }

    #[test]
    fn empty_page_yields_nothing() {
        let out = extract_news(&page("<p>nothing here</p>"), &ExtractOptions::default());
        assert_eq!(out.strategy, None);
        assert!(out.items.is_empty());
    }

    #[test]
    fn every_strategy_caps_at_eight() {
        let cards: String = (0..12)
            .map(|i| card(&format!("Pepe story number {i:02}"), "https://example.com"))
            .collect();
        let headings: String = (0..12).map(|i| format!("<h3>pepe {i}</h3>")).collect();
        let raw: String = (0..12)
            .map(|i| format!(r#"<div class="n0jPhd">raw {i}</div>"#))
            .collect();

        for body in [cards, headings, raw] {
            let out = extract_news(&page(&body), &ExtractOptions::default());
            assert_eq!(out.items.len(), MAX_NEWS_ITEMS);
        }
    }

    #[test]
    fn max_items_override_is_clamped() {
        let opts = ExtractOptions {
            max_items: 50,
            ..ExtractOptions::default()
        };
        let headings: String = (0..12).map(|i| format!("<h3>pepe {i}</h3>")).collect();
        let out = extract_news(&page(&headings), &opts);
        assert_eq!(out.items.len(), MAX_NEWS_ITEMS);

        let opts = ExtractOptions {
            max_items: 3,
            ..ExtractOptions::default()
        };
        let out = extract_news(&page(&headings), &opts);
        assert_eq!(out.items.len(), 3);
    }

    #[test]
    fn non_redirect_links_pass_through() {
        assert_eq!(
            unwrap_redirect("https://example.com/x".to_string()),
            "https://example.com/x"
        );
        assert_eq!(unwrap_redirect("/url?sa=U".to_string()), "/url?sa=U");
    }
}
