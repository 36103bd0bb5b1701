use serde::{Deserialize, Serialize};

pub const FALLBACK_PRICE: &str = "0.00026452";
pub const FALLBACK_MARKET_CAP: &str = "23322200.0";
pub const FALLBACK_SUPPLY: &str = "87997562500.0";
pub const FALLBACK_BLOCK_COUNT: &str = "307967";

/// Point-in-time figures for the tracked coin.
///
/// Values are kept exactly as the upstream API returned them. A snapshot is
/// either entirely live or entirely [`MetricsSnapshot::fallback`], never a mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub price: String,
    pub market_cap: String,
    pub supply: String,
    pub block_count: String,
}

impl MetricsSnapshot {
    pub fn fallback() -> Self {
        Self {
            price: FALLBACK_PRICE.to_string(),
            market_cap: FALLBACK_MARKET_CAP.to_string(),
            supply: FALLBACK_SUPPLY.to_string(),
            block_count: FALLBACK_BLOCK_COUNT.to_string(),
        }
    }
}

/// One of the four figures the explorer API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Price,
    MarketCap,
    Supply,
    BlockCount,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Price,
        Metric::MarketCap,
        Metric::Supply,
        Metric::BlockCount,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Metric::Price => "/lastprice",
            Metric::MarketCap => "/marketcap",
            Metric::Supply => "/coinsupply",
            Metric::BlockCount => "/blockcount",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Price => "price",
            Metric::MarketCap => "market_cap",
            Metric::Supply => "supply",
            Metric::BlockCount => "block_count",
        }
    }
}
