//! Market data layer.
//!
//! `MarketDataGateway` is the only thing the rest of the service talks to. It
//! forwards to a `MarketDataProvider` and turns every provider failure into the
//! lookup sentinel, so callers always get a value back.

pub mod provider;
pub mod yahoo;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub use provider::{MarketDataProvider, ProviderError};
pub use yahoo::YahooAdapter;

/// Message carried by the lookup sentinel.
pub const LOOKUP_ERROR: &str = "Invalid ticker or data not found";

/// Provider-defined attributes of a ticker (`marketCap`, `sector`, ...).
///
/// The shape is not normalized; an absent key means unknown.
pub type Fundamentals = serde_json::Map<String, Value>;

/// Fundamentals sentinel returned when a lookup fails.
pub fn lookup_error_fundamentals() -> Fundamentals {
    let mut map = Fundamentals::new();
    map.insert("error".to_string(), Value::String(LOOKUP_ERROR.to_string()));
    map
}

/// Numeric market capitalization, if the provider reported one.
pub fn market_cap(fundamentals: &Fundamentals) -> Option<f64> {
    fundamentals.get("marketCap").and_then(Value::as_f64)
}

/// A news headline reduced to title and link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// Sentinel object for failed lookups: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupError {
    pub error: String,
}

impl Default for LookupError {
    fn default() -> Self {
        Self {
            error: LOOKUP_ERROR.to_string(),
        }
    }
}

/// One element of a news list: either an article or the failure sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NewsEntry {
    Unavailable(LookupError),
    Article(NewsItem),
}

impl NewsEntry {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Error-suppressing front for a market data provider.
#[derive(Clone)]
pub struct MarketDataGateway {
    provider: Arc<dyn MarketDataProvider>,
}

impl MarketDataGateway {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Create a gateway backed by Yahoo Finance.
    pub fn from_config(config: &detective_common::Config) -> Self {
        Self::new(Arc::new(YahooAdapter::from_config(&config.market_data)))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Fundamentals for `ticker`, or the sentinel mapping on any failure.
    pub async fn fundamentals(&self, ticker: &str) -> Fundamentals {
        match self.provider.fetch_fundamentals(ticker).await {
            Ok(fundamentals) => fundamentals,
            Err(e) => {
                tracing::warn!(
                    ticker,
                    provider = self.provider.name(),
                    kind = e.kind(),
                    error = %e,
                    "Fundamentals lookup failed"
                );
                lookup_error_fundamentals()
            }
        }
    }

    /// News for `ticker`, or a one-element sentinel list on any failure.
    pub async fn news(&self, ticker: &str) -> Vec<NewsEntry> {
        match self.provider.fetch_news(ticker).await {
            Ok(items) => items.into_iter().map(NewsEntry::Article).collect(),
            Err(e) => {
                tracing::warn!(
                    ticker,
                    provider = self.provider.name(),
                    kind = e.kind(),
                    error = %e,
                    "News lookup failed"
                );
                vec![NewsEntry::Unavailable(LookupError::default())]
            }
        }
    }
}
