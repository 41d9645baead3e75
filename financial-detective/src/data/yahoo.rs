//! Yahoo Finance adapter.
//!
//! # Endpoints
//! - `GET /v10/finance/quoteSummary/{symbol}` - company profile, valuation and price modules
//! - `GET /v1/finance/search?q={symbol}` - related news headlines
//!
//! # Session
//! quoteSummary rejects requests without a session crumb. The adapter visits the
//! cookie page once, reads a crumb from `/v1/test/getcrumb` with that cookie and
//! keeps it until Yahoo answers 401.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use super::provider::{MarketDataProvider, ProviderError};
use super::{Fundamentals, NewsItem};
use detective_common::config::MarketDataConfig;

// ============================================================================
// Constants
// ============================================================================

/// quoteSummary modules, in merge priority order.
const QUOTE_SUMMARY_MODULES: &[&str] = &[
    "assetProfile",
    "summaryDetail",
    "defaultKeyStatistics",
    "financialData",
    "price",
    "quoteType",
];

/// Yahoo throttles the default client user agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Yahoo Finance market data adapter.
pub struct YahooAdapter {
    /// HTTP client with a cookie jar
    client: reqwest::Client,
    /// Query API base URL
    base_url: String,
    /// Page that hands out the session cookie
    cookie_url: String,
    /// News items requested per search
    news_count: u32,
    /// Session crumb, fetched on first use
    crumb: RwLock<Option<String>>,
}

impl YahooAdapter {
    /// Create an adapter against the given API and cookie URLs.
    pub fn new(base_url: impl Into<String>, cookie_url: impl Into<String>) -> Self {
        Self::with_options(base_url, cookie_url, 8, Duration::from_secs(30))
    }

    /// Create with explicit news count and request timeout.
    pub fn with_options(
        base_url: impl Into<String>,
        cookie_url: impl Into<String>,
        news_count: u32,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into(),
            cookie_url: cookie_url.into(),
            news_count,
            crumb: RwLock::new(None),
        }
    }

    /// Create from the `market_data` config section.
    pub fn from_config(config: &MarketDataConfig) -> Self {
        Self::with_options(
            config.base_url.clone(),
            config.cookie_url.clone(),
            config.news_count,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Build an API URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::InvalidRequest(format!("Invalid base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidRequest("Base URL cannot have a path".into()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Return the session crumb, establishing a session if needed.
    async fn crumb(&self) -> Result<String, ProviderError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the Set-Cookie header matters here; the page itself is usually a 404.
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            debug!(error = %e, "Cookie bootstrap request failed");
        }

        let url = self.endpoint(&["v1", "test", "getcrumb"])?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Auth(format!(
                "Crumb request failed: HTTP {}",
                status
            )));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(ProviderError::Auth("Provider returned no crumb".into()));
        }

        debug!("Yahoo session established");
        *self.crumb.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    /// Map non-success statuses to provider errors.
    async fn check_status(
        response: reqwest::Response,
        ticker: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Auth("Session rejected".into()));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::DataNotAvailable(ticker.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Internal(format!("HTTP {}: {}", status, body)));
        }

        Ok(response)
    }
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for YahooAdapter {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ProviderError> {
        let crumb = self.crumb().await?;

        let mut url = self.endpoint(&["v10", "finance", "quoteSummary", ticker])?;
        url.query_pairs_mut()
            .append_pair("modules", &QUOTE_SUMMARY_MODULES.join(","))
            .append_pair("crumb", &crumb);

        debug!(ticker, "Fetching quoteSummary from Yahoo");

        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            *self.crumb.write().await = None;
        }

        let response = Self::check_status(response, ticker).await?;
        let body: QuoteSummaryResponse = response.json().await?;

        flatten_quote_summary(ticker, body.quote_summary)
    }

    async fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsItem>, ProviderError> {
        let mut url = self.endpoint(&["v1", "finance", "search"])?;
        url.query_pairs_mut()
            .append_pair("q", ticker)
            .append_pair("quotesCount", "0")
            .append_pair("newsCount", &self.news_count.to_string());

        debug!(ticker, "Fetching news from Yahoo");

        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;

        let response = Self::check_status(response, ticker).await?;
        let body: SearchResponse = response.json().await?;

        Ok(body.news)
    }
}

// ============================================================================
// Response Flattening
// ============================================================================

/// Merge the quoteSummary modules into one attribute mapping.
///
/// `{"raw": x, "fmt": ..}` wrappers collapse to `x`, empty objects and `maxAge`
/// are dropped, and a key keeps the value from the first module that has it.
fn flatten_quote_summary(ticker: &str, summary: QuoteSummary) -> Result<Fundamentals, ProviderError> {
    if let Some(error) = summary.error.filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("quoteSummary error");
        return Err(ProviderError::DataNotAvailable(format!(
            "{}: {}",
            ticker, description
        )));
    }

    let modules = summary
        .result
        .and_then(|result| result.into_iter().next())
        .ok_or_else(|| ProviderError::DataNotAvailable(ticker.to_string()))?;

    let mut fundamentals = Fundamentals::new();

    for name in QUOTE_SUMMARY_MODULES {
        let Some(Value::Object(module)) = modules.get(*name) else {
            continue;
        };

        for (key, value) in module {
            if key == "maxAge" {
                continue;
            }
            if let Some(value) = unwrap_raw(value) {
                fundamentals.entry(key.clone()).or_insert(value);
            }
        }
    }

    if fundamentals.is_empty() {
        return Err(ProviderError::DataNotAvailable(ticker.to_string()));
    }

    Ok(fundamentals)
}

fn unwrap_raw(value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => match map.get("raw") {
            Some(raw) => Some(raw.clone()),
            None => Some(value.clone()),
        },
        other => Some(other.clone()),
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    error: Option<Value>,
}

/// Search response; only the news list is used.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

// ============================================================================
// Tests
// ============================================================================
