//! Data provider abstraction for market data.
//!
//! Defines the `MarketDataProvider` trait that every data source implements,
//! so the gateway can be driven by Yahoo in production and by stubs in tests.

use async_trait::async_trait;
use std::fmt;

use super::{Fundamentals, NewsItem};

// ============================================================================
// Provider Error
// ============================================================================

/// Errors specific to data providers.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network error (connection failed, timeout)
    Network(String),
    /// Session or credential rejected by the provider
    Auth(String),
    /// Data not available for the requested symbol
    DataNotAvailable(String),
    /// Invalid request parameters
    InvalidRequest(String),
    /// Unexpected status or payload from the provider
    Internal(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Auth(msg) => write!(f, "Authentication error: {}", msg),
            Self::DataNotAvailable(msg) => write!(f, "Data not available: {}", msg),
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network("Request timeout".into())
        } else if e.is_connect() {
            Self::Network("Connection failed".into())
        } else if e.is_decode() {
            Self::Internal(format!("Failed to parse response: {}", e))
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl ProviderError {
    /// Short machine-friendly label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::DataNotAvailable(_) => "not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) => "internal",
        }
    }
}

// ============================================================================
// Data Provider Trait
// ============================================================================

/// Trait for market data providers.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider name (e.g., "yahoo")
    fn name(&self) -> &'static str;

    /// Fetch the provider's attribute mapping for a ticker.
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ProviderError>;

    /// Fetch recent news headlines for a ticker.
    async fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsItem>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");

        let err = ProviderError::DataNotAvailable("FOO.NS".into());
        assert!(err.to_string().contains("FOO.NS"));
    }

    #[test]
    fn test_provider_error_kind() {
        assert_eq!(ProviderError::Auth("crumb".into()).kind(), "auth");
        assert_eq!(ProviderError::DataNotAvailable("x".into()).kind(), "not_found");
        assert_eq!(ProviderError::Internal("x".into()).kind(), "internal");
    }
}
