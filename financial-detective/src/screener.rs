//! Market-cap screener over the fixed ticker universe.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{market_cap, MarketDataGateway};

/// Tickers the service screens, in output order.
pub const TICKER_UNIVERSE: [&str; 5] = [
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "INFY.NS",
    "ICICIBANK.NS",
];

/// Screening criteria. `None` means no filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreeningCriteria {
    /// Exclusive lower bound on market capitalization
    #[serde(default)]
    pub market_cap_gt: Option<f64>,
}

impl ScreeningCriteria {
    pub fn market_cap_above(threshold: f64) -> Self {
        Self {
            market_cap_gt: Some(threshold),
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.market_cap_gt.is_none()
    }
}

/// Filters the universe by fetched fundamentals.
#[derive(Clone)]
pub struct Screener {
    gateway: MarketDataGateway,
}

impl Screener {
    pub fn new(gateway: MarketDataGateway) -> Self {
        Self { gateway }
    }

    /// Tickers passing `criteria`, in universe order.
    ///
    /// Without a threshold every ticker passes and no data is fetched. With a
    /// threshold a ticker passes only if it reports a numeric market cap
    /// strictly above it; unknown market caps are excluded.
    pub async fn screen(&self, criteria: &ScreeningCriteria) -> Vec<String> {
        let Some(threshold) = criteria.market_cap_gt else {
            return TICKER_UNIVERSE.iter().map(|t| t.to_string()).collect();
        };

        let mut passed = Vec::new();
        for ticker in TICKER_UNIVERSE {
            let fundamentals = self.gateway.fundamentals(ticker).await;
            match market_cap(&fundamentals) {
                Some(cap) if cap > threshold => passed.push(ticker.to_string()),
                Some(cap) => debug!(ticker, market_cap = cap, threshold, "Below threshold"),
                None => debug!(ticker, threshold, "No market cap, excluded"),
            }
        }

        passed
    }
}
