//! Request flows: screening, the top-3 detective pipeline and lookups.
//!
//! Every flow is a sequential chain of awaits; nothing here retries or
//! surfaces collaborator errors.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::criteria::CriteriaParser;
use crate::data::{Fundamentals, MarketDataGateway, NewsEntry};
use crate::llm::ChatModel;
use crate::screener::{Screener, ScreeningCriteria};
use crate::summary::SummaryGenerator;

/// How many screened tickers the detective flows investigate.
pub const DETECTIVE_TOP_N: usize = 3;

/// Fundamentals and news gathered for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectiveResult {
    pub ticker: String,
    pub fundamentals: Fundamentals,
    pub news: Vec<NewsEntry>,
}

/// Output of the AI detective flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectiveReport {
    pub query: String,
    pub parsed_criteria: ScreeningCriteria,
    pub summary: String,
    pub detailed_results: Vec<DetectiveResult>,
}

/// Composes the gateway, screener, parser and summary generator.
#[derive(Clone)]
pub struct Detective {
    gateway: MarketDataGateway,
    screener: Screener,
    parser: CriteriaParser,
    summarizer: SummaryGenerator,
}

impl Detective {
    /// `model` is `None` when no language-model credential is configured.
    pub fn new(gateway: MarketDataGateway, model: Option<Arc<dyn ChatModel>>) -> Self {
        Self {
            screener: Screener::new(gateway.clone()),
            parser: CriteriaParser::new(model.clone()),
            summarizer: SummaryGenerator::new(model),
            gateway,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.gateway.provider_name()
    }

    pub async fn run_screener(&self, criteria: &ScreeningCriteria) -> Vec<String> {
        self.screener.screen(criteria).await
    }

    /// Screen, then gather fundamentals and news for the first passing tickers.
    pub async fn run_detective(&self, criteria: &ScreeningCriteria) -> Vec<DetectiveResult> {
        let passed = self.screener.screen(criteria).await;
        info!(
            passed = passed.len(),
            investigating = passed.len().min(DETECTIVE_TOP_N),
            "Screening complete"
        );

        let mut results = Vec::with_capacity(DETECTIVE_TOP_N);
        for ticker in passed.into_iter().take(DETECTIVE_TOP_N) {
            let fundamentals = self.gateway.fundamentals(&ticker).await;
            let news = self.gateway.news(&ticker).await;
            results.push(DetectiveResult {
                ticker,
                fundamentals,
                news,
            });
        }

        results
    }

    /// Parse the query, run the detective pipeline and summarize the results.
    pub async fn run_detective_ai(&self, query: &str) -> DetectiveReport {
        let criteria = self.parser.parse(query).await;
        let results = self.run_detective(&criteria).await;
        let summary = self.summarizer.summarize(&results).await;

        DetectiveReport {
            query: query.to_string(),
            parsed_criteria: criteria,
            summary,
            detailed_results: results,
        }
    }

    pub async fn fundamentals(&self, ticker: &str) -> Fundamentals {
        self.gateway.fundamentals(ticker).await
    }

    pub async fn news(&self, ticker: &str) -> Vec<NewsEntry> {
        self.gateway.news(ticker).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MarketDataProvider, NewsItem, ProviderError};
    use crate::summary::DEFAULT_SUMMARY;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Every ticker reports the same market cap; calls are recorded in order.
    struct UniformProvider {
        market_cap: f64,
        calls: Mutex<Vec<String>>,
    }

    impl UniformProvider {
        fn new(market_cap: f64) -> Arc<Self> {
            Arc::new(Self {
                market_cap,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MarketDataProvider for UniformProvider {
        fn name(&self) -> &'static str {
            "uniform"
        }

        async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ProviderError> {
            self.calls.lock().unwrap().push(format!("fundamentals:{ticker}"));
            Ok(json!({"marketCap": self.market_cap, "sector": "Financial Services"})
                .as_object()
                .cloned()
                .unwrap_or_default())
        }

        async fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsItem>, ProviderError> {
            self.calls.lock().unwrap().push(format!("news:{ticker}"));
            Ok(vec![NewsItem {
                title: Some(format!("{ticker} news")),
                link: Some(format!("https://example.com/{ticker}")),
            }])
        }
    }

    #[tokio::test]
    async fn test_detective_caps_at_three() {
        let provider = UniformProvider::new(5e12);
        let detective = Detective::new(MarketDataGateway::new(provider.clone()), None);

        let results = detective.run_detective(&ScreeningCriteria::default()).await;
        let tickers: Vec<&str> = results.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["RELIANCE.NS", "TCS.NS", "HDFCBANK.NS"]);

        // Fundamentals then news, one ticker at a time.
        let calls = provider.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "fundamentals:RELIANCE.NS",
                "news:RELIANCE.NS",
                "fundamentals:TCS.NS",
                "news:TCS.NS",
                "fundamentals:HDFCBANK.NS",
                "news:HDFCBANK.NS",
            ]
        );
    }

    #[tokio::test]
    async fn test_detective_with_threshold_screens_first() {
        let provider = UniformProvider::new(5e12);
        let detective = Detective::new(MarketDataGateway::new(provider.clone()), None);

        let results = detective
            .run_detective(&ScreeningCriteria::market_cap_above(1e12))
            .await;
        assert_eq!(results.len(), DETECTIVE_TOP_N);
        // 5 screening lookups + 3 x (fundamentals + news)
        assert_eq!(provider.calls.lock().unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_detective_nothing_passes() {
        let detective = Detective::new(MarketDataGateway::new(UniformProvider::new(1e9)), None);
        let results = detective
            .run_detective(&ScreeningCriteria::market_cap_above(1e12))
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_detective_ai_without_model() {
        let detective = Detective::new(MarketDataGateway::new(UniformProvider::new(5e12)), None);

        let report = detective.run_detective_ai("big companies only").await;
        assert_eq!(report.query, "big companies only");
        assert_eq!(report.parsed_criteria.market_cap_gt, Some(1e12));
        assert_eq!(report.summary, DEFAULT_SUMMARY);
        assert_eq!(report.detailed_results.len(), 3);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["parsed_criteria"], json!({"market_cap_gt": 1e12}));
        assert_eq!(value["detailed_results"][0]["news"][0]["title"], "RELIANCE.NS news");
    }

    #[tokio::test]
    async fn test_lookups_pass_through() {
        let detective = Detective::new(MarketDataGateway::new(UniformProvider::new(7e12)), None);
        let fundamentals = detective.fundamentals("INFY.NS").await;
        assert_eq!(fundamentals["marketCap"], json!(7e12));
        assert_eq!(detective.news("INFY.NS").await.len(), 1);
    }
}
