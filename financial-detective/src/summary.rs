//! Prose summaries of detective results.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::detective::DetectiveResult;
use crate::llm::{ChatMessage, ChatModel, ChatRequest};

/// Returned when there is no model or nothing to summarize.
pub const DEFAULT_SUMMARY: &str = "Analysis completed. Check the detailed data below.";

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a financial analyst. Provide a brief, professional summary of the stock analysis results.";

/// Condensed per-ticker view sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestEntry {
    pub ticker: String,
    #[serde(rename = "marketCap")]
    pub market_cap: Value,
    pub sector: Value,
    pub news_articles: usize,
}

impl DigestEntry {
    pub fn from_result(result: &DetectiveResult) -> Self {
        let field = |key: &str| {
            result
                .fundamentals
                .get(key)
                .cloned()
                .unwrap_or_else(|| Value::String("N/A".to_string()))
        };

        Self {
            ticker: result.ticker.clone(),
            market_cap: field("marketCap"),
            sector: field("sector"),
            news_articles: result.news.len(),
        }
    }
}

/// Message used when the model call fails.
pub fn failure_summary(count: usize) -> String {
    format!(
        "Analysis completed for {} stocks. Detailed data available below.",
        count
    )
}

/// Produces the prose summary for the AI detective flow.
#[derive(Clone)]
pub struct SummaryGenerator {
    model: Option<Arc<dyn ChatModel>>,
}

impl SummaryGenerator {
    pub fn new(model: Option<Arc<dyn ChatModel>>) -> Self {
        Self { model }
    }

    pub async fn summarize(&self, results: &[DetectiveResult]) -> String {
        let Some(model) = &self.model else {
            return DEFAULT_SUMMARY.to_string();
        };
        if results.is_empty() {
            return DEFAULT_SUMMARY.to_string();
        }

        let digest: Vec<DigestEntry> = results.iter().map(DigestEntry::from_result).collect();
        let digest_json = match serde_json::to_string_pretty(&digest) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize summary digest");
                return failure_summary(results.len());
            }
        };

        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                ChatMessage::user(format!("Analyze these stocks: {}", digest_json)),
            ],
            max_tokens: 300,
            temperature: 0.7,
        };

        match model.complete(request).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(model = model.model(), error = %e, "Summary generation failed");
                failure_summary(results.len())
            }
        }
    }
}
