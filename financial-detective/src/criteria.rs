//! Natural-language query to screening criteria.

use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, ChatModel, ChatRequest};
use crate::screener::ScreeningCriteria;

/// Threshold for "large cap" style queries (1 trillion).
pub const LARGE_CAP_THRESHOLD: f64 = 1_000_000_000_000.0;

/// Threshold for "small cap" style queries (100 billion).
pub const SMALL_CAP_THRESHOLD: f64 = 100_000_000_000.0;

/// Keyword rules, checked in order; the first match wins.
const KEYWORD_RULES: &[(&[&str], f64)] = &[
    (&["large cap", "big companies"], LARGE_CAP_THRESHOLD),
    (&["small cap", "small companies"], SMALL_CAP_THRESHOLD),
];

const PARSER_SYSTEM_PROMPT: &str = r#"You are a financial analysis assistant. Parse user queries into screening criteria.
Respond with ONLY a JSON object with this structure:
{"market_cap_gt": number_or_null}

Examples:
- "large cap stocks" -> {"market_cap_gt": 1000000000000}
- "small companies" -> {"market_cap_gt": 100000000000}
- "all stocks" -> {"market_cap_gt": null}
"#;

/// Shape the model must answer with.
#[derive(Debug, Deserialize)]
struct ModelCriteria {
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    market_cap_gt: Option<f64>,
}

/// Models sometimes quote numbers; accept `1e12`, `"1e12"` and `null`.
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Threshold {
        Number(f64),
        Text(String),
    }

    match Option::<Threshold>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Threshold::Number(n)) => Ok(Some(n)),
        Some(Threshold::Text(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            serde::de::Error::custom(format!("market_cap_gt is not a number: {s:?}"))
        }),
    }
}

/// Keyword fallback used when no model is configured.
pub fn parse_with_rules(query: &str) -> ScreeningCriteria {
    let query = query.to_lowercase();

    KEYWORD_RULES
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|p| query.contains(p)))
        .map(|(_, threshold)| ScreeningCriteria::market_cap_above(*threshold))
        .unwrap_or_default()
}

/// Turns free-text queries into `ScreeningCriteria`.
#[derive(Clone)]
pub struct CriteriaParser {
    model: Option<Arc<dyn ChatModel>>,
}

impl CriteriaParser {
    pub fn new(model: Option<Arc<dyn ChatModel>>) -> Self {
        Self { model }
    }

    /// Parse `query`. Uses the model when configured, keyword rules otherwise.
    /// Model failures resolve to no threshold.
    pub async fn parse(&self, query: &str) -> ScreeningCriteria {
        let Some(model) = &self.model else {
            let criteria = parse_with_rules(query);
            debug!(?criteria, "Parsed query with keyword rules");
            return criteria;
        };

        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(PARSER_SYSTEM_PROMPT),
                ChatMessage::user(query),
            ],
            max_tokens: 100,
            temperature: 0.0,
        };

        let reply = match model.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(model = model.model(), error = %e, "Criteria parsing call failed, using no filter");
                return ScreeningCriteria::default();
            }
        };

        match serde_json::from_str::<ModelCriteria>(reply.trim()) {
            Ok(parsed) => {
                let criteria = ScreeningCriteria {
                    market_cap_gt: parsed.market_cap_gt,
                };
                debug!(?criteria, "Parsed query with language model");
                criteria
            }
            Err(e) => {
                warn!(error = %e, reply = %reply, "Model reply is not criteria JSON, using no filter");
                ScreeningCriteria::default()
            }
        }
    }
}
