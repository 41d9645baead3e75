//! Chat-completion client tests and the AI detective flow against a mock
//! OpenAI-compatible server.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use financial_detective::criteria::CriteriaParser;
use financial_detective::data::{
    Fundamentals, MarketDataGateway, MarketDataProvider, NewsItem, ProviderError,
};
use financial_detective::detective::Detective;
use financial_detective::llm::{ChatMessage, ChatModel, ChatRequest, OpenAiChat};

fn client(server: &MockServer) -> Arc<OpenAiChat> {
    Arc::new(OpenAiChat::new(
        "sk-test",
        &server.uri(),
        "gpt-3.5-turbo",
        Duration::from_secs(5),
    ))
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-3.5-turbo",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
}

/// Market caps descending from 1.9e13 in steps of 3e12.
struct LadderProvider;

#[async_trait]
impl MarketDataProvider for LadderProvider {
    fn name(&self) -> &'static str {
        "ladder"
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, ProviderError> {
        let rank = financial_detective::screener::TICKER_UNIVERSE
            .iter()
            .position(|t| *t == ticker)
            .ok_or_else(|| ProviderError::DataNotAvailable(ticker.to_string()))?;
        let value = json!({
            "marketCap": 1.9e13 - 3.0e12 * rank as f64,
            "sector": "Energy"
        });
        Ok(value.as_object().cloned().unwrap_or_default())
    }

    async fn fetch_news(&self, _ticker: &str) -> Result<Vec<NewsItem>, ProviderError> {
        Ok(vec![NewsItem {
            title: Some("Results announced".into()),
            link: None,
        }])
    }
}

fn detective(server: &MockServer) -> Detective {
    let model: Arc<dyn ChatModel> = client(server);
    Detective::new(MarketDataGateway::new(Arc::new(LadderProvider)), Some(model))
}

#[tokio::test]
async fn test_complete_sends_bearer_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 42,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(completion("hi there"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server)
        .complete(ChatRequest {
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hello")],
            max_tokens: 42,
            temperature: 0.0,
        })
        .await
        .unwrap();

    assert_eq!(reply, "hi there");
}

#[tokio::test]
async fn test_complete_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .complete(ChatRequest {
            messages: vec![ChatMessage::user("hello")],
            max_tokens: 10,
            temperature: 0.0,
        })
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("401"));
    assert!(message.contains("Incorrect API key"));
}

#[tokio::test]
async fn test_complete_without_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = client(&server)
        .complete(ChatRequest {
            messages: vec![ChatMessage::user("hello")],
            max_tokens: 10,
            temperature: 0.0,
        })
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_parser_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 100, "temperature": 0.0})))
        .respond_with(completion("{\"market_cap_gt\": 500000000000}"))
        .mount(&server)
        .await;

    let model: Arc<dyn ChatModel> = client(&server);
    let criteria = CriteriaParser::new(Some(model))
        .parse("companies bigger than 500 billion")
        .await;

    assert_eq!(criteria.market_cap_gt, Some(5.0e11));
}

#[tokio::test]
async fn test_parser_unreachable_model_means_no_filter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let model: Arc<dyn ChatModel> = client(&server);
    // Keyword rules would match "large cap"; a configured model replaces them.
    let criteria = CriteriaParser::new(Some(model)).parse("large cap stocks").await;

    assert_eq!(criteria.market_cap_gt, None);
}

#[tokio::test]
async fn test_detective_ai_flow() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 100})))
        .respond_with(completion("{\"market_cap_gt\": 14000000000000}"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 300})))
        .respond_with(completion("\n  Two energy majors lead the screen.  \n"))
        .expect(1)
        .mount(&server)
        .await;

    let report = detective(&server)
        .run_detective_ai("energy giants above 14 trillion")
        .await;

    assert_eq!(report.query, "energy giants above 14 trillion");
    assert_eq!(report.parsed_criteria.market_cap_gt, Some(1.4e13));
    assert_eq!(report.summary, "Two energy majors lead the screen.");

    let tickers: Vec<&str> = report
        .detailed_results
        .iter()
        .map(|r| r.ticker.as_str())
        .collect();
    assert_eq!(tickers, vec!["RELIANCE.NS", "TCS.NS"]);
}

#[tokio::test]
async fn test_detective_ai_summary_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 100})))
        .respond_with(completion("{\"market_cap_gt\": null}"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 300})))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let report = detective(&server).run_detective_ai("anything").await;

    assert_eq!(report.parsed_criteria.market_cap_gt, None);
    assert_eq!(report.detailed_results.len(), 3);
    assert_eq!(
        report.summary,
        "Analysis completed for 3 stocks. Detailed data available below."
    );
}

#[tokio::test]
async fn test_detective_ai_empty_screen_skips_summary() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 100})))
        .respond_with(completion("{\"market_cap_gt\": 1e15}"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 300})))
        .respond_with(completion("should not be requested"))
        .expect(0)
        .mount(&server)
        .await;

    let report = detective(&server).run_detective_ai("impossibly large").await;

    assert!(report.detailed_results.is_empty());
    assert_eq!(
        report.summary,
        "Analysis completed. Check the detailed data below."
    );
}
