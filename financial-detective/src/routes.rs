//! HTTP routes for the detective service.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{Fundamentals, NewsEntry};
use crate::detective::{DetectiveReport, DetectiveResult};
use crate::screener::ScreeningCriteria;
use crate::web::APP_JS;
use crate::DetectiveState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
}

/// Body of `POST /financial_detective`.
#[derive(Debug, Deserialize)]
pub struct DetectiveRequest {
    pub criteria: ScreeningCriteria,
}

/// Body of `POST /financial_detective_ai`.
#[derive(Debug, Deserialize)]
pub struct NaturalLanguageRequest {
    pub query: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Financial Detective API is running",
    })
}

/// Front page
pub async fn index(State(state): State<Arc<DetectiveState>>) -> Result<Html<String>, StatusCode> {
    match state.pages.render_index(state.ai_enabled) {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render index page");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Front page script
pub async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

/// Screen the universe by market cap
pub async fn run_screener(
    State(state): State<Arc<DetectiveState>>,
    Json(criteria): Json<ScreeningCriteria>,
) -> Json<Vec<String>> {
    Json(state.detective.run_screener(&criteria).await)
}

/// Screen, then gather fundamentals and news for the top tickers
pub async fn run_financial_detective(
    State(state): State<Arc<DetectiveState>>,
    Json(request): Json<DetectiveRequest>,
) -> Json<Vec<DetectiveResult>> {
    Json(state.detective.run_detective(&request.criteria).await)
}

/// Natural-language variant with a summary
pub async fn run_financial_detective_ai(
    State(state): State<Arc<DetectiveState>>,
    Json(request): Json<NaturalLanguageRequest>,
) -> Json<DetectiveReport> {
    tracing::info!(query = %request.query, "AI detective request");
    Json(state.detective.run_detective_ai(&request.query).await)
}

/// Raw fundamentals for one ticker (or the lookup sentinel)
pub async fn stock_fundamentals(
    State(state): State<Arc<DetectiveState>>,
    Path(ticker): Path<String>,
) -> Json<Fundamentals> {
    Json(state.detective.fundamentals(&ticker).await)
}

/// News for one ticker (or the one-element sentinel list)
pub async fn stock_news(
    State(state): State<Arc<DetectiveState>>,
    Path(ticker): Path<String>,
) -> Json<Vec<NewsEntry>> {
    Json(state.detective.news(&ticker).await)
}
