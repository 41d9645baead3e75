//! Financial Detective Library
//!
//! Screens a fixed universe of NSE tickers by market capitalization, gathers
//! fundamentals and news for the top matches and, when a language-model key is
//! configured, turns free-text queries into criteria and summarizes results.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 financial-detective (HTTP :8000)             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  routes ──► Detective ──┬─► Screener ──┐                     │
//! │                         ├─► CriteriaParser ──┐               │
//! │                         ├─► SummaryGenerator ┴─► ChatModel   │
//! │                         └─► MarketDataGateway ◄┘             │
//! │                                   │                          │
//! │                          MarketDataProvider (Yahoo)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every collaborator failure is absorbed where it happens: lookups return a
//! sentinel, criteria parsing falls back to "no filter" and summaries fall back
//! to fixed text. No request fails because an upstream did.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod criteria;
pub mod data;
pub mod detective;
pub mod llm;
pub mod routes;
pub mod screener;
pub mod summary;
pub mod web;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use detective_common::config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::data::{MarketDataGateway, MarketDataProvider};
use crate::detective::Detective;
use crate::llm::ChatModel;
use crate::web::WebPages;

/// Shared, read-only service state.
pub struct DetectiveState {
    /// Configuration
    pub config: Config,
    /// Request flows
    pub detective: Detective,
    /// Compiled page templates
    pub pages: WebPages,
    /// Whether a language model is configured
    pub ai_enabled: bool,
}

impl DetectiveState {
    /// Build state with Yahoo market data and the configured language model.
    pub fn new(config: Config) -> Result<Self> {
        let gateway = MarketDataGateway::from_config(&config);
        let model = llm::from_config(&config);
        Self::with_gateway(config, gateway, model)
    }

    /// Build state around explicit collaborators.
    pub fn with_components(
        config: Config,
        provider: Arc<dyn MarketDataProvider>,
        model: Option<Arc<dyn ChatModel>>,
    ) -> Result<Self> {
        Self::with_gateway(config, MarketDataGateway::new(provider), model)
    }

    fn with_gateway(
        config: Config,
        gateway: MarketDataGateway,
        model: Option<Arc<dyn ChatModel>>,
    ) -> Result<Self> {
        let ai_enabled = model.is_some();

        tracing::info!(
            provider = gateway.provider_name(),
            model = model.as_ref().map(|m| m.model()).unwrap_or("none"),
            "Detective state initialized"
        );

        Ok(Self {
            config,
            detective: Detective::new(gateway, model),
            pages: WebPages::new()?,
            ai_enabled,
        })
    }
}

/// Build the HTTP router.
pub fn build_router(state: Arc<DetectiveState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/static/app.js", get(routes::app_js))
        .route("/screener", post(routes::run_screener))
        .route("/financial_detective", post(routes::run_financial_detective))
        .route("/financial_detective_ai", post(routes::run_financial_detective_ai))
        .route("/stock_fundamentals/:ticker", get(routes::stock_fundamentals))
        .route("/stock_news/:ticker", get(routes::stock_news))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Main detective service
pub struct DetectiveService {
    state: Arc<DetectiveState>,
}

impl DetectiveService {
    /// Create a new service from configuration
    pub fn new(config: Config) -> Result<Self> {
        let state = Arc::new(DetectiveState::new(config)?);
        Ok(Self { state })
    }

    /// Serve HTTP until Ctrl+C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self.state.config.bind_address().parse()?;
        let app = build_router(self.state.clone());

        if !self.state.ai_enabled {
            tracing::info!("No language-model key configured, using keyword parsing and fixed summaries");
        }

        tracing::info!(address = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_default_config() {
        let state = DetectiveState::new(Config::default()).unwrap();
        assert!(!state.ai_enabled);
        assert_eq!(state.detective.provider_name(), "yahoo");
    }

    #[test]
    fn test_state_with_key_enables_ai() {
        let mut config = Config::default();
        config.secrets.openai_api_key = Some("sk-test".into());
        let state = DetectiveState::new(config).unwrap();
        assert!(state.ai_enabled);
    }
}
