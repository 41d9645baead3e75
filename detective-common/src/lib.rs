//! Detective Common - Shared configuration, errors and logging for the
//! Financial Detective service.
//!
//! This crate provides:
//! - Configuration types and loading (file, `.env`, environment)
//! - Error types and context helpers
//! - Logging setup with noise filtering

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    Config, LlmConfig, MarketDataConfig, ObservabilityConfig, SecretsConfig, ServerConfig,
};
pub use error::{Error, Result};
