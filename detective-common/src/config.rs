//! Configuration management for the Financial Detective service.
//!
//! The service reads a single JSON file at `~/.financial-detective/config.json`
//! (or the path in `DETECTIVE_CONFIG`).
//!
//! # Configuration Priority
//!
//! 1. Environment variables (including a `.env` file in the working directory)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `DETECTIVE_CONFIG` → config file path
//! - `DETECTIVE_HOST` → server.host
//! - `DETECTIVE_PORT` → server.port
//! - `DETECTIVE_LOG_LEVEL` → observability.log_level
//! - `DETECTIVE_LOG_FORMAT` → observability.log_format
//! - `OPENAI_API_KEY` → secrets.openai_api_key
//! - `OPENAI_BASE_URL` → llm.base_url

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ResultExt};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".financial-detective"),
        |dirs| dirs.home_dir().join(".financial-detective"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    std::env::var_os("DETECTIVE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("config.json"))
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP server bind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Credentials. Every field is optional; a missing key disables the feature
/// that needs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// OpenAI (or compatible) API key for criteria parsing and summaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (without `/v1`)
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Market data provider settings (Yahoo Finance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Query API base URL
    #[serde(default = "default_market_base_url")]
    pub base_url: String,
    /// Page visited once to obtain the session cookie
    #[serde(default = "default_cookie_url")]
    pub cookie_url: String,
    /// Number of news items requested per ticker
    #[serde(default = "default_news_count")]
    pub news_count: u32,
    #[serde(default = "default_market_timeout")]
    pub timeout_secs: u64,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: default_market_base_url(),
            cookie_url: default_cookie_url(),
            news_count: default_news_count(),
            timeout_secs: default_market_timeout(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets pinned to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub market_data: MarketDataConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .context(format!("Failed to parse config from {}", path.display()))
    }

    /// Load `.env`, the config file, then apply environment overrides and validate.
    pub fn load_with_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (the process env in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DETECTIVE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DETECTIVE_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid DETECTIVE_PORT"),
            }
        }
        if let Some(level) = lookup("DETECTIVE_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("DETECTIVE_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.secrets.openai_api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
    }

    /// The language-model credential, if one is configured and non-blank.
    pub fn openai_api_key(&self) -> Option<&str> {
        self.secrets
            .openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Check the configuration for values the service cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(Error::Config("llm.model must not be empty".into()));
        }
        for (name, value) in [
            ("llm.base_url", &self.llm.base_url),
            ("market_data.base_url", &self.market_data.base_url),
            ("market_data.cookie_url", &self.market_data.cookie_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("{name} is not a valid URL ({value}): {e}")))?;
        }
        if !matches!(self.observability.log_format.as_str(), "json" | "pretty") {
            return Err(Error::Config(format!(
                "observability.log_format must be \"json\" or \"pretty\", got {:?}",
                self.observability.log_format
            )));
        }
        Ok(())
    }

    /// `host:port` string the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}
fn default_llm_base_url() -> String {
    "https://api.openai.com".into()
}
fn default_llm_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_market_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}
fn default_cookie_url() -> String {
    "https://fc.yahoo.com".into()
}
fn default_news_count() -> u32 {
    8
}
fn default_market_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
