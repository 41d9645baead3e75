//! Financial Detective - stock screening and news digest service.

use anyhow::Result;
use detective_common::config::Config;
use detective_common::logging::init_from_config;
use financial_detective::DetectiveService;

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = std::time::Instant::now();

    // Load .env, config file and environment overrides
    let config = Config::load_with_env()?;

    init_from_config(&config.observability);

    tracing::info!("Financial Detective v{}", env!("CARGO_PKG_VERSION"));

    let service = DetectiveService::new(config)?;

    let startup_duration = startup_start.elapsed();
    tracing::info!(
        duration_ms = startup_duration.as_millis() as u64,
        "Service initialized in {:?}",
        startup_duration
    );

    service.start().await
}
