pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::{AppConfig, load_portfolios};
use crate::core::{BestPortfolio, Investment, PriceResolver};
use crate::providers::FintualProvider;
use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub async fn run(
    config_path: Option<&str>,
    portfolios_path: &Path,
    investment: &Investment,
) -> Result<Option<BestPortfolio>> {
    info!("Portfolio comparison starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let portfolios = load_portfolios(portfolios_path)?;

    let provider = FintualProvider::new(
        &config.provider.base_url,
        Duration::from_secs(config.provider.timeout_secs),
    )?;
    let resolver = PriceResolver::new(provider)
        .with_search(config.search.max_search, config.search.window_step_days);

    let best = cli::report::run(&portfolios, investment, &config.funds, &resolver).await;
    let resolved = resolver.cache().len().await;
    debug!(resolved, "Share values looked up");
    Ok(best)
}
