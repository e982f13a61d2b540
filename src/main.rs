mod config;
mod core;
mod error;
mod memory;
mod models;
mod providers;

use anyhow::Context;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::BotConfig;
use crate::core::{generator::MarkovGenerator, runtime::Runtime};
use crate::memory::JsonDataStore;
use crate::providers::twitter::Twitter;

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let dotenv_result = dotenv();

    let config = BotConfig::from_env().context("Failed to load configuration")?;
    init_logging(config.debug);

    if let Err(e) = dotenv_result {
        info!("No .env file loaded: {}", e);
    }
    info!("Using data directory {}", config.data_dir.display());

    let mut runtime = Runtime::new(
        Box::new(Twitter::new(config.credentials.clone())),
        Box::new(JsonDataStore::new(&config.data_dir)),
        Box::new(MarkovGenerator::new()),
        config.tweet_mode,
    );

    runtime
        .run_periodically(config.update_interval)
        .await
        .context("Bot stopped")?;

    Ok(())
}
