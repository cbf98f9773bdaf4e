//! CLI module for the site content cache
//!
//! Provides subcommands for:
//! - `serve`: HTTP server
//! - `translations`: catalog validation and key sync
//! - `cache`: cache inspection and maintenance

pub mod cache;
pub mod serve;
pub mod translations;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Site content cache - translation delivery and cache invalidation layer
#[derive(Parser)]
#[command(name = "site-content-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Translation catalog maintenance
    #[command(subcommand)]
    Translations(translations::TranslationsCommand),

    /// Cache maintenance
    #[command(subcommand)]
    Cache(cache::CacheCommand),
}

/// Loads `.env` and the layered configuration, then installs logging
pub fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
