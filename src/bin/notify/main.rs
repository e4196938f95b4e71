//! Notifier for marketplace activity of watched collections.
//!
//! This binary follows a feed of newline-delimited JSON stream messages,
//! renders the events of every watched collection as they arrive and writes
//! the resulting webhook messages to standard output.

mod config;
mod error;

use std::process::exit;

use clap::Parser;
use nft_notify::{
    delivery::StdoutDelivery,
    dispatch::{self, Dispatcher},
    feed,
    switch::MemorySwitch,
};
use tokio::io::AsyncRead;
use tracing::{error, info, warn};

use config::{CliConfig, EnvConfig};
use error::Result;

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(CliConfig::parse()).await {
        error!(%e, "Notifier encountered an error, shutting down");
        exit(1);
    }
}

async fn run(cli_config: CliConfig) -> Result<()> {
    let env_config = EnvConfig::from_env()?;
    let config = cli_config.to_notifier_config(&env_config)?;

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &config.input {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };
    info!(
        collections = config.collections.len(),
        enabled = config.enabled,
        "Reading stream messages"
    );

    let delivery = StdoutDelivery::stdout();
    let switch = MemorySwitch::new(config.enabled);
    let dispatchers: Vec<_> = config
        .collections
        .into_iter()
        .map(|collection| {
            Dispatcher::new(collection, &delivery, &switch)
                .with_sender(config.sender.clone())
                .with_mode(config.mode)
        })
        .collect();

    let stats = dispatch::route(&dispatchers, feed::messages(reader)).await?;

    let failed: usize = stats.iter().map(|s| s.failed).sum();
    if failed > 0 {
        warn!(failed, "Some events could not be delivered");
    }
    Ok(())
}
