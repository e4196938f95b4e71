//! Configuration for the notifier.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): watched collections, bot identity
//! - CLI arguments: input, delivery mode, collection overrides

use std::path::PathBuf;

use clap::Parser;
use nft_notify::{
    Collection,
    delivery::{DEFAULT_USERNAME, DeliveryMode, Sender},
};
use url::Url;

/// Environment configuration.
#[derive(Debug, Default, serde::Deserialize)]
pub struct EnvConfig {
    /// Space-separated slugs of the watched collections
    pub collection_slugs: Option<String>,

    /// Name messages are posted under (default: OpenSeaBot)
    pub bot_username: Option<String>,

    /// Avatar image of the bot
    pub bot_avatar_url: Option<String>,

    /// Initial state of the on/off switch (default: true)
    pub bot_enabled: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

/// CLI arguments.
#[derive(Debug, Default, Parser)]
#[command(name = "notify")]
#[command(about = "Render marketplace events of watched collections as chat webhook messages")]
pub struct CliConfig {
    /// Newline-delimited JSON stream messages to read (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Collection slugs to watch (comma-separated), overrides COLLECTION_SLUGS
    #[arg(short, long, value_delimiter = ',')]
    pub collection: Vec<String>,

    /// Message form: embed or text
    #[arg(short, long, value_enum, default_value = "embed")]
    pub mode: DeliveryMode,

    /// Sender name, overrides BOT_USERNAME
    #[arg(short, long)]
    pub username: Option<String>,
}

/// Resolved notifier configuration.
#[derive(Debug)]
pub struct NotifierConfig {
    pub input: Option<PathBuf>,
    pub collections: Vec<Collection>,
    pub sender: Sender,
    pub mode: DeliveryMode,
    pub enabled: bool,
}

impl CliConfig {
    /// Merge CLI arguments over the environment configuration.
    pub fn to_notifier_config(&self, env: &EnvConfig) -> Result<NotifierConfig, ConfigError> {
        let slugs: Vec<String> = if self.collection.is_empty() {
            env.collection_slugs
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect()
        } else {
            self.collection
                .iter()
                .map(|slug| slug.trim().to_string())
                .filter(|slug| !slug.is_empty())
                .collect()
        };
        if slugs.is_empty() {
            return Err(ConfigError::NoCollections);
        }

        let avatar_url = env
            .bot_avatar_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(Url::parse)
            .transpose()
            .map_err(ConfigError::InvalidAvatarUrl)?;
        let username = self
            .username
            .as_deref()
            .or(env.bot_username.as_deref())
            .unwrap_or(DEFAULT_USERNAME);

        Ok(NotifierConfig {
            input: self.input.clone(),
            collections: slugs.into_iter().map(Collection::new).collect(),
            sender: Sender::new(username, avatar_url),
            mode: self.mode,
            enabled: env.bot_enabled.unwrap_or(true),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no collections to watch, set COLLECTION_SLUGS or --collection")]
    NoCollections,

    #[error("invalid bot avatar URL: {0}")]
    InvalidAvatarUrl(url::ParseError),
}
