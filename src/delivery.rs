//! Outbound boundary: webhook documents and their delivery.
//!
//! [`Sender`] turns a [`RenderedMessage`] into a [`WebhookMessage`] posted
//! under the configured bot name and avatar. Transport, retries and rate
//! limiting belong to the [`Delivery`] implementation.

use std::future::Future;

use serde::Serialize;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use url::Url;

use crate::render::RenderedMessage;

/// Default sender name of posted messages.
pub const DEFAULT_USERNAME: &str = "OpenSeaBot";

/// Delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write message: {0}")]
    Io(#[from] std::io::Error),

    /// The channel refused the message, e.g. a non-success webhook response
    /// or a rate limit. Transport implementations report refusals with it.
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Form of the posted message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DeliveryMode {
    /// Structured embed
    #[default]
    Embed,
    /// One-line plain-text summary
    Text,
}

/// Chat webhook execution body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub username: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub author: EmbedAuthor,

    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub color: u32,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl From<&RenderedMessage> for Embed {
    fn from(message: &RenderedMessage) -> Self {
        let description = message.description();
        Self {
            author: EmbedAuthor {
                name: message.title().to_string(),
                url: message.url().to_string(),
            },
            url: message.url().to_string(),
            thumbnail: message.thumbnail_url().map(|url| EmbedMedia {
                url: url.to_string(),
            }),
            description: (!description.is_empty()).then_some(description),
            color: message.color().value(),
            fields: message
                .price()
                .map(|price| EmbedField {
                    name: price.label().to_string(),
                    value: price.value().to_string(),
                    inline: false,
                })
                .into_iter()
                .collect(),
        }
    }
}

/// Identity messages are posted under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    username: String,
    avatar_url: Option<Url>,
}

impl Default for Sender {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, None)
    }
}

impl Sender {
    pub fn new(username: impl Into<String>, avatar_url: Option<Url>) -> Self {
        Self {
            username: username.into(),
            avatar_url,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn avatar_url(&self) -> Option<&Url> {
        self.avatar_url.as_ref()
    }

    pub fn message(&self, rendered: &RenderedMessage, mode: DeliveryMode) -> WebhookMessage {
        let (content, embeds) = match mode {
            DeliveryMode::Embed => (None, vec![Embed::from(rendered)]),
            DeliveryMode::Text => (Some(rendered.plain_text().to_string()), vec![]),
        };
        WebhookMessage {
            username: self.username.clone(),
            avatar_url: self.avatar_url.as_ref().map(Url::to_string),
            content,
            embeds,
        }
    }
}

/// Posts webhook messages to a channel.
pub trait Delivery {
    fn deliver(
        &self,
        message: WebhookMessage,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Writes every message as a single line of JSON.
#[derive(Debug)]
pub struct WriterDelivery<W> {
    writer: Mutex<W>,
}

/// Writes to the process standard output.
pub type StdoutDelivery = WriterDelivery<tokio::io::Stdout>;

impl StdoutDelivery {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> WriterDelivery<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: AsyncWrite + Unpin + Send> Delivery for WriterDelivery<W> {
    async fn deliver(&self, message: WebhookMessage) -> Result<(), DeliveryError> {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Keeps delivered messages in memory.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    messages: Mutex<Vec<WebhookMessage>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<WebhookMessage> {
        self.messages.lock().await.clone()
    }
}

impl Delivery for MemoryDelivery {
    async fn deliver(&self, message: WebhookMessage) -> Result<(), DeliveryError> {
        self.messages.lock().await.push(message);
        Ok(())
    }
}
