//! Event classification and message rendering.
//!
//! [`classify`] picks the renderer registered for the kind of an [`Event`],
//! [`render`] runs it. Every renderer produces both the structured embed
//! (title, link, thumbnail, body lines, price field, color) and the one-line
//! plain-text summary of the event.
//!
//! Renderers are pure functions of the event and the [`Collection`] it was
//! received for: no I/O, no logging, no shared state. Rendering the same
//! event twice yields equal messages. A payload missing the item, or the
//! price its kind is quoted in, fails with
//! [`RenderError::MalformedPayload`](crate::error::RenderError::MalformedPayload);
//! absent counterparties degrade to a `None` placeholder, except the winner
//! line which is left out.

mod embed;
mod line;
mod text;


pub use line::BodyLine;

use itertools::Itertools;

use crate::{
    Collection,
    error::Result,
    types::{Event, EventKind},
};

/// Renders a single event for a collection.
pub type RenderFn = fn(&Event, &Collection) -> Result<RenderedMessage>;

/// Returns the renderer registered for the event kind.
pub fn classify(event: &Event) -> RenderFn {
    renderer(event.kind())
}

/// Renderer registered for the kind. Unknown kinds get the fallback renderer.
pub fn renderer(kind: EventKind) -> RenderFn {
    match kind {
        EventKind::ItemListed => embed::listing,
        EventKind::ItemReceivedOffer => embed::offer,
        EventKind::ItemReceivedBid => embed::bid,
        EventKind::ItemSold => embed::sale,
        EventKind::ItemTransferred => embed::transfer,
        EventKind::ItemCancelled => embed::cancelled,
        EventKind::ItemMetadataUpdated => embed::metadata_updated,
        EventKind::Unknown => embed::fallback,
    }
}

/// Classifies and renders the event.
pub fn render(event: &Event, collection: &Collection) -> Result<RenderedMessage> {
    classify(event)(event, collection)
}

/// Semantic color of the message, carrying its chat palette value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Listings.
    Aqua,
    /// Offers.
    LuminousVividPink,
    /// Bids.
    Yellow,
    /// Sales.
    Green,
    /// Transfers.
    Red,
    /// Cancellations.
    Fuchsia,
    #[default]
    Default,
}

impl Color {
    pub fn value(&self) -> u32 {
        match self {
            Color::Aqua => 0x1ABC9C,
            Color::LuminousVividPink => 0xE91E63,
            Color::Yellow => 0xFFFF00,
            Color::Green => 0x57F287,
            Color::Red => 0xED4245,
            Color::Fuchsia => 0xEB459E,
            Color::Default => 0x000000,
        }
    }
}

/// Labelled price of a trade, e.g. `Listed for: 1.5 ETH / $4,500.00 USD`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceField {
    label: &'static str,
    value: String,
}

impl PriceField {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Notification rendered for a single event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedMessage {
    title: String,
    url: String,
    thumbnail_url: Option<String>,
    body: Vec<BodyLine>,
    price: Option<PriceField>,
    color: Color,
    plain_text: String,
}

impl RenderedMessage {
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Item permalink.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    pub fn body(&self) -> &[BodyLine] {
        &self.body
    }

    /// Body lines as plain `Label: value` strings.
    pub fn body_lines(&self) -> Vec<String> {
        self.body.iter().map(ToString::to_string).collect()
    }

    /// Body lines as markdown, one per line.
    pub fn description(&self) -> String {
        self.body.iter().map(BodyLine::to_markdown).join("\n")
    }

    pub fn price(&self) -> Option<&PriceField> {
        self.price.as_ref()
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// One-line summary for plain-text delivery.
    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }
}
