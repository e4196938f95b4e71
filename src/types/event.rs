use std::fmt;

use serde::{Deserialize, de::DeserializeOwned};

use super::{Account, CollectionRef, Item, PaymentToken};
use crate::error::{RenderError, Result};

/// Message as delivered by the marketplace event stream, before
/// normalization into an [`Event`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StreamMessage {
    pub event_type: String,

    #[serde(default)]
    pub sent_at: Option<String>,

    #[serde(default)]
    pub payload: serde_json::Value,
}

impl StreamMessage {
    pub fn kind(&self) -> EventKind {
        EventKind::from_event_type(&self.event_type)
    }

    /// Slug of the collection the event belongs to, if the payload names one.
    pub fn collection_slug(&self) -> Option<&str> {
        self.payload.get("collection")?.get("slug")?.as_str()
    }
}

/// Kind of marketplace activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemListed,
    ItemCancelled,
    ItemMetadataUpdated,
    ItemSold,
    ItemTransferred,
    ItemReceivedBid,
    ItemReceivedOffer,
    Unknown,
}

impl EventKind {
    /// All recognized kinds.
    pub const KNOWN: [EventKind; 7] = [
        EventKind::ItemListed,
        EventKind::ItemCancelled,
        EventKind::ItemMetadataUpdated,
        EventKind::ItemSold,
        EventKind::ItemTransferred,
        EventKind::ItemReceivedBid,
        EventKind::ItemReceivedOffer,
    ];

    /// Kinds a collection subscription listens to unless told otherwise.
    pub const TRADE_ACTIVITY: [EventKind; 6] = [
        EventKind::ItemCancelled,
        EventKind::ItemListed,
        EventKind::ItemReceivedBid,
        EventKind::ItemReceivedOffer,
        EventKind::ItemSold,
        EventKind::ItemTransferred,
    ];

    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "item_listed" => EventKind::ItemListed,
            "item_cancelled" => EventKind::ItemCancelled,
            "item_metadata_updated" => EventKind::ItemMetadataUpdated,
            "item_sold" => EventKind::ItemSold,
            "item_transferred" => EventKind::ItemTransferred,
            "item_received_bid" => EventKind::ItemReceivedBid,
            "item_received_offer" => EventKind::ItemReceivedOffer,
            _ => EventKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ItemListed => "item_listed",
            EventKind::ItemCancelled => "item_cancelled",
            EventKind::ItemMetadataUpdated => "item_metadata_updated",
            EventKind::ItemSold => "item_sold",
            EventKind::ItemTransferred => "item_transferred",
            EventKind::ItemReceivedBid => "item_received_bid",
            EventKind::ItemReceivedOffer => "item_received_offer",
            EventKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of the listing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ListingType {
    Dutch,
    English,
    Other(String),
}

impl From<String> for ListingType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "dutch" => ListingType::Dutch,
            "english" => ListingType::English,
            _ => ListingType::Other(value),
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingType::Dutch => f.write_str("dutch"),
            ListingType::English => f.write_str("english"),
            ListingType::Other(other) => f.write_str(other),
        }
    }
}

/// Fields shared by every payload shape.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct BasePayload {
    #[serde(default)]
    pub item: Option<Item>,

    #[serde(default)]
    pub collection: Option<CollectionRef>,

    #[serde(default)]
    pub quantity: Option<u64>,

    #[serde(default)]
    pub event_timestamp: Option<String>,
}

impl BasePayload {
    /// Item the event refers to; every rendering requires it.
    pub fn item(&self) -> Result<&Item> {
        self.item
            .as_ref()
            .ok_or(RenderError::MalformedPayload { field: "item" })
    }

    /// Number of items involved, 1 unless stated otherwise.
    pub fn quantity(&self) -> u64 {
        self.quantity.unwrap_or(1)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ListingPayload {
    #[serde(flatten)]
    pub base: BasePayload,

    #[serde(default)]
    pub payment_token: Option<PaymentToken>,

    #[serde(default)]
    pub maker: Option<Account>,

    #[serde(default)]
    pub taker: Option<Account>,

    #[serde(default)]
    pub is_private: Option<bool>,

    #[serde(default)]
    pub listing_type: Option<ListingType>,

    #[serde(default)]
    pub base_price: Option<String>,
}

impl ListingPayload {
    pub fn is_private(&self) -> bool {
        self.is_private.unwrap_or(false)
    }
}

/// Offer or bid received by an item.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct OfferPayload {
    #[serde(flatten)]
    pub base: BasePayload,

    #[serde(default)]
    pub payment_token: Option<PaymentToken>,

    #[serde(default)]
    pub maker: Option<Account>,

    #[serde(default)]
    pub taker: Option<Account>,

    #[serde(default)]
    pub base_price: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct SalePayload {
    #[serde(flatten)]
    pub base: BasePayload,

    #[serde(default)]
    pub payment_token: Option<PaymentToken>,

    #[serde(default)]
    pub maker: Option<Account>,

    #[serde(default)]
    pub taker: Option<Account>,

    #[serde(default)]
    pub is_private: Option<bool>,

    #[serde(default)]
    pub sale_price: Option<String>,
}

impl SalePayload {
    pub fn is_private(&self) -> bool {
        self.is_private.unwrap_or(false)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct TransferPayload {
    #[serde(flatten)]
    pub base: BasePayload,

    #[serde(default)]
    pub from_account: Option<Account>,

    #[serde(default)]
    pub to_account: Option<Account>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct CancelPayload {
    #[serde(flatten)]
    pub base: BasePayload,

    #[serde(default)]
    pub listing_type: Option<ListingType>,
}

impl CancelPayload {
    /// Listing type, ignoring an empty string.
    pub fn listing_type(&self) -> Option<&ListingType> {
        self.listing_type
            .as_ref()
            .filter(|t| !matches!(t, ListingType::Other(other) if other.is_empty()))
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct MetadataPayload {
    #[serde(flatten)]
    pub base: BasePayload,

    #[serde(default)]
    pub description: Option<String>,
}

/// Payload of a priced trade: listing, offer, bid or sale.
pub trait TradePayload {
    fn base(&self) -> &BasePayload;

    fn payment_token(&self) -> Option<&PaymentToken>;

    /// Lister, bidder or offerer.
    fn maker(&self) -> Option<&Account>;

    /// Accepting party.
    fn taker(&self) -> Option<&Account>;

    /// Name of the raw price field this payload is quoted in.
    fn price_field(&self) -> &'static str;

    /// Raw fixed-point price.
    fn raw_price(&self) -> Option<&str>;
}

impl TradePayload for ListingPayload {
    fn base(&self) -> &BasePayload {
        &self.base
    }

    fn payment_token(&self) -> Option<&PaymentToken> {
        self.payment_token.as_ref()
    }

    fn maker(&self) -> Option<&Account> {
        self.maker.as_ref()
    }

    fn taker(&self) -> Option<&Account> {
        self.taker.as_ref()
    }

    fn price_field(&self) -> &'static str {
        "base_price"
    }

    fn raw_price(&self) -> Option<&str> {
        self.base_price.as_deref()
    }
}

impl TradePayload for OfferPayload {
    fn base(&self) -> &BasePayload {
        &self.base
    }

    fn payment_token(&self) -> Option<&PaymentToken> {
        self.payment_token.as_ref()
    }

    fn maker(&self) -> Option<&Account> {
        self.maker.as_ref()
    }

    fn taker(&self) -> Option<&Account> {
        self.taker.as_ref()
    }

    fn price_field(&self) -> &'static str {
        "base_price"
    }

    fn raw_price(&self) -> Option<&str> {
        self.base_price.as_deref()
    }
}

impl TradePayload for SalePayload {
    fn base(&self) -> &BasePayload {
        &self.base
    }

    fn payment_token(&self) -> Option<&PaymentToken> {
        self.payment_token.as_ref()
    }

    fn maker(&self) -> Option<&Account> {
        self.maker.as_ref()
    }

    fn taker(&self) -> Option<&Account> {
        self.taker.as_ref()
    }

    fn price_field(&self) -> &'static str {
        "sale_price"
    }

    fn raw_price(&self) -> Option<&str> {
        self.sale_price.as_deref()
    }
}

/// Event payload, one shape per [`EventKind`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Listed(ListingPayload),
    Cancelled(CancelPayload),
    MetadataUpdated(MetadataPayload),
    Sold(SalePayload),
    Transferred(TransferPayload),
    ReceivedBid(OfferPayload),
    ReceivedOffer(OfferPayload),
    Unknown(BasePayload),
}

impl Payload {
    pub fn kind(&self) -> EventKind {
        match self {
            Payload::Listed(_) => EventKind::ItemListed,
            Payload::Cancelled(_) => EventKind::ItemCancelled,
            Payload::MetadataUpdated(_) => EventKind::ItemMetadataUpdated,
            Payload::Sold(_) => EventKind::ItemSold,
            Payload::Transferred(_) => EventKind::ItemTransferred,
            Payload::ReceivedBid(_) => EventKind::ItemReceivedBid,
            Payload::ReceivedOffer(_) => EventKind::ItemReceivedOffer,
            Payload::Unknown(_) => EventKind::Unknown,
        }
    }

    pub fn base(&self) -> &BasePayload {
        match self {
            Payload::Listed(p) => &p.base,
            Payload::Cancelled(p) => &p.base,
            Payload::MetadataUpdated(p) => &p.base,
            Payload::Sold(p) => &p.base,
            Payload::Transferred(p) => &p.base,
            Payload::ReceivedBid(p) | Payload::ReceivedOffer(p) => &p.base,
            Payload::Unknown(p) => p,
        }
    }

    /// Decodes a raw JSON payload into the shape of the given kind.
    pub fn decode(kind: EventKind, value: serde_json::Value) -> Result<Self> {
        Ok(match kind {
            EventKind::ItemListed => Payload::Listed(decode(kind, value)?),
            EventKind::ItemCancelled => Payload::Cancelled(decode(kind, value)?),
            EventKind::ItemMetadataUpdated => Payload::MetadataUpdated(decode(kind, value)?),
            EventKind::ItemSold => Payload::Sold(decode(kind, value)?),
            EventKind::ItemTransferred => Payload::Transferred(decode(kind, value)?),
            EventKind::ItemReceivedBid => Payload::ReceivedBid(decode(kind, value)?),
            EventKind::ItemReceivedOffer => Payload::ReceivedOffer(decode(kind, value)?),
            EventKind::Unknown => Payload::Unknown(decode(kind, value)?),
        })
    }
}

fn decode<T: DeserializeOwned>(kind: EventKind, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| RenderError::Decode { kind, source })
}

/// Normalized marketplace event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    event_type: String,
    payload: Payload,
    timestamp: Option<String>,
}

impl Event {
    /// Builds an event from an already decoded payload. The raw event type
    /// defaults to the payload kind name.
    pub fn new(payload: Payload) -> Self {
        Self {
            event_type: payload.kind().as_str().to_string(),
            payload,
            timestamp: None,
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Parses and normalizes a single stream message.
    pub fn from_json(json: &str) -> Result<Self> {
        let message: StreamMessage = serde_json::from_str(json).map_err(|source| {
            RenderError::Decode {
                kind: EventKind::Unknown,
                source,
            }
        })?;
        Self::try_from(message)
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Event type string as received.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

impl TryFrom<StreamMessage> for Event {
    type Error = RenderError;

    fn try_from(message: StreamMessage) -> Result<Self> {
        let payload = Payload::decode(message.kind(), message.payload)?;
        Ok(Self {
            event_type: message.event_type,
            payload,
            timestamp: message.sent_at,
        })
    }
}
