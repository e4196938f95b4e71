//! Per-kind renderers.

use super::{BodyLine, Color, PriceField, RenderedMessage, line, text};
use crate::{
    Collection,
    error::{RenderError, Result},
    num::PriceQuote,
    types::{Event, EventKind, Item, ListingPayload, ListingType, Payload, TradePayload},
};

/// Metadata name, or `{collection display name} #{token id}`.
pub(super) fn display_name(item: &Item, collection: &Collection) -> String {
    match item.name() {
        Some(name) => name.to_string(),
        None => format!("{} #{}", collection.display_name(), item.token_id()),
    }
}

fn mismatch(expected: EventKind, event: &Event) -> RenderError {
    RenderError::KindMismatch {
        expected,
        actual: event.kind(),
    }
}

/// Message with the title, link and thumbnail of the item, nothing else.
fn base(item: &Item, name: &str, title: &str) -> RenderedMessage {
    RenderedMessage {
        title: format!("{title}: {name}"),
        url: item.permalink.clone(),
        thumbnail_url: item.image_url().map(str::to_string),
        body: Vec::new(),
        price: None,
        color: Color::Default,
        plain_text: String::new(),
    }
}

/// Message with the title and the linked name line.
fn named(item: &Item, collection: &Collection, title: &str) -> RenderedMessage {
    let name = display_name(item, collection);
    let mut message = base(item, &name, title);
    message
        .body
        .push(BodyLine::linked("Name", name, item.permalink.as_str()));
    message
}

fn quote<T: TradePayload>(payload: &T) -> Result<PriceQuote> {
    let raw = payload
        .raw_price()
        .ok_or(RenderError::MalformedPayload {
            field: payload.price_field(),
        })?;
    let token = payload
        .payment_token()
        .ok_or(RenderError::MalformedPayload {
            field: "payment_token",
        })?;
    let decimals = token.decimals.ok_or(RenderError::MalformedPayload {
        field: "payment_token.decimals",
    })?;
    let rate = token
        .usd_price
        .as_deref()
        .ok_or(RenderError::MalformedPayload {
            field: "payment_token.usd_price",
        })?;
    Ok(PriceQuote::new(raw, decimals, rate, token.symbol.as_str())?)
}

/// Listing, offer, bid and sale messages share the owner/winner lines and
/// the price field.
fn trade<T: TradePayload>(
    payload: &T,
    collection: &Collection,
    title: &str,
    price_label: &'static str,
    color: Color,
) -> Result<(RenderedMessage, PriceQuote)> {
    let item = payload.base().item()?;
    let quote = quote(payload)?;

    let mut message = named(item, collection, title);
    message.body.extend(line::OWNER.render(payload.maker()));
    message.body.extend(line::WINNER.render(payload.taker()));
    message.price = Some(PriceField {
        label: price_label,
        value: quote.to_string(),
    });
    message.color = color;
    Ok((message, quote))
}

/// Auction type takes precedence over the private marker.
fn listing_prefix(payload: &ListingPayload) -> &'static str {
    match payload.listing_type {
        Some(ListingType::Dutch) => "Dutch Auction ",
        Some(ListingType::English) => "English Auction ",
        _ if payload.is_private() => "Private ",
        _ => "",
    }
}

pub(super) fn listing(event: &Event, collection: &Collection) -> Result<RenderedMessage> {
    let Payload::Listed(payload) = event.payload() else {
        return Err(mismatch(EventKind::ItemListed, event));
    };
    let title = format!("{}Listing Created", listing_prefix(payload));
    let (mut message, quote) = trade(payload, collection, &title, "Listed for", Color::Aqua)?;
    message.plain_text = text::listed(payload, &quote)?;
    Ok(message)
}

pub(super) fn offer(event: &Event, collection: &Collection) -> Result<RenderedMessage> {
    let Payload::ReceivedOffer(payload) = event.payload() else {
        return Err(mismatch(EventKind::ItemReceivedOffer, event));
    };
    let (mut message, quote) = trade(
        payload,
        collection,
        "Offer",
        "Offer Amount",
        Color::LuminousVividPink,
    )?;
    message.plain_text = text::received_offer(payload, &quote)?;
    Ok(message)
}

pub(super) fn bid(event: &Event, collection: &Collection) -> Result<RenderedMessage> {
    let Payload::ReceivedBid(payload) = event.payload() else {
        return Err(mismatch(EventKind::ItemReceivedBid, event));
    };
    let (mut message, quote) = trade(payload, collection, "Bid", "Offer Amount", Color::Yellow)?;
    message.plain_text = text::received_bid(payload, &quote)?;
    Ok(message)
}

pub(super) fn sale(event: &Event, collection: &Collection) -> Result<RenderedMessage> {
    let Payload::Sold(payload) = event.payload() else {
        return Err(mismatch(EventKind::ItemSold, event));
    };
    let (mut message, quote) = trade(payload, collection, "Sold", "Sold Amount", Color::Green)?;
    message.plain_text = text::sold(payload, &quote)?;
    Ok(message)
}

pub(super) fn transfer(event: &Event, collection: &Collection) -> Result<RenderedMessage> {
    let Payload::Transferred(payload) = event.payload() else {
        return Err(mismatch(EventKind::ItemTransferred, event));
    };
    let item = payload.base.item()?;

    let mut message = named(item, collection, "Transferred");
    message
        .body
        .extend(line::FROM.render(payload.from_account.as_ref()));
    message.body.extend(line::TO.render(payload.to_account.as_ref()));
    message.color = Color::Red;
    message.plain_text = text::transferred(payload)?;
    Ok(message)
}

pub(super) fn cancelled(event: &Event, collection: &Collection) -> Result<RenderedMessage> {
    let Payload::Cancelled(payload) = event.payload() else {
        return Err(mismatch(EventKind::ItemCancelled, event));
    };
    let item = payload.base.item()?;
    let title = match payload.listing_type() {
        Some(listing_type) => format!("Cancelled {listing_type}"),
        None => "Cancelled".to_string(),
    };

    let mut message = named(item, collection, &title);
    message.color = Color::Fuchsia;
    message.plain_text = text::cancelled(&payload.base)?;
    Ok(message)
}

/// Embed of the fallback renderer, with the metadata summary as plain text.
pub(super) fn metadata_updated(event: &Event, collection: &Collection) -> Result<RenderedMessage> {
    let Payload::MetadataUpdated(payload) = event.payload() else {
        return Err(mismatch(EventKind::ItemMetadataUpdated, event));
    };
    let mut message = fallback(event, collection)?;
    message.plain_text = text::metadata_updated(&payload.base)?;
    Ok(message)
}

/// Item link and thumbnail under a generic title. Accepts any event kind.
///
/// Needs the item like every other renderer, so an unknown event without one
/// fails even though its plain text would not use it.
pub(super) fn fallback(event: &Event, collection: &Collection) -> Result<RenderedMessage> {
    let item = event.payload().base().item()?;
    let name = display_name(item, collection);

    let mut message = base(item, &name, "Activity");
    message.plain_text = text::unknown(event, collection);
    Ok(message)
}
