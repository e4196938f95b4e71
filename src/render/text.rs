//! One-line plain-text summaries.

use super::line::address;
use crate::{
    Collection,
    error::Result,
    num::PriceQuote,
    types::{
        BasePayload, Event, ListingPayload, OfferPayload, SalePayload, TradePayload,
        TransferPayload,
    },
};

/// `" for N items"` suffix.
fn for_items(quantity: u64) -> String {
    if quantity > 1 {
        format!(" for {quantity} items")
    } else {
        String::new()
    }
}

/// `"N items of "` prefix.
fn items_of(quantity: u64) -> String {
    if quantity > 1 {
        format!("{quantity} items of ")
    } else {
        String::new()
    }
}

fn token_id(base: &BasePayload) -> Result<&str> {
    Ok(base.item()?.token_id())
}

pub(super) fn listed(payload: &ListingPayload, quote: &PriceQuote) -> Result<String> {
    Ok(format!(
        "Token #{} listed for {} by Owner {}{}",
        token_id(&payload.base)?,
        quote.fiat_formatted(),
        address(payload.maker()),
        for_items(payload.base.quantity()),
    ))
}

pub(super) fn received_offer(payload: &OfferPayload, quote: &PriceQuote) -> Result<String> {
    Ok(format!(
        "Token #{} received an offer for {} from {}{}",
        token_id(&payload.base)?,
        quote.fiat_formatted(),
        address(payload.maker()),
        for_items(payload.base.quantity()),
    ))
}

pub(super) fn received_bid(payload: &OfferPayload, quote: &PriceQuote) -> Result<String> {
    Ok(format!(
        "Token #{} received a bid for {} from {}{}",
        token_id(&payload.base)?,
        quote.fiat_formatted(),
        address(payload.maker()),
        for_items(payload.base.quantity()),
    ))
}

pub(super) fn sold(payload: &SalePayload, quote: &PriceQuote) -> Result<String> {
    Ok(format!(
        "{}Token #{} sold to {} for {}{}",
        items_of(payload.base.quantity()),
        token_id(&payload.base)?,
        address(payload.taker()),
        quote.fiat_formatted(),
        if payload.is_private() {
            " in a private sale"
        } else {
            ""
        },
    ))
}

pub(super) fn transferred(payload: &TransferPayload) -> Result<String> {
    Ok(format!(
        "{}Token #{} transferred from {} to {}",
        items_of(payload.base.quantity()),
        token_id(&payload.base)?,
        address(payload.from_account.as_ref()),
        address(payload.to_account.as_ref()),
    ))
}

pub(super) fn cancelled(base: &BasePayload) -> Result<String> {
    Ok(format!("Order for Token #{} cancelled.", token_id(base)?))
}

pub(super) fn metadata_updated(base: &BasePayload) -> Result<String> {
    Ok(format!("Metadata updated for Token #{}", token_id(base)?))
}

pub(super) fn unknown(event: &Event, collection: &Collection) -> String {
    format!("{} {}", collection.slug(), event.event_type())
}
