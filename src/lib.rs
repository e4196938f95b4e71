//! Marketplace activity notifications.
//!
//! # Overview
//!
//! Turns marketplace activity events (listings, offers, bids, sales,
//! transfers, cancellations) for watched collections into chat notifications.
//!
//! Raw [`types::StreamMessage`]s are normalized into [`types::Event`]s,
//! [`render::classify`] picks the renderer for the event kind and
//! [`render::render`] produces a [`render::RenderedMessage`] carrying both a
//! structured embed and a plain-text summary. Prices are computed from raw
//! fixed-point token amounts by [`num`] with exact decimal arithmetic.
//!
//! [`dispatch::Dispatcher`] is the driver loop: it consumes one collection's
//! event stream, consults the [`switch::Switch`] and hands rendered messages
//! to a [`delivery::Delivery`]. [`dispatch::route`] feeds several
//! dispatchers from one live [`feed`] of newline-delimited JSON messages.
//!
//! # Limitations/follow-ups
//!
//! * Only USD is supported as the fiat currency.
//!
//! * The stream subscription itself and webhook transport are left to the
//!   embedding application, [`delivery::StdoutDelivery`] only writes the
//!   webhook documents out.

pub mod collection;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod num;
pub mod render;
pub mod switch;
pub mod types;

pub use collection::Collection;
