//! Per-collection driver loop.
//!
//! A [`Dispatcher`] owns one collection subscription: it filters the incoming
//! [`StreamMessage`]s down to the collection and the subscribed event kinds,
//! checks the [`Switch`], renders and delivers. A failure to render or deliver
//! one event is logged and never stops the loop.
//!
//! [`route`] drives several dispatchers from one shared feed.

use std::pin::pin;

use futures::{SinkExt, Stream, StreamExt, channel::mpsc, future::join_all};
use tracing::{debug, info, warn};

use crate::{
    Collection,
    delivery::{Delivery, DeliveryError, DeliveryMode, Sender},
    error::RenderError,
    render,
    switch::Switch,
    types::{Event, EventKind, StreamMessage},
};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// What happened to a single message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Skipped(SkipReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Bot is switched off.
    Disabled,
    /// Event kind is not part of the subscription.
    NotSubscribed(EventKind),
    /// Event belongs to another collection.
    OtherCollection,
}

/// Counters of a finished [`Dispatcher::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Event loop of a single collection subscription.
#[derive(Debug)]
pub struct Dispatcher<'a, D, S> {
    collection: Collection,
    kinds: Vec<EventKind>,
    sender: Sender,
    mode: DeliveryMode,
    delivery: &'a D,
    switch: &'a S,
}

impl<'a, D: Delivery + Sync, S: Switch + Sync> Dispatcher<'a, D, S> {
    /// Dispatcher subscribed to [`EventKind::TRADE_ACTIVITY`], posting
    /// embeds under the default sender.
    pub fn new(collection: Collection, delivery: &'a D, switch: &'a S) -> Self {
        Self {
            collection,
            kinds: EventKind::TRADE_ACTIVITY.to_vec(),
            sender: Sender::default(),
            mode: DeliveryMode::default(),
            delivery,
            switch,
        }
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    pub fn with_sender(mut self, sender: Sender) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_mode(mut self, mode: DeliveryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    /// Renders and delivers a single message, unless it is filtered out.
    pub async fn handle(&self, message: StreamMessage) -> Result<Outcome, DispatchError> {
        if message
            .collection_slug()
            .is_some_and(|slug| slug != self.collection.slug())
        {
            return Ok(Outcome::Skipped(SkipReason::OtherCollection));
        }
        let kind = message.kind();
        if !self.kinds.contains(&kind) {
            return Ok(Outcome::Skipped(SkipReason::NotSubscribed(kind)));
        }
        if !self.switch.is_enabled().await {
            return Ok(Outcome::Skipped(SkipReason::Disabled));
        }

        let event = Event::try_from(message)?;
        let rendered = render::render(&event, &self.collection)?;
        self.delivery
            .deliver(self.sender.message(&rendered, self.mode))
            .await?;
        Ok(Outcome::Delivered)
    }

    /// Processes the stream until it ends.
    pub async fn run<St>(&self, messages: St) -> DispatchStats
    where
        St: Stream<Item = StreamMessage>,
    {
        let collection = self.collection.slug();
        info!(collection, kinds = ?self.kinds, "Dispatching collection events");

        let mut messages = pin!(messages);
        let mut stats = DispatchStats::default();
        while let Some(message) = messages.next().await {
            let event_type = message.event_type.clone();
            match self.handle(message).await {
                Ok(Outcome::Delivered) => {
                    stats.delivered += 1;
                    debug!(collection, %event_type, "Event delivered");
                }
                Ok(Outcome::Skipped(reason)) => {
                    stats.skipped += 1;
                    debug!(collection, %event_type, ?reason, "Event skipped");
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(collection, %event_type, error = %e, "Failed to dispatch event");
                }
            }
        }

        info!(
            collection,
            delivered = stats.delivered,
            skipped = stats.skipped,
            failed = stats.failed,
            "Event stream ended"
        );
        stats
    }
}

/// Messages buffered per dispatcher while it is busy delivering.
const ROUTE_BUFFER: usize = 64;

/// Index of the dispatcher a message belongs to.
///
/// A message without a collection slug only has an owner when there is a
/// single dispatcher.
fn route_index<D, S>(
    dispatchers: &[Dispatcher<'_, D, S>],
    message: &StreamMessage,
) -> Option<usize> {
    match message.collection_slug() {
        Some(slug) => dispatchers
            .iter()
            .position(|dispatcher| dispatcher.collection.slug() == slug),
        None if dispatchers.len() == 1 => Some(0),
        None => None,
    }
}

/// Runs `dispatchers` over one feed, handing every message to the
/// dispatcher of its collection as soon as it arrives.
///
/// Stops reading at the first feed error. The dispatchers still drain the
/// messages routed so far before the error is returned.
pub async fn route<D, S, St, E>(
    dispatchers: &[Dispatcher<'_, D, S>],
    messages: St,
) -> Result<Vec<DispatchStats>, E>
where
    D: Delivery + Sync,
    S: Switch + Sync,
    St: Stream<Item = Result<StreamMessage, E>>,
{
    let (senders, receivers): (Vec<_>, Vec<_>) = dispatchers
        .iter()
        .map(|_| mpsc::channel::<StreamMessage>(ROUTE_BUFFER))
        .unzip();

    let feed = async move {
        let mut senders = senders;
        let mut messages = pin!(messages);
        while let Some(message) = messages.next().await {
            let message = message?;
            let Some(index) = route_index(dispatchers, &message) else {
                match message.collection_slug() {
                    Some(slug) => debug!(slug, "Message of an unwatched collection"),
                    None => warn!(
                        event_type = %message.event_type,
                        "Dropping message without collection slug"
                    ),
                }
                continue;
            };
            if senders[index].send(message).await.is_err() {
                warn!(index, "Dispatcher stopped accepting messages");
            }
        }
        Ok::<(), E>(())
    };
    let runs = join_all(
        dispatchers
            .iter()
            .zip(receivers)
            .map(|(dispatcher, receiver)| dispatcher.run(receiver)),
    );

    let (fed, stats) = futures::join!(feed, runs);
    fed.map(|()| stats)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::stream;
    use serde_json::json;

    use super::*;
    use crate::{
        delivery::{MemoryDelivery, WebhookMessage},
        switch::MemorySwitch,
    };

    fn message(event_type: &str, slug: &str, token: u32) -> StreamMessage {
        StreamMessage {
            event_type: event_type.to_string(),
            sent_at: None,
            payload: json!({
                "item": {
                    "nft_id": format!("ethereum/0xc0ffee/{token}"),
                    "permalink": format!("https://opensea.io/assets/ethereum/0xc0ffee/{token}"),
                },
                "collection": {"slug": slug},
                "base_price": "1000000",
                "sale_price": "1000000",
                "payment_token": {"symbol": "USDC", "decimals": 6, "usd_price": "1"},
                "maker": {"address": "0xmaker"},
                "taker": {"address": "0xtaker"},
            }),
        }
    }

    /// Rejects every other message.
    #[derive(Default)]
    struct FlakyDelivery {
        calls: AtomicUsize,
        inner: MemoryDelivery,
    }

    impl Delivery for FlakyDelivery {
        async fn deliver(&self, message: WebhookMessage) -> Result<(), DeliveryError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
                return Err(DeliveryError::Rejected("rate limited".to_string()));
            }
            self.inner.deliver(message).await
        }
    }

    #[tokio::test]
    async fn test_handle_outcomes() {
        let delivery = MemoryDelivery::new();
        let switch = MemorySwitch::default();
        let dispatcher = Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch);

        assert_eq!(
            dispatcher
                .handle(message("item_sold", "cool-cats", 1))
                .await
                .unwrap(),
            Outcome::Delivered
        );
        assert_eq!(
            dispatcher
                .handle(message("item_sold", "doodles", 1))
                .await
                .unwrap(),
            Outcome::Skipped(SkipReason::OtherCollection)
        );
        assert_eq!(
            dispatcher
                .handle(message("item_metadata_updated", "cool-cats", 1))
                .await
                .unwrap(),
            Outcome::Skipped(SkipReason::NotSubscribed(EventKind::ItemMetadataUpdated))
        );

        switch.set_enabled(false).await;
        assert_eq!(
            dispatcher
                .handle(message("item_sold", "cool-cats", 1))
                .await
                .unwrap(),
            Outcome::Skipped(SkipReason::Disabled)
        );

        assert_eq!(delivery.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_handle_propagates_render_error() {
        let delivery = MemoryDelivery::new();
        let switch = MemorySwitch::default();
        let dispatcher = Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch);

        let mut broken = message("item_listed", "cool-cats", 1);
        broken.payload["base_price"] = serde_json::Value::Null;
        assert!(matches!(
            dispatcher.handle(broken).await,
            Err(DispatchError::Render(RenderError::MalformedPayload {
                field: "base_price"
            }))
        ));
        assert!(delivery.messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_continues_after_failures() {
        let delivery = MemoryDelivery::new();
        let switch = MemorySwitch::default();
        let dispatcher = Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch)
            .with_mode(DeliveryMode::Text);

        let mut broken = message("item_listed", "cool-cats", 2);
        broken.payload.as_object_mut().unwrap().remove("item");
        let messages = vec![
            message("item_listed", "cool-cats", 1),
            broken,
            message("item_metadata_updated", "cool-cats", 3),
            message("item_sold", "cool-cats", 4),
        ];

        let stats = dispatcher.run(stream::iter(messages)).await;
        assert_eq!(
            stats,
            DispatchStats {
                delivered: 2,
                skipped: 1,
                failed: 1,
            }
        );

        let contents: Vec<_> = delivery
            .messages()
            .await
            .into_iter()
            .filter_map(|m| m.content)
            .collect();
        assert_eq!(
            contents,
            [
                "Token #1 listed for $1.00 by Owner 0xmaker",
                "Token #4 sold to 0xtaker for $1.00",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_counts_delivery_failures() {
        let delivery = FlakyDelivery::default();
        let switch = MemorySwitch::default();
        let dispatcher = Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch);

        let messages = (1..=4).map(|token| message("item_sold", "cool-cats", token));
        let stats = dispatcher.run(stream::iter(messages)).await;
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(delivery.inner.messages().await.len(), 2);
    }

    #[tokio::test]
    async fn test_custom_kinds_and_sender() {
        let delivery = MemoryDelivery::new();
        let switch = MemorySwitch::default();
        let dispatcher = Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch)
            .with_kinds([EventKind::ItemMetadataUpdated, EventKind::Unknown])
            .with_sender(Sender::new("Cat Watch", None));
        assert_eq!(
            dispatcher.kinds(),
            [EventKind::ItemMetadataUpdated, EventKind::Unknown]
        );

        let messages = vec![
            message("item_sold", "cool-cats", 1),
            message("item_metadata_updated", "cool-cats", 2),
            message("collection_offer", "cool-cats", 3),
        ];
        let stats = dispatcher.run(stream::iter(messages)).await;
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.skipped, 1);

        let delivered = delivery.messages().await;
        assert!(delivered.iter().all(|m| m.username == "Cat Watch"));
        assert_eq!(
            delivered[1].embeds[0].author.name,
            "Activity: cool cats #3"
        );
    }
}
