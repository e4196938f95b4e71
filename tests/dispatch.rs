use std::{convert::Infallible, io, time::Duration};

use futures::{StreamExt, channel::mpsc, stream};
use nft_notify::{
    Collection,
    delivery::{Delivery, DeliveryMode, MemoryDelivery, Sender, WriterDelivery},
    dispatch::{self, DispatchStats, Dispatcher},
    feed,
    switch::{MemorySwitch, Switch},
    types::StreamMessage,
};
use serde_json::{Value, json};

fn message_json(event_type: &str, slug: &str, token: u32, quantity: u64) -> Value {
    json!({
        "event_type": event_type,
        "sent_at": "2022-10-18T12:00:00Z",
        "payload": {
            "item": {
                "nft_id": format!("ethereum/0xc0ffee/{token}"),
                "permalink": format!("https://opensea.io/assets/ethereum/0xc0ffee/{token}"),
                "metadata": {"image_url": format!("https://img.example/{token}.png")},
            },
            "collection": {"slug": slug},
            "base_price": "100000000000000000",
            "sale_price": "100000000000000000",
            "payment_token": {"symbol": "ETH", "decimals": 18, "usd_price": "3086.3"},
            "maker": {"address": "0xmaker"},
            "taker": {"address": "0xtaker"},
            "from_account": {"address": "0xfrom"},
            "to_account": {"address": "0xto"},
            "quantity": quantity,
        },
    })
}

fn message(event_type: &str, slug: &str, token: u32, quantity: u64) -> StreamMessage {
    serde_json::from_value(message_json(event_type, slug, token, quantity)).unwrap()
}

fn stream_messages() -> Vec<StreamMessage> {
    vec![
        message("item_received_offer", "cool-cats", 1, 1),
        message("item_received_bid", "cool-cats", 2, 2),
        message("item_received_offer", "doodles", 3, 1),
        message("item_transferred", "cool-cats", 4, 5),
        message("item_metadata_updated", "cool-cats", 5, 1),
    ]
}

#[tokio::test]
async fn test_text_summaries_of_one_collection() {
    let delivery = MemoryDelivery::new();
    let switch = MemorySwitch::default();
    let dispatcher = Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch)
        .with_mode(DeliveryMode::Text);

    let stats = dispatcher.run(stream::iter(stream_messages())).await;
    assert_eq!(
        stats,
        DispatchStats {
            delivered: 3,
            skipped: 2,
            failed: 0,
        }
    );

    let contents: Vec<_> = delivery
        .messages()
        .await
        .into_iter()
        .map(|m| m.content.unwrap())
        .collect();
    assert_eq!(
        contents,
        [
            "Token #1 received an offer for $308.63 from 0xmaker",
            "Token #2 received a bid for $308.63 from 0xmaker for 2 items",
            "5 items of Token #4 transferred from 0xfrom to 0xto",
        ]
    );
}

#[tokio::test]
async fn test_collections_share_delivery() {
    let delivery = WriterDelivery::new(Vec::<u8>::new());
    let switch = MemorySwitch::default();
    let sender = Sender::new("Cat Watch", None);
    let dispatchers = [
        Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch)
            .with_sender(sender.clone()),
        Dispatcher::new(Collection::new("doodles"), &delivery, &switch).with_sender(sender),
    ];

    let stats = futures::future::join_all(
        dispatchers
            .iter()
            .map(|d| d.run(stream::iter(stream_messages()))),
    )
    .await;
    assert_eq!(stats[0].delivered, 3);
    assert_eq!(stats[1].delivered, 1);
    drop(dispatchers);

    let written = String::from_utf8(delivery.into_inner()).unwrap();
    let messages: Vec<Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(messages.len(), 4);
    assert!(messages.iter().all(|m| m["username"] == "Cat Watch"));

    let doodles = messages
        .iter()
        .find(|m| m["embeds"][0]["url"] == "https://opensea.io/assets/ethereum/0xc0ffee/3")
        .unwrap();
    assert_eq!(
        doodles["embeds"][0],
        json!({
            "author": {
                "name": "Offer: doodles #3",
                "url": "https://opensea.io/assets/ethereum/0xc0ffee/3",
            },
            "url": "https://opensea.io/assets/ethereum/0xc0ffee/3",
            "thumbnail": {"url": "https://img.example/3.png"},
            "description": "[**Name:** doodles #3](https://opensea.io/assets/ethereum/0xc0ffee/3)\n**Owner:** 0xmaker\n**Winner:** 0xtaker",
            "color": 0xE91E63,
            "fields": [{
                "name": "Offer Amount",
                "value": "0.1 ETH / $308.63 USD",
                "inline": false,
            }],
        })
    );
}

#[tokio::test]
async fn test_disabled_switch_skips_everything() {
    let delivery = MemoryDelivery::new();
    let switch = MemorySwitch::new(false);
    let dispatcher = Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch);

    let stats = dispatcher.run(stream::iter(stream_messages())).await;
    assert_eq!(stats.delivered, 0);
    assert_eq!(stats.skipped, 5);

    switch.set_enabled(true).await;
    let stats = dispatcher.run(stream::iter(stream_messages())).await;
    assert_eq!(stats.delivered, 3);
    assert_eq!(delivery.messages().await.len(), 3);
}

#[tokio::test]
async fn test_memory_delivery_is_a_delivery() {
    let delivery = MemoryDelivery::new();
    tokio_test::assert_ok!(
        delivery
            .deliver(nft_notify::delivery::WebhookMessage {
                username: "Cat Watch".to_string(),
                avatar_url: None,
                content: Some("hello".to_string()),
                embeds: vec![],
            })
            .await
    );
}

fn without_slug(event_type: &str, token: u32) -> StreamMessage {
    let mut message = message(event_type, "cool-cats", token, 1);
    message.payload.as_object_mut().unwrap().remove("collection");
    message
}

fn infallible(
    messages: Vec<StreamMessage>,
) -> impl futures::Stream<Item = Result<StreamMessage, Infallible>> {
    stream::iter(messages.into_iter().map(Ok))
}

#[tokio::test]
async fn test_route_hands_messages_to_their_collection() {
    let delivery = MemoryDelivery::new();
    let switch = MemorySwitch::default();
    let dispatchers = [
        Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch)
            .with_mode(DeliveryMode::Text),
        Dispatcher::new(Collection::new("doodles"), &delivery, &switch)
            .with_mode(DeliveryMode::Text),
    ];

    let mut messages = stream_messages();
    messages.push(message("item_received_offer", "azuki", 6, 1));
    let stats = dispatch::route(&dispatchers, infallible(messages))
        .await
        .unwrap();

    // Routed messages never show up as another collection's skips.
    assert_eq!(
        stats,
        [
            DispatchStats {
                delivered: 3,
                skipped: 1,
                failed: 0,
            },
            DispatchStats {
                delivered: 1,
                skipped: 0,
                failed: 0,
            },
        ]
    );
    assert_eq!(delivery.messages().await.len(), 4);
}

#[tokio::test]
async fn test_route_drops_slugless_message_among_several_collections() {
    let delivery = MemoryDelivery::new();
    let switch = MemorySwitch::default();
    let dispatchers = [
        Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch),
        Dispatcher::new(Collection::new("doodles"), &delivery, &switch),
    ];

    let stats = dispatch::route(&dispatchers, infallible(vec![without_slug("item_sold", 1)]))
        .await
        .unwrap();
    assert!(stats.iter().all(|s| *s == DispatchStats::default()));
    assert!(delivery.messages().await.is_empty());
}

#[tokio::test]
async fn test_route_gives_slugless_message_to_single_collection() {
    let delivery = MemoryDelivery::new();
    let switch = MemorySwitch::default();
    let dispatchers = [Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch)
        .with_mode(DeliveryMode::Text)];

    let stats = dispatch::route(&dispatchers, infallible(vec![without_slug("item_sold", 1)]))
        .await
        .unwrap();
    assert_eq!(stats[0].delivered, 1);
    assert_eq!(
        delivery.messages().await[0].content.as_deref(),
        Some("Token #1 sold to 0xtaker for $308.63")
    );
}

#[tokio::test]
async fn test_route_delivers_before_feed_ends() {
    let delivery = MemoryDelivery::new();
    let switch = MemorySwitch::default();
    let dispatchers = [Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch)];
    let (tx, rx) = mpsc::unbounded();

    let watcher = {
        let delivery = &delivery;
        async move {
            tx.unbounded_send(message("item_sold", "cool-cats", 1, 1))
                .unwrap();
            while delivery.messages().await.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            // Feed closes only once the first message went out.
            drop(tx);
        }
    };
    let routing = dispatch::route(&dispatchers, rx.map(Ok::<_, Infallible>));

    let (stats, ()) = tokio::time::timeout(Duration::from_secs(5), async {
        futures::join!(routing, watcher)
    })
    .await
    .unwrap();
    assert_eq!(stats.unwrap()[0].delivered, 1);
}

#[tokio::test]
async fn test_route_stops_at_feed_error() {
    let delivery = MemoryDelivery::new();
    let switch = MemorySwitch::default();
    let dispatchers = [Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch)];

    let messages = stream::iter([
        Ok(message("item_sold", "cool-cats", 1, 1)),
        Err(io::Error::other("connection reset")),
        Ok(message("item_sold", "cool-cats", 2, 1)),
    ]);
    let err = dispatch::route(&dispatchers, messages).await.unwrap_err();
    assert_eq!(err.to_string(), "connection reset");
    assert_eq!(delivery.messages().await.len(), 1);
}

#[tokio::test]
async fn test_route_feed_skips_invalid_lines() {
    let delivery = MemoryDelivery::new();
    let switch = MemorySwitch::default();
    let dispatchers = [Dispatcher::new(Collection::new("cool-cats"), &delivery, &switch)
        .with_mode(DeliveryMode::Text)];

    let line = |token| serde_json::to_vec(&message_json("item_sold", "cool-cats", token, 1)).unwrap();
    let mut input = line(1);
    input.extend_from_slice(b"\n\xff\xfe garbage\n");
    input.extend(line(2));
    input.push(b'\n');

    let stats = dispatch::route(&dispatchers, feed::messages(input.as_slice()))
        .await
        .unwrap();
    assert_eq!(stats[0].delivered, 2);
    let contents: Vec<_> = delivery
        .messages()
        .await
        .into_iter()
        .map(|m| m.content.unwrap())
        .collect();
    assert_eq!(
        contents,
        [
            "Token #1 sold to 0xtaker for $308.63",
            "Token #2 sold to 0xtaker for $308.63",
        ]
    );
}
