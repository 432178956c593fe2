//! Background subscribe loop over the in-memory queue.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use queue_routing::bus::{InMemoryQueue, Subscribable};
use queue_routing::consumer;
use queue_routing::names::DELETE_GROUP;
use queue_routing::{Consumer, ConsumerBinding, HandlerError, RoutingConfig};
use serde_json::{json, Value};

use crate::support::{producer, service, Journal};

#[test]
fn subscribe_acks_handled_and_nacks_failures() {
    let queue = InMemoryQueue::new();
    let journal = Journal::default();
    let consumer = Arc::new(service(&journal));

    let subscriber = queue.new_subscriber();
    let handle = consumer::subscribe(
        consumer.clone(),
        subscriber.clone(),
        Duration::from_millis(10),
    );

    let producer = producer(&queue);
    producer
        .publish(Some("events"), "user.create", json!({ "id": 1 }))
        .unwrap();
    producer
        .queue("do.mail.send", json!({ "to": "a@b.com", "body": "hi" }))
        .unwrap();
    producer
        .publish(Some("events"), "user.delete", json!({ "id": 1 }))
        .unwrap();
    producer
        .publish(Some("events"), "random.unregistered.key", json!({}))
        .unwrap();
    producer.queue("do.sms.send", json!({})).unwrap();

    thread::sleep(Duration::from_millis(200));
    let stats = handle.stop();

    assert_eq!(stats.handled, 3);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.dead_lettered, 2);
    assert_eq!(stats.partial, 0);
    assert!(stats.polls >= 5);

    assert_eq!(subscriber.acknowledged(), vec!["d-1", "d-2", "d-3"]);
    let dead: Vec<String> = subscriber
        .dead_letters()
        .into_iter()
        .map(|(tag, _)| tag)
        .collect();
    assert_eq!(dead, vec!["d-4", "d-5"]);
    assert_eq!(journal.entries(), vec!["search:user.delete"]);
}

#[test]
fn partial_fan_out_is_still_acked() {
    let queue = InMemoryQueue::new();
    let bindings = RoutingConfig {
        bindings: vec![ConsumerBinding::exact("lo.delete", "lo-service")],
        ..RoutingConfig::default()
    };
    let mut routing = RoutingConfig::bundled()
        .unwrap()
        .merge(bindings)
        .build()
        .unwrap();
    routing.groups = routing
        .groups
        .on(DELETE_GROUP, "flaky", |_, _| {
            Err(HandlerError::Rejected("index down".into()))
        })
        .unwrap();
    let consumer =
        Arc::new(Consumer::from_routing(routing).handler("lo-service", |_| Ok(Value::Null)));

    let subscriber = queue.new_subscriber();
    let handle = consumer::subscribe(consumer, subscriber.clone(), Duration::from_millis(10));

    producer(&queue)
        .publish(Some("events"), "lo.delete", json!({ "id": 12 }))
        .unwrap();

    thread::sleep(Duration::from_millis(100));
    let stats = handle.stop();
    assert_eq!(stats.handled, 1);
    assert_eq!(stats.partial, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(subscriber.acknowledged(), vec!["d-1"]);
}

#[test]
fn stop_without_traffic() {
    let queue = InMemoryQueue::new();
    let handle = consumer::subscribe(
        Arc::new(service(&Journal::default())),
        queue.new_subscriber(),
        Duration::from_millis(5),
    );
    thread::sleep(Duration::from_millis(30));
    let stats = handle.stop();
    assert_eq!(stats.handled, 0);
    assert_eq!(stats.failed, 0);
}

#[test]
fn dead_lettered_delete_still_cleaned_up() {
    let queue = InMemoryQueue::new();
    let journal = Journal::default();
    let subscriber = queue.new_subscriber();
    let handle = consumer::subscribe(
        Arc::new(service(&journal)),
        subscriber.clone(),
        Duration::from_millis(10),
    );

    producer(&queue).queue("lo.delete", json!({ "id": 2 })).unwrap();

    thread::sleep(Duration::from_millis(100));
    let stats = handle.stop();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.dead_lettered, 1);
    assert_eq!(journal.entries(), vec!["search:lo.delete"]);
    assert!(subscriber.acknowledged().is_empty());
}
