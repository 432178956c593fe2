//! Publish a few frames through the in-memory queue and consume them.
//!
//! ```text
//! RUST_LOG=debug cargo run --example worker_roundtrip
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use queue_routing::bus::{InMemoryQueue, Producer, Subscribable};
use queue_routing::consumer::{self, Consumer};
use queue_routing::names::DELETE_GROUP;
use queue_routing::{ConsumerBinding, RoutingConfig};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let service = RoutingConfig {
        bindings: vec![
            ConsumerBinding::exact("user.create", "user-service"),
            ConsumerBinding::exact("portal.delete", "portal-service"),
        ],
        ..RoutingConfig::default()
    };
    let routing = RoutingConfig::bundled()?.merge(service).build()?;

    let queue = InMemoryQueue::new();
    let producer = Producer::new(routing.builder.clone(), queue.clone());

    let groups = routing.groups.on(DELETE_GROUP, "search-index", |member, body| {
        println!("search-index: drop {member} {body}");
        Ok(())
    })?;
    let consumer = Consumer::new(routing.resolver, groups)
        .handler("user-service", |ctx| {
            println!("user-service: {} {}", ctx.routing_key(), ctx.raw_body());
            Ok(json!({ "ok": true }))
        })
        .handler("portal-service", |ctx| {
            println!("portal-service: {}", ctx.routing_key());
            Ok(json!({ "ok": true }))
        })
        .handler("mail.send", |ctx| {
            println!("mail.send (async={}): {}", ctx.is_async(), ctx.raw_body());
            Ok(json!({ "queued": true }))
        });

    let subscriber = queue.new_subscriber();
    let handle = consumer::subscribe(Arc::new(consumer), subscriber.clone(), Duration::from_millis(10));

    producer.publish(Some("events"), "user.create", json!({ "id": 1, "mail": "a@b.com" }))?;
    producer.queue("do.mail.send", json!({ "to": "a@b.com", "body": "welcome" }))?;
    producer.publish(Some("events"), "portal.delete", json!({ "id": 42 }))?;
    producer.publish(Some("events"), "random.unregistered.key", json!({}))?;

    thread::sleep(Duration::from_millis(200));
    let stats = handle.stop();
    println!("{stats:?}");
    for (tag, reason) in subscriber.dead_letters() {
        println!("dead-lettered {tag}: {reason}");
    }
    Ok(())
}
