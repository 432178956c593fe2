//! Synchronous consume path.

use queue_routing::consumer::ConsumeError;
use queue_routing::{Category, Delivery, Frame, HandlerError, HandlerRef, RoutingError};
use serde_json::json;

use crate::support::{service, Journal};

#[test]
fn exact_event_reaches_bound_handler() {
    let consumer = service(&Journal::default());
    let outcome = consumer
        .consume(&Frame::direct("events", "user.create", json!({ "id": 1, "mail": "a@b.com" })))
        .unwrap();

    assert_eq!(outcome.handler, HandlerRef::new("user-service"));
    assert_eq!(outcome.response, json!({ "event": "user.create", "id": 1 }));
    assert_eq!(outcome.target.delivery, Delivery::Direct);
    assert!(outcome.fan_out.is_empty());
}

#[test]
fn worker_command_reaches_service_named_by_remainder() {
    let consumer = service(&Journal::default());
    let outcome = consumer
        .consume(&Frame::worker(
            "do.mail.send",
            json!({ "to": "a@b.com", "body": "hi" }),
        ))
        .unwrap();

    assert_eq!(outcome.handler, HandlerRef::new("mail.send"));
    assert_eq!(outcome.response, json!({ "sent_to": "a@b.com", "length": 2 }));
    assert_eq!(outcome.target.delivery, Delivery::Worker);
    assert_eq!(outcome.target.category, Some(Category::CommandDo));
}

#[test]
fn typed_input_decode_failure() {
    let consumer = service(&Journal::default());
    let err = consumer
        .consume(&Frame::worker("do.mail.send", json!({ "to": 5 })))
        .unwrap_err();
    assert!(matches!(
        err,
        ConsumeError::Handler {
            source: HandlerError::DecodeFailed(_),
            ..
        }
    ));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn delete_event_fans_out_to_group() {
    let journal = Journal::default();
    let consumer = service(&journal);

    let outcome = consumer
        .consume(&Frame::direct("events", "user.delete", json!({ "id": 4 })))
        .unwrap();

    assert_eq!(journal.entries(), vec!["search:user.delete"]);
    assert_eq!(outcome.fan_out.len(), 1);
    assert_eq!(outcome.fan_out[0].group, "delete");
    assert!(outcome.failed_group_handlers().is_empty());
}

#[test]
fn rejected_delete_still_runs_cleanup() {
    let journal = Journal::default();
    let consumer = service(&journal);

    let err = consumer
        .consume(&Frame::direct("events", "user.delete", json!({ "name": "no id" })))
        .unwrap_err();

    assert!(matches!(
        err,
        ConsumeError::Handler {
            source: HandlerError::Rejected(_),
            ..
        }
    ));
    assert_eq!(journal.entries(), vec!["search:user.delete"]);
    assert_eq!(err.fan_out().len(), 1);
    assert_eq!(err.fan_out()[0].member, "user.delete");
}

#[test]
fn unbound_delete_still_runs_cleanup() {
    let journal = Journal::default();
    let consumer = service(&journal);

    let err = consumer
        .consume(&Frame::worker("lo.delete", json!({ "id": 8 })))
        .unwrap_err();

    assert!(matches!(
        err,
        ConsumeError::Routing {
            source: RoutingError::Unroutable(_),
            ..
        }
    ));
    assert!(err.should_dead_letter());
    assert_eq!(journal.entries(), vec!["search:lo.delete"]);
    assert_eq!(err.fan_out()[0].group, "delete");
}

#[test]
fn notify_task_validated_and_dispatched() {
    let journal = Journal::default();
    let consumer = service(&journal);

    let outcome = consumer
        .consume(&Frame::worker(
            "do.notify",
            json!({ "task": "notify.portal.user_plan_reached", "body": { "portal": 1 } }),
        ))
        .unwrap();
    assert_eq!(outcome.handler, HandlerRef::new("notifier"));
    assert_eq!(
        outcome.response,
        json!({ "task": "notify.portal.user_plan_reached" })
    );
    assert_eq!(journal.entries(), vec!["plans:notify.portal.user_plan_reached"]);

    let err = consumer
        .consume(&Frame::worker(
            "do.notify",
            json!({ "task": "notify.portal.bogus", "body": {} }),
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        ConsumeError::Routing {
            source: RoutingError::GroupMembershipViolation { .. },
            ..
        }
    ));
    assert!(err.fan_out().is_empty());
    assert_eq!(journal.entries().len(), 1);
}

#[test]
fn unroutable_frame_is_dead_lettered() {
    let consumer = service(&Journal::default());
    let err = consumer
        .consume(&Frame::direct("events", "random.unregistered.key", json!({})))
        .unwrap_err();
    assert!(matches!(
        err,
        ConsumeError::Routing {
            source: RoutingError::Unroutable(_),
            ..
        }
    ));
    assert!(err.should_dead_letter());
    assert_eq!(err.status_code(), 404);
}

#[test]
fn on_frame_received_only_resolves() {
    let journal = Journal::default();
    let consumer = service(&journal);
    let target = consumer
        .on_frame_received(&Frame::direct("events", "user.delete", json!({ "id": 4 })))
        .unwrap();
    assert_eq!(target.route.handler(), HandlerRef::new("user-service"));
    assert!(journal.entries().is_empty());
}

#[test]
fn handler_panic_is_contained() {
    let consumer = service(&Journal::default()).handler("crash", |_| panic!("bad state"));
    let err = consumer
        .consume(&Frame::worker("do.crash", json!({})))
        .unwrap_err();
    assert!(matches!(
        err,
        ConsumeError::Handler {
            source: HandlerError::Panicked(_),
            ..
        }
    ));
}
