//! Closed groups: membership, best-effort fan-out and task validation.

use std::sync::{Arc, Mutex};

use queue_routing::names::{DELETE_GROUP, DO_NOTIFY, NOTIFY_GROUP};
use queue_routing::{GroupDispatcher, HandlerError, HandlerRef, RoutingConfig, RoutingError};
use serde_json::json;

fn bundled_groups() -> GroupDispatcher {
    RoutingConfig::bundled().unwrap().build().unwrap().groups
}

#[test]
fn deletion_group_membership() {
    let groups = bundled_groups();
    assert!(groups.is_member(DELETE_GROUP, "portal.delete"));
    assert!(groups.is_member(DELETE_GROUP, "enrolment.delete"));
    assert!(!groups.is_member(DELETE_GROUP, "portal.create"));
    assert!(!groups.is_member("no-such-group", "portal.delete"));
}

#[test]
fn fan_out_continues_past_failures() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let (a, c) = (calls.clone(), calls.clone());

    let groups = bundled_groups()
        .on(DELETE_GROUP, "search-index", move |name, _| {
            a.lock().unwrap().push(format!("search-index:{name}"));
            Ok(())
        })
        .unwrap()
        .on(DELETE_GROUP, "audit", |_, _| {
            Err(HandlerError::Rejected("audit store offline".into()))
        })
        .unwrap()
        .on(DELETE_GROUP, "cache", move |name, _| {
            c.lock().unwrap().push(format!("cache:{name}"));
            Ok(())
        })
        .unwrap();

    let report = groups
        .dispatch(DELETE_GROUP, "user.delete", &json!({ "id": 7 }))
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec!["search-index:user.delete", "cache:user.delete"]
    );
    assert_eq!(report.outcomes.len(), 3);
    assert!(!report.is_success());
    assert_eq!(report.failed(), vec![&HandlerRef::new("audit")]);
}

#[test]
fn non_member_rejected_before_any_handler() {
    let called = Arc::new(Mutex::new(false));
    let flag = called.clone();
    let groups = bundled_groups()
        .on(DELETE_GROUP, "cleanup", move |_, _| {
            *flag.lock().unwrap() = true;
            Ok(())
        })
        .unwrap();

    let err = groups
        .dispatch(DELETE_GROUP, "portal.create", &json!({}))
        .unwrap_err();
    assert_eq!(
        err,
        RoutingError::GroupMembershipViolation {
            group: DELETE_GROUP.into(),
            member: "portal.create".into(),
        }
    );
    assert!(!*called.lock().unwrap());
}

#[test]
fn unknown_group_is_reported() {
    assert_eq!(
        bundled_groups()
            .dispatch("archive", "lo.delete", &json!({}))
            .unwrap_err(),
        RoutingError::UnknownGroup("archive".into())
    );
    assert!(matches!(
        bundled_groups().on("archive", "x", |_, _| Ok(())),
        Err(RoutingError::UnknownGroup(_))
    ));
}

#[test]
fn notify_task_validation() {
    let groups = bundled_groups();

    let (group, task) = groups
        .validate_task(
            DO_NOTIFY,
            &json!({ "task": "notify.portal.user_plan_reached", "body": { "portal": 1 } }),
        )
        .unwrap()
        .unwrap();
    assert_eq!(group.name(), NOTIFY_GROUP);
    assert_eq!(task.task, "notify.portal.user_plan_reached");
    assert_eq!(task.body, json!({ "portal": 1 }));

    let err = groups
        .validate_task(DO_NOTIFY, &json!({ "task": "notify.unknown", "body": {} }))
        .unwrap_err();
    assert_eq!(
        err,
        RoutingError::GroupMembershipViolation {
            group: NOTIFY_GROUP.into(),
            member: "notify.unknown".into(),
        }
    );

    assert!(matches!(
        groups.validate_task(DO_NOTIFY, &json!({ "body": {} })),
        Err(RoutingError::InvalidCommand { .. })
    ));

    // Commands without a task group pass through untouched.
    assert!(groups
        .validate_task("do.mail.send", &json!({}))
        .unwrap()
        .is_none());
}

#[test]
fn dispatch_task_reaches_task_handlers() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let groups = bundled_groups()
        .on(NOTIFY_GROUP, "plan-mailer", move |task, body| {
            sink.lock().unwrap().push((task.to_string(), body.clone()));
            Ok(())
        })
        .unwrap();

    let report = groups
        .dispatch_task(
            DO_NOTIFY,
            &json!({ "task": "notify.portal.user_plan_reached", "body": { "plan": "pro" } }),
        )
        .unwrap();
    assert!(report.is_success());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            "notify.portal.user_plan_reached".to_string(),
            json!({ "plan": "pro" })
        )]
    );
}

#[test]
fn panicking_handler_does_not_stop_siblings() {
    let ran = Arc::new(Mutex::new(false));
    let flag = ran.clone();
    let groups = bundled_groups()
        .on(DELETE_GROUP, "explodes", |_, _| panic!("index unavailable"))
        .unwrap()
        .on(DELETE_GROUP, "after", move |_, _| {
            *flag.lock().unwrap() = true;
            Ok(())
        })
        .unwrap();

    let report = groups
        .dispatch(DELETE_GROUP, "tag.delete", &json!({}))
        .unwrap();
    assert!(*ran.lock().unwrap());
    assert!(matches!(
        report.outcomes[0].result,
        Err(HandlerError::Panicked(ref msg)) if msg == "index unavailable"
    ));
}
