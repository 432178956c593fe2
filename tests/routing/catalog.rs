//! The bundled catalog and configuration tables.

use std::io::Write;

use queue_routing::config::CONTRACT_POLICY_ENV;
use queue_routing::{
    Category, ConsumerBinding, ContractIssue, ContractPolicy, ContractRef, EventDescriptor,
    EventGroup, HandlerRef, RoutingConfig, RoutingError,
};
use serde_json::json;

use crate::support::bundled_catalog;

#[test]
fn classifies_by_name() {
    let catalog = bundled_catalog();
    assert_eq!(catalog.classify("portal.create"), Some(Category::LifecycleCreate));
    assert_eq!(catalog.classify("lo.update"), Some(Category::LifecycleUpdate));
    assert_eq!(catalog.classify("enrolment.delete"), Some(Category::LifecycleDelete));
    assert_eq!(catalog.classify("do.mail.send"), Some(Category::CommandDo));
    assert_eq!(catalog.classify("customer.view.list"), Some(Category::View));
    assert_eq!(catalog.classify("post_lo.create"), Some(Category::ExternalWebhook));
    assert_eq!(catalog.classify("lrs.event.new"), Some(Category::ExternalWebhook));
    assert_eq!(catalog.classify("li_video.process.s3"), None);
}

#[test]
fn command_payload_shapes_are_bundled() {
    let catalog = bundled_catalog();

    assert_eq!(
        catalog.lookup("do.sms.send").unwrap().contract,
        ContractRef::requiring(["to", "body"])
    );
    assert_eq!(
        catalog.check("do.exim.import", &json!({ "data": [] })),
        vec![ContractIssue::MissingField("taskId".into())]
    );
    assert_eq!(
        catalog.check("process.my-team", &json!({ "body": {} })),
        vec![ContractIssue::MissingField("action".into())]
    );
    assert!(catalog
        .check(
            "do.public-api.webhook-request",
            &json!({ "appId": 1, "url": "https://x", "subject": {}, "original": null })
        )
        .is_empty());
    assert_eq!(
        catalog.check("do.consumer.HttpRequest", &json!("GET /")),
        vec![ContractIssue::NotAnObject]
    );
}

#[test]
fn enforce_rejects_malformed_commands() {
    let builder = crate::support::builder(ContractPolicy::Enforce);
    let err = builder
        .build(None, "do.graphin.import", json!({ "type": "lo" }))
        .unwrap_err();
    assert_eq!(
        err,
        RoutingError::ContractViolation {
            event: "do.graphin.import".into(),
            issues: vec![ContractIssue::MissingField("id".into())],
        }
    );
    assert!(builder
        .build(None, "do.sms.send", json!({ "to": "+61400000000", "body": "hi" }))
        .is_ok());
}

#[test]
fn unknown_names_fall_back_to_conventions() {
    let catalog = bundled_catalog();
    assert!(catalog.lookup("widget.create").is_none());
    assert_eq!(catalog.classify("widget.create"), Some(Category::LifecycleCreate));
    assert!(catalog.check("widget.create", &json!({ "id": 1 })).is_empty());
}

#[test]
fn reserved_keys_are_not_catalogued() {
    let catalog = bundled_catalog();
    assert!(!catalog.contains("worker"));
    assert!(catalog.names().iter().all(|n| !n.starts_with("go1-reindex.")));
}

#[test]
fn duplicate_descriptor_rejected() {
    let config = RoutingConfig {
        events: vec![
            EventDescriptor::new("lo.create"),
            EventDescriptor::new("lo.create"),
        ],
        ..RoutingConfig::default()
    };
    assert!(matches!(config.build(), Err(RoutingError::Configuration(_))));
}

#[test]
fn service_table_merges_into_bundled() {
    let service: RoutingConfig = serde_json::from_value(json!({
        "contract_policy": "enforce",
        "groups": [{ "name": "archive", "members": ["lo.delete"] }],
        "bindings": [
            { "match": "exact", "pattern": "lo.delete", "handler": "lo-service" },
            { "match": "prefix", "pattern": "do.finder", "handler": "finder" }
        ]
    }))
    .unwrap();

    let routing = RoutingConfig::bundled().unwrap().merge(service).build().unwrap();

    // The environment wins over the table when it is set.
    if std::env::var(CONTRACT_POLICY_ENV).is_err() {
        assert_eq!(routing.builder.policy(), ContractPolicy::Enforce);
    }
    assert!(routing.groups.is_member("archive", "lo.delete"));
    assert_eq!(
        routing.resolver.route("do.finder").unwrap().handler(),
        HandlerRef::new("finder")
    );
    assert_eq!(routing.resolver.registry().len(), 2);
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let table = RoutingConfig {
        events: vec![EventDescriptor::new("do.report").with_category(Category::CommandDo)],
        groups: vec![EventGroup::events("purge", ["report.delete"])],
        bindings: vec![ConsumerBinding::exact("report.delete", "reports")],
        ..RoutingConfig::default()
    };
    write!(file, "{}", serde_json::to_string(&table).unwrap()).unwrap();

    let loaded = RoutingConfig::load(file.path()).unwrap();
    assert_eq!(loaded.events, table.events);
    assert_eq!(loaded.bindings, table.bindings);
    assert_eq!(loaded.contract_policy, ContractPolicy::Advisory);
}

#[test]
fn missing_file_is_configuration_error() {
    let err = RoutingConfig::load("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, RoutingError::Configuration(_)));
}
