use std::sync::Arc;

use queue_routing::{
    ConsumerBinding, ConsumerRegistry, ContractPolicy, EventCatalog, FrameBuilder, RoutingConfig,
    RoutingResolver,
};

/// Resolver over the bundled catalog with the given bindings.
pub fn resolver(bindings: Vec<ConsumerBinding>) -> RoutingResolver {
    RoutingResolver::new(
        Arc::new(ConsumerRegistry::from_bindings(bindings).unwrap()),
        Arc::new(bundled_catalog()),
    )
}

pub fn bundled_catalog() -> EventCatalog {
    let config = RoutingConfig::bundled().unwrap();
    EventCatalog::new(config.events, &config.groups).unwrap()
}

pub fn builder(policy: ContractPolicy) -> FrameBuilder {
    FrameBuilder::new(Arc::new(bundled_catalog()), policy)
}
