//! Static routing configuration.
//!
//! Everything the core needs is supplied as data: catalog entries, groups
//! and consumer bindings. The same table shape is used for the bundled
//! catalog and for service-specific files.
//!
//! ```json
//! {
//!   "contract_policy": "advisory",
//!   "events": [{ "name": "do.notify", "required_fields": ["task", "body"] }],
//!   "groups": [{ "name": "delete", "members": ["user.delete"] }],
//!   "bindings": [{ "match": "exact", "pattern": "user.create", "handler": "user-service" }]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{ContractPolicy, EventCatalog, EventDescriptor};
use crate::error::RoutingError;
use crate::frame::FrameBuilder;
use crate::group::{EventGroup, GroupDispatcher};
use crate::registry::{ConsumerBinding, ConsumerRegistry};
use crate::resolver::RoutingResolver;

/// Environment variable overriding [`RoutingConfig::contract_policy`].
pub const CONTRACT_POLICY_ENV: &str = "ROUTING_CONTRACT_POLICY";

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

/// Raw configuration table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub contract_policy: ContractPolicy,
    #[serde(default)]
    pub events: Vec<EventDescriptor>,
    #[serde(default)]
    pub groups: Vec<EventGroup>,
    #[serde(default)]
    pub bindings: Vec<ConsumerBinding>,
}

impl RoutingConfig {
    /// The full event catalog and groups shipped with the crate. Has no
    /// bindings; those belong to each consuming service.
    pub fn bundled() -> Result<Self, RoutingError> {
        Self::from_json_str(BUNDLED_CATALOG)
    }

    pub fn from_json_str(json: &str) -> Result<Self, RoutingError> {
        serde_json::from_str(json)
            .map_err(|e| RoutingError::Configuration(format!("invalid routing config: {}", e)))
    }

    /// Read a table from a JSON file.
    ///
    /// The environment is consulted later, by [`RoutingConfig::build`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoutingError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RoutingError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            events = config.events.len(),
            groups = config.groups.len(),
            bindings = config.bindings.len(),
            "loaded routing config"
        );
        Ok(config)
    }

    /// Apply `ROUTING_CONTRACT_POLICY` if set.
    pub fn with_env_overrides(self) -> Result<Self, RoutingError> {
        let value = std::env::var(CONTRACT_POLICY_ENV).ok();
        self.with_policy_override(value.as_deref())
    }

    /// Replace the contract policy with a raw `off|advisory|enforce` value.
    /// `None` keeps the table's policy.
    pub fn with_policy_override(mut self, value: Option<&str>) -> Result<Self, RoutingError> {
        if let Some(value) = value {
            self.contract_policy = value.parse().map_err(|e| {
                RoutingError::Configuration(format!("{}: {}", CONTRACT_POLICY_ENV, e))
            })?;
            debug!(policy = ?self.contract_policy, "contract policy overridden");
        }
        Ok(self)
    }

    /// Merge another table into this one: its entries are appended and its
    /// policy wins. Typically the bundled catalog plus a service's bindings.
    pub fn merge(mut self, other: RoutingConfig) -> Self {
        self.contract_policy = other.contract_policy;
        self.events.extend(other.events);
        self.groups.extend(other.groups);
        self.bindings.extend(other.bindings);
        self
    }

    /// Apply environment overrides, validate the table and build the
    /// runtime components.
    ///
    /// Bundled, parsed and loaded tables all pass through here, so
    /// `ROUTING_CONTRACT_POLICY` wins over whichever policy the table carries.
    pub fn build(self) -> Result<Routing, RoutingError> {
        let config = self.with_env_overrides()?;
        config.assemble()
    }

    fn assemble(self) -> Result<Routing, RoutingError> {
        let catalog = Arc::new(EventCatalog::new(self.events, &self.groups)?);
        let registry = Arc::new(ConsumerRegistry::from_bindings(self.bindings)?);
        let groups = GroupDispatcher::with_groups(self.groups)?;

        Ok(Routing {
            builder: FrameBuilder::new(catalog.clone(), self.contract_policy),
            resolver: RoutingResolver::new(registry, catalog),
            groups,
        })
    }
}

/// Runtime components built from one [`RoutingConfig`].
#[derive(Debug, Clone)]
pub struct Routing {
    pub builder: FrameBuilder,
    pub resolver: RoutingResolver,
    pub groups: GroupDispatcher,
}
