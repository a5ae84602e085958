//! Stack records and stack types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::status::StackPhase;

/// Tag key carrying the environment a stack belongs to.
pub const ENVIRONMENT_TAG: &str = "environment";

/// Tag key carrying the service a stack belongs to.
pub const SERVICE_TAG: &str = "service";

/// What a stack represents.
///
/// The slug returned by [`StackType::slug`] is embedded in every stack name and
/// is what listings filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackType {
    /// The environment network (VPC).
    Network,
    /// Auxiliary target stack torn down after the network.
    Target,
    /// The compute cluster.
    Cluster,
    /// The environment load balancer.
    LoadBalancer,
    /// Service discovery (consul).
    ServiceDiscovery,
    /// A database owned by a service.
    Database,
    /// An application service deployed into an environment.
    Service,
    /// A service's delivery pipeline.
    Pipeline,
}

impl StackType {
    /// All stack types.
    pub const ALL: [Self; 8] = [
        Self::Network,
        Self::Target,
        Self::Cluster,
        Self::LoadBalancer,
        Self::ServiceDiscovery,
        Self::Database,
        Self::Service,
        Self::Pipeline,
    ];

    /// Returns the name segment used for this type.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Network => "vpc",
            Self::Target => "target",
            Self::Cluster => "cluster",
            Self::LoadBalancer => "loadbalancer",
            Self::ServiceDiscovery => "consul",
            Self::Database => "database",
            Self::Service => "service",
            Self::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for StackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A remote stack as reported by the stack client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stack {
    /// Unique name within the account/region.
    pub name: String,
    /// Provider status, e.g. `DELETE_COMPLETE`.
    pub status: String,
    /// Human readable reason for the status.
    #[serde(default)]
    pub status_reason: String,
    /// Classification tags.
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Exported values.
    #[serde(default)]
    pub outputs: HashMap<String, String>,
    /// Input parameters.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    /// Last time the stack changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
}

impl Stack {
    /// Creates a stack with a name and status.
    #[must_use]
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            ..Self::default()
        }
    }

    /// Sets the status reason.
    #[must_use]
    pub fn with_status_reason(mut self, reason: impl Into<String>) -> Self {
        self.status_reason = reason.into();
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds an output.
    #[must_use]
    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.outputs.insert(key.into(), value.into());
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Sets the last update time.
    #[must_use]
    pub fn with_last_update_time(mut self, time: DateTime<Utc>) -> Self {
        self.last_update_time = Some(time);
        self
    }

    /// Returns a tag value, if present.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns an output value, or an empty string.
    #[must_use]
    pub fn output(&self, key: &str) -> &str {
        self.outputs.get(key).map_or("", String::as_str)
    }

    /// Returns true if the stack is tagged with the given environment.
    #[must_use]
    pub fn belongs_to_environment(&self, environment: &str) -> bool {
        self.tag(ENVIRONMENT_TAG) == Some(environment)
    }

    /// Classifies the current status.
    #[must_use]
    pub fn phase(&self) -> StackPhase {
        StackPhase::classify(&self.status)
    }
}
