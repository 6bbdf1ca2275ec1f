//! Server records for both API tiers.
//!
//! The client tier returns a minimal view (`ClientServerRecord`); the richer
//! application-tier view (`AppServerRecord`) adds the owning user and numeric
//! ids, and may embed `user`/`node` relationship envelopes when requested.

use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::records::node::NodeRecord;
use crate::records::user::UserRecord;

/// Hard resource limits shared by both server views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Memory limit in MiB.
    #[serde(default)]
    pub memory: i64,
    /// Swap limit in MiB. `-1` means unlimited.
    #[serde(default)]
    pub swap: i64,
    /// Disk limit in MiB.
    #[serde(default)]
    pub disk: i64,
    /// Block IO weight.
    #[serde(default)]
    pub io: i64,
    /// CPU limit in percent (100 = one core).
    #[serde(default)]
    pub cpu: i64,
}

/// Feature count limits (databases, allocations, backups).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLimits {
    #[serde(default)]
    pub databases: i64,
    #[serde(default)]
    pub allocations: i64,
    #[serde(default)]
    pub backups: i64,
}

/// Minimal server record as returned by the client tier.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientServerRecord {
    /// Whether the credential owner is the server owner.
    #[serde(default)]
    pub server_owner: bool,
    /// Short panel-scoped identifier used in client-tier paths.
    pub identifier: String,
    /// Globally unique server UUID shared with the application tier.
    pub uuid: String,
    pub name: String,
    /// Numeric id of the owning node.
    pub node: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub feature_limits: FeatureLimits,
    #[serde(default)]
    pub is_suspended: bool,
    #[serde(default)]
    pub is_installing: bool,
}

/// Full server record as returned by the application tier.
#[derive(Debug, Clone, Deserialize)]
pub struct AppServerRecord {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    pub uuid: String,
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub feature_limits: FeatureLimits,
    /// Numeric id of the owning user.
    pub user: i64,
    /// Numeric id of the owning node.
    pub node: i64,
    #[serde(default)]
    pub allocation: Option<i64>,
    #[serde(default)]
    pub nest: Option<i64>,
    #[serde(default)]
    pub egg: Option<i64>,
    /// Embedded relationships, present only when the request asked for them.
    #[serde(default)]
    pub relationships: AppServerRelationships,
}

/// Relationship envelopes embedded in an application server record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppServerRelationships {
    #[serde(default)]
    pub user: Option<Envelope<UserRecord>>,
    #[serde(default)]
    pub node: Option<Envelope<NodeRecord>>,
}

impl AppServerRecord {
    /// The embedded owning-user record, if the relationship was included.
    #[must_use]
    pub fn owner(&self) -> Option<&UserRecord> {
        self.relationships.user.as_ref().map(|e| &e.attributes)
    }
}

/// Live utilization snapshot from the client tier (`.../resources`).
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceUsageRecord {
    /// Daemon power state, e.g. `"running"` or `"offline"`.
    pub current_state: String,
    #[serde(default)]
    pub is_suspended: bool,
    pub resources: ResourceStats,
}

/// Raw utilization counters inside a [`ResourceUsageRecord`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceStats {
    #[serde(default)]
    pub memory_bytes: i64,
    #[serde(default)]
    pub cpu_absolute: f64,
    #[serde(default)]
    pub disk_bytes: i64,
    #[serde(default)]
    pub network_rx_bytes: i64,
    #[serde(default)]
    pub network_tx_bytes: i64,
    /// Uptime in milliseconds; zero when offline.
    #[serde(default)]
    pub uptime: i64,
}
