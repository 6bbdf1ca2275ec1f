//! Node records from the application tier.

use serde::Deserialize;

use crate::envelope::{Envelope, ListDocument};
use crate::records::catalog::{AllocationRecord, LocationRecord};

/// Application-tier node record.
///
/// Node ids are only unique within one backend deployment; callers that mix
/// deployments must qualify the id with its origin endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub public: bool,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location_id: i64,
    #[serde(default)]
    pub fqdn: String,
    /// Daemon connection scheme, `"http"` or `"https"`.
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub memory_overallocate: i64,
    #[serde(default)]
    pub disk: i64,
    #[serde(default)]
    pub disk_overallocate: i64,
    /// Maximum upload size in MiB.
    #[serde(default)]
    pub upload_size: i64,
    #[serde(default)]
    pub daemon_listen: i64,
    #[serde(default)]
    pub daemon_sftp: i64,
    #[serde(default)]
    pub daemon_base: String,
    #[serde(default)]
    pub maintenance_mode: bool,
    #[serde(default)]
    pub relationships: NodeRelationships,
}

/// Relationship envelopes embedded in a node record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeRelationships {
    #[serde(default)]
    pub location: Option<Envelope<LocationRecord>>,
    #[serde(default)]
    pub allocations: Option<ListDocument<AllocationRecord>>,
}

impl NodeRecord {
    /// The embedded location record, if the relationship was included.
    #[must_use]
    pub fn location(&self) -> Option<&LocationRecord> {
        self.relationships.location.as_ref().map(|e| &e.attributes)
    }

    /// Embedded allocations in panel order; empty when not included.
    #[must_use]
    pub fn allocations(&self) -> Vec<&AllocationRecord> {
        self.relationships
            .allocations
            .as_ref()
            .map(|list| list.data.iter().map(|e| &e.attributes).collect())
            .unwrap_or_default()
    }
}
