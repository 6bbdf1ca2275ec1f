//! Catalog records: locations, nests, eggs, and node allocations.

use serde::Deserialize;

use crate::envelope::{Envelope, ListDocument};
use crate::records::node::NodeRecord;

/// Physical/logical location grouping nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    pub id: i64,
    /// Short code, e.g. `"eu"`.
    pub short: String,
    /// Human-readable description.
    #[serde(default, rename = "long")]
    pub long_name: Option<String>,
    #[serde(default)]
    pub relationships: LocationRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationRelationships {
    #[serde(default)]
    pub nodes: Option<ListDocument<NodeRecord>>,
}

/// Service category grouping eggs (e.g. "Minecraft").
#[derive(Debug, Clone, Deserialize)]
pub struct NestRecord {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub author: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub relationships: NestRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NestRelationships {
    #[serde(default)]
    pub eggs: Option<ListDocument<EggRecord>>,
}

impl NestRecord {
    /// Embedded eggs in panel order; empty when not included.
    #[must_use]
    pub fn eggs(&self) -> Vec<&EggRecord> {
        self.relationships
            .eggs
            .as_ref()
            .map(|list| list.data.iter().map(|e| &e.attributes).collect())
            .unwrap_or_default()
    }
}

/// Service template inside a nest.
#[derive(Debug, Clone, Deserialize)]
pub struct EggRecord {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    /// Id of the owning nest.
    #[serde(default)]
    pub nest: i64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub docker_image: String,
    /// Default startup command template.
    #[serde(default)]
    pub startup: String,
    #[serde(default)]
    pub relationships: EggRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EggRelationships {
    #[serde(default)]
    pub nest: Option<Envelope<NestRecord>>,
}

/// Network allocation (ip:port pair) on a node.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationRecord {
    pub id: i64,
    pub ip: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub port: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned: bool,
}
