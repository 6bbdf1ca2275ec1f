//! Node entity bound to the application tier.

use serde_json::Value;
use tracing::debug;

use roost_core::records::{AllocationRecord, LocationRecord, NodeRecord};

use crate::application::ApplicationApi;
use crate::gateway::Endpoint;

/// Typed view over a node record with follow-up calls routed to the
/// deployment that produced it.
#[derive(Clone)]
pub struct Node {
    pub record: NodeRecord,
    pub endpoint: Endpoint,
    api: Option<ApplicationApi>,
}

impl Node {
    pub(crate) fn new(record: NodeRecord, endpoint: Endpoint, api: Option<ApplicationApi>) -> Self {
        Self {
            record,
            endpoint,
            api,
        }
    }

    pub(crate) fn bound(record: NodeRecord, endpoint: Endpoint, api: ApplicationApi) -> Self {
        Self::new(record, endpoint, Some(api))
    }

    /// Embedded location, if the relationship was included.
    #[must_use]
    pub fn location(&self) -> Option<&LocationRecord> {
        self.record.location()
    }

    /// The node's daemon configuration document.
    pub async fn configuration(&self) -> Option<Value> {
        let Some(api) = &self.api else {
            debug!(node_id = self.record.id, "node has no application handle");
            return None;
        };
        api.node_configuration(self.endpoint, self.record.id).await
    }

    /// Allocations on this node: the embedded relationship when present,
    /// otherwise fetched from the application tier.
    pub async fn allocations(&self) -> Vec<AllocationRecord> {
        if self.record.relationships.allocations.is_some() {
            return self.record.allocations().into_iter().cloned().collect();
        }
        match &self.api {
            Some(api) => api.node_allocations(self.endpoint, self.record.id).await,
            None => Vec::new(),
        }
    }
}
