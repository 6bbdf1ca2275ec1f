//! Nest entity bound to the application tier.

use roost_core::records::{EggRecord, NestRecord};

use crate::application::ApplicationApi;
use crate::gateway::Endpoint;

/// Typed view over a nest (service category) record.
#[derive(Clone)]
pub struct Nest {
    pub record: NestRecord,
    pub endpoint: Endpoint,
    api: ApplicationApi,
}

impl Nest {
    pub(crate) fn bound(record: NestRecord, endpoint: Endpoint, api: ApplicationApi) -> Self {
        Self {
            record,
            endpoint,
            api,
        }
    }

    /// Eggs in this nest: the embedded relationship when present, otherwise
    /// fetched from the application tier.
    pub async fn eggs(&self) -> Vec<EggRecord> {
        if self.record.relationships.eggs.is_some() {
            return self.record.eggs().into_iter().cloned().collect();
        }
        self.api.eggs(self.endpoint, self.record.id).await
    }
}
