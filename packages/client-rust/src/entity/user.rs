//! User entity bound to the application tier.

use tracing::debug;

use roost_core::records::{AppServerRecord, UserRecord};

use crate::application::ApplicationApi;
use crate::gateway::Endpoint;

/// Typed view over a user record, able to lazily fetch further data through
/// the application handle it was materialized from.
#[derive(Clone)]
pub struct User {
    pub record: UserRecord,
    /// Deployment the record was fetched from; follow-up calls go here.
    pub endpoint: Endpoint,
    api: Option<ApplicationApi>,
}

impl User {
    pub(crate) fn new(record: UserRecord, endpoint: Endpoint, api: Option<ApplicationApi>) -> Self {
        Self {
            record,
            endpoint,
            api,
        }
    }

    pub(crate) fn bound(record: UserRecord, endpoint: Endpoint, api: ApplicationApi) -> Self {
        Self::new(record, endpoint, Some(api))
    }

    /// Servers owned by this user.
    ///
    /// Uses the embedded relationship when the record carries one; otherwise
    /// re-fetches the user with its server relationship included. Empty when
    /// neither source is available.
    pub async fn servers(&self) -> Vec<AppServerRecord> {
        if self.record.relationships.servers.is_some() {
            return self.record.servers().into_iter().cloned().collect();
        }

        let Some(api) = &self.api else {
            debug!(user_id = self.record.id, "user has no application handle, returning no servers");
            return Vec::new();
        };
        match api.user(self.endpoint, self.record.id).await {
            Some(user) => user.record.servers().into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }
}
