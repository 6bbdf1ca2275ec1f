//! User records from the application tier.

use serde::Deserialize;

use crate::envelope::ListDocument;
use crate::records::server::AppServerRecord;

/// Application-tier user record.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub uuid: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub root_admin: bool,
    #[serde(rename = "2fa", default)]
    pub two_factor: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub relationships: UserRelationships,
}

/// Relationship envelopes embedded in a user record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRelationships {
    #[serde(default)]
    pub servers: Option<ListDocument<AppServerRecord>>,
}

impl UserRecord {
    /// Embedded owned servers; empty when the relationship was not included.
    #[must_use]
    pub fn servers(&self) -> Vec<&AppServerRecord> {
        self.relationships
            .servers
            .as_ref()
            .map(|list| list.data.iter().map(|e| &e.attributes).collect())
            .unwrap_or_default()
    }
}
