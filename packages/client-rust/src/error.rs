//! Error taxonomy for the panel client.
//!
//! Remote-service failures never escape public operations: registries and
//! the application surface degrade to empty/absent/false values and log.
//! These variants exist so internal plumbing can branch on failure class
//! with one type, and so log lines carry a uniform shape.

use crate::gateway::{Endpoint, Tier};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No credential is configured for the requested tier × endpoint.
    #[error("{tier} tier has no credential for the {endpoint} endpoint")]
    Disabled { tier: Tier, endpoint: Endpoint },

    /// Gateway construction failed (malformed token, client init failure).
    #[error("gateway configuration failed: {0}")]
    Configuration(String),

    /// Network/timeout failure; no HTTP response was produced.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A reachable backend answered with a non-success status.
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Response body did not match the expected schema.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}
