//! Configuration for the panel registry.

use std::time::Duration;

use crate::gateway::{Endpoint, Tier};

/// Top-level configuration for a [`crate::registry::PanelRegistry`].
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// API root of the main deployment, e.g. `https://panel.example.com/api`.
    pub base_url: String,
    /// API root of the oci deployment.
    pub oci_base_url: String,
    /// Bearer tokens per tier × endpoint; absent tokens disable the combination.
    pub credentials: Credentials,
    /// Overall per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
    /// Per-endpoint probe timeout for single-server lookups, so a dead
    /// endpoint degrades quickly to the fallback instead of hanging.
    pub probe_timeout: Duration,
    /// Maximum age of the fusion cache before a non-fast read refreshes it.
    pub freshness_window: Duration,
    /// Hard cap on pages walked per list call, guarding against a backend
    /// whose pagination cursor never advances.
    pub page_cap: u32,
}

impl PanelConfig {
    /// Configuration with default timing for the given deployment roots.
    /// All credentials start absent; fill in [`PanelConfig::credentials`].
    #[must_use]
    pub fn new(base_url: impl Into<String>, oci_base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            oci_base_url: oci_base_url.into(),
            credentials: Credentials::default(),
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(3),
            freshness_window: Duration::from_secs(300),
            page_cap: 100,
        }
    }

    /// Base URL serving the given endpoint.
    #[must_use]
    pub fn url_for(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Main => &self.base_url,
            Endpoint::Oci => &self.oci_base_url,
        }
    }
}

/// Up to four independent bearer tokens. A tier × endpoint combination is
/// enabled iff its token is present; absence short-circuits operations with
/// empty/absent results instead of failing.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub client_main: Option<String>,
    pub client_oci: Option<String>,
    pub app_main: Option<String>,
    pub app_oci: Option<String>,
}

impl Credentials {
    /// The token for a tier × endpoint combination, if configured.
    #[must_use]
    pub fn token(&self, tier: Tier, endpoint: Endpoint) -> Option<&str> {
        let slot = match (tier, endpoint) {
            (Tier::Client, Endpoint::Main) => &self.client_main,
            (Tier::Client, Endpoint::Oci) => &self.client_oci,
            (Tier::Application, Endpoint::Main) => &self.app_main,
            (Tier::Application, Endpoint::Oci) => &self.app_oci,
        };
        slot.as_deref()
    }
}
