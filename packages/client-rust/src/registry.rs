//! Panel registry: the entry point owning gateways, tiers, and the cache.
//!
//! A registry holds zero to four gateways (client × {main, oci},
//! application × {main, oci}); any subset may be enabled depending on which
//! credentials were configured. Client-tier reads fan out to every enabled
//! endpoint concurrently and fuse application-tier data onto the results;
//! administrative calls go through [`PanelRegistry::application`] directly
//! and bypass the cache.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, error, warn};

use roost_core::envelope::{Envelope, ListDocument};
use roost_core::records::ClientServerRecord;

use crate::application::ApplicationApi;
use crate::cache::{FusedData, FusionCache};
use crate::config::PanelConfig;
use crate::entity::ClientServer;
use crate::gateway::{ApiRequest, ApiResponse, Endpoint, Gateway, HttpGateway, Tier};

pub struct PanelRegistry {
    client_main: Option<Arc<dyn Gateway>>,
    client_oci: Option<Arc<dyn Gateway>>,
    app: Option<ApplicationApi>,
    cache: FusionCache,
    probe_timeout: Duration,
}

impl PanelRegistry {
    /// Builds a registry from configuration. Combinations without a
    /// credential, or whose gateway fails to construct, are left absent;
    /// operations against them degrade gracefully.
    #[must_use]
    pub fn new(config: &PanelConfig) -> Self {
        let client_main = Self::build_gateway(config, Tier::Client, Endpoint::Main);
        let client_oci = Self::build_gateway(config, Tier::Client, Endpoint::Oci);
        let app_main = Self::build_gateway(config, Tier::Application, Endpoint::Main);
        let app_oci = Self::build_gateway(config, Tier::Application, Endpoint::Oci);

        let app = (app_main.is_some() || app_oci.is_some())
            .then(|| ApplicationApi::new(app_main, app_oci, config.page_cap));

        Self {
            client_main,
            client_oci,
            app,
            cache: FusionCache::new(config.freshness_window),
            probe_timeout: config.probe_timeout,
        }
    }

    fn build_gateway(
        config: &PanelConfig,
        tier: Tier,
        endpoint: Endpoint,
    ) -> Option<Arc<dyn Gateway>> {
        let token = config.credentials.token(tier, endpoint)?;
        match HttpGateway::new(
            endpoint,
            tier,
            config.url_for(endpoint),
            token,
            config.request_timeout,
        ) {
            Ok(gateway) => Some(gateway as Arc<dyn Gateway>),
            Err(e) => {
                warn!(%tier, %endpoint, error = %e, "disabling misconfigured gateway");
                None
            }
        }
    }

    /// Assembles a registry from pre-built parts. Test seam.
    pub(crate) fn with_parts(
        client_main: Option<Arc<dyn Gateway>>,
        client_oci: Option<Arc<dyn Gateway>>,
        app: Option<ApplicationApi>,
        probe_timeout: Duration,
        freshness_window: Duration,
    ) -> Self {
        Self {
            client_main,
            client_oci,
            app,
            cache: FusionCache::new(freshness_window),
            probe_timeout,
        }
    }

    /// The administrative surface, when at least one application credential
    /// is configured.
    #[must_use]
    pub fn application(&self) -> Option<&ApplicationApi> {
        self.app.as_ref()
    }

    fn client_gateway(&self, endpoint: Endpoint) -> Option<&Arc<dyn Gateway>> {
        match endpoint {
            Endpoint::Main => self.client_main.as_ref(),
            Endpoint::Oci => self.client_oci.as_ref(),
        }
    }

    fn client_enabled(&self) -> bool {
        self.client_main.is_some() || self.client_oci.is_some()
    }

    fn fuse(&self, endpoint: Endpoint, record: &ClientServerRecord) -> FusedData {
        match &self.app {
            Some(app) => self
                .cache
                .fuse(endpoint, record.node, &record.uuid, Some(app)),
            None => FusedData::empty(),
        }
    }

    /// Bounds one endpoint probe so a dead deployment degrades to the
    /// fallback instead of hanging the caller.
    async fn probe(&self, gateway: &dyn Gateway, request: ApiRequest) -> ApiResponse {
        match tokio::time::timeout(self.probe_timeout, gateway.send(request)).await {
            Ok(response) => response,
            Err(_) => {
                warn!(
                    endpoint = %gateway.endpoint(),
                    timeout = ?self.probe_timeout,
                    "endpoint probe timed out",
                );
                ApiResponse::transport_failure("probe timed out")
            }
        }
    }

    /// Lists every server visible to the client credentials.
    ///
    /// Fans out to every enabled client endpoint concurrently and merges the
    /// results. With `fast` false the fusion cache is refreshed first (inside
    /// its freshness window) and every server is hydrated with live resource
    /// data, dropping servers whose daemon did not answer; with `fast` true
    /// whatever cache is resident is used as-is and hydration is skipped.
    pub async fn get_servers(&self, fast: bool) -> Vec<ClientServer> {
        if !self.client_enabled() {
            warn!("get_servers called but no client credentials are configured");
            return Vec::new();
        }

        let fetches = Endpoint::ALL.into_iter().filter_map(|endpoint| {
            self.client_gateway(endpoint).map(|gateway| {
                let gateway = Arc::clone(gateway);
                async move { (endpoint, gateway.send(ApiRequest::get("")).await) }
            })
        });
        let responses = join_all(fetches).await;

        let mut tagged: Vec<(Endpoint, ClientServerRecord)> = Vec::new();
        for (endpoint, response) in responses {
            match response.json::<ListDocument<ClientServerRecord>>() {
                Ok(document) => {
                    tagged.extend(document.into_records().into_iter().map(|r| (endpoint, r)));
                }
                Err(e) => error!(%endpoint, error = %e, "failed to list client servers"),
            }
        }
        if tagged.is_empty() {
            return Vec::new();
        }

        if !fast {
            if let Some(app) = &self.app {
                self.cache.refresh(app, false).await;
            }
        }

        let servers: Vec<ClientServer> = tagged
            .into_iter()
            .filter_map(|(endpoint, record)| {
                self.client_gateway(endpoint).map(|gateway| {
                    let fused = self.fuse(endpoint, &record);
                    ClientServer::new(record, endpoint, Arc::clone(gateway), fused)
                })
            })
            .collect();

        if fast {
            return servers;
        }
        let hydrated = join_all(servers.into_iter().map(ClientServer::hydrate)).await;
        hydrated.into_iter().flatten().collect()
    }

    /// Looks up a single server by client-tier id.
    ///
    /// Probes main first with a bounded timeout, falling back to oci only if
    /// main did not answer successfully; the endpoint that answered becomes
    /// the server's origin for all follow-up routing. The fusion cache is
    /// refreshed before fusing. Absent when no endpoint answered or the
    /// server lacks live resource data.
    pub async fn get_server(&self, id: &str) -> Option<ClientServer> {
        if !self.client_enabled() {
            warn!("get_server called but no client credentials are configured");
            return None;
        }

        let mut found = None;
        for endpoint in Endpoint::ALL {
            let Some(gateway) = self.client_gateway(endpoint) else {
                continue;
            };
            let response = self
                .probe(gateway.as_ref(), ApiRequest::get(format!("servers/{id}")))
                .await;
            if response.status == 200 {
                match response.json::<Envelope<ClientServerRecord>>() {
                    Ok(envelope) => {
                        found = Some((endpoint, Arc::clone(gateway), envelope.attributes));
                        break;
                    }
                    Err(e) => {
                        error!(%endpoint, server_id = id, error = %e, "malformed server response");
                    }
                }
            } else {
                warn!(
                    %endpoint,
                    server_id = id,
                    status = response.status,
                    body = %response.body,
                    "server lookup failed, trying next endpoint",
                );
            }
        }

        let Some((endpoint, gateway, record)) = found else {
            error!(server_id = id, "server not found on any enabled endpoint");
            return None;
        };

        if let Some(app) = &self.app {
            self.cache.refresh(app, false).await;
        }
        let fused = self.fuse(endpoint, &record);
        ClientServer::new(record, endpoint, gateway, fused)
            .hydrate()
            .await
    }

    /// True iff the id resolves on any enabled client endpoint. Main is
    /// probed before oci; the first success short-circuits.
    pub async fn validate_server_id(&self, id: &str) -> bool {
        if !self.client_enabled() {
            warn!("validate_server_id called but no client credentials are configured");
            return false;
        }

        for endpoint in Endpoint::ALL {
            let Some(gateway) = self.client_gateway(endpoint) else {
                continue;
            };
            let response = self
                .probe(gateway.as_ref(), ApiRequest::get(format!("servers/{id}")))
                .await;
            if response.status == 200 {
                debug!(%endpoint, server_id = id, "server id is valid");
                return true;
            }
        }

        debug!(server_id = id, "server id is invalid");
        false
    }

    /// Resolves each id concurrently via [`PanelRegistry::get_server`].
    /// Unresolvable ids are dropped; resolvable ones keep their issue order.
    pub async fn get_servers_from_list(&self, ids: &[String]) -> Vec<ClientServer> {
        if !self.client_enabled() {
            warn!("get_servers_from_list called but no client credentials are configured");
            return Vec::new();
        }

        let lookups = ids.iter().map(|id| self.get_server(id));
        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// Releases all underlying sessions concurrently. Idempotent; safe when
    /// a session was never opened.
    pub async fn close(&self) {
        let closes = [&self.client_main, &self.client_oci]
            .into_iter()
            .flatten()
            .map(|gateway| gateway.close());
        join_all(closes).await;
        if let Some(app) = &self.app {
            app.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{
        app_server_attrs, client_server_attrs, list_response, node_attrs, record_response,
        resources_attrs, FakeGateway,
    };

    use super::*;

    const PROBE: Duration = Duration::from_secs(3);
    const WINDOW: Duration = Duration::from_secs(300);

    fn registry(
        client_main: Option<Arc<FakeGateway>>,
        client_oci: Option<Arc<FakeGateway>>,
        app: Option<ApplicationApi>,
    ) -> PanelRegistry {
        PanelRegistry::with_parts(
            client_main.map(|g| g as Arc<dyn Gateway>),
            client_oci.map(|g| g as Arc<dyn Gateway>),
            app,
            PROBE,
            WINDOW,
        )
    }

    /// Client gateway serving a list with the given servers plus per-server
    /// detail and resource routes.
    fn client_backend(endpoint: Endpoint, identifiers: &[&str]) -> Arc<FakeGateway> {
        let identifiers: Vec<String> = identifiers.iter().map(ToString::to_string).collect();
        FakeGateway::new(endpoint, Tier::Client, move |request| {
            if request.path.is_empty() {
                let attrs: Vec<_> = identifiers
                    .iter()
                    .map(|id| client_server_attrs(id, &format!("uuid-{id}"), 7))
                    .collect();
                return list_response(&attrs, 1, 1);
            }
            for id in &identifiers {
                if request.path == format!("servers/{id}") {
                    return record_response(client_server_attrs(id, &format!("uuid-{id}"), 7));
                }
                if request.path == format!("servers/{id}/resources") {
                    return record_response(resources_attrs());
                }
            }
            ApiResponse::new(404, "not found")
        })
    }

    fn app_backend(endpoint: Endpoint) -> Arc<FakeGateway> {
        FakeGateway::new(endpoint, Tier::Application, |request| {
            if request.path == "nodes" {
                list_response(&[node_attrs(7)], 1, 1)
            } else {
                list_response(&[app_server_attrs("uuid-a1b2", 7, 3)], 1, 1)
            }
        })
    }

    #[tokio::test]
    async fn zero_credentials_degrade_every_operation() {
        let registry = registry(None, None, None);
        assert!(registry.get_servers(false).await.is_empty());
        assert!(registry.get_server("a1b2").await.is_none());
        assert!(!registry.validate_server_id("a1b2").await);
        assert!(registry
            .get_servers_from_list(&["a1b2".to_string()])
            .await
            .is_empty());
        registry.close().await;
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let registry = registry(Some(client_backend(Endpoint::Main, &["a1b2"])), None, None);
        registry.close().await;
        registry.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn get_server_falls_back_to_oci_when_main_times_out() {
        crate::testing::init_tracing();
        let main = FakeGateway::with_delay(
            Endpoint::Main,
            Tier::Client,
            Duration::from_secs(10),
            |_| ApiResponse::new(200, "never delivered in time"),
        );
        let oci = client_backend(Endpoint::Oci, &["a1b2"]);
        let registry = registry(Some(main), Some(oci), None);

        let server = registry.get_server("a1b2").await.unwrap();
        assert_eq!(server.endpoint, Endpoint::Oci);
        assert!(server.resources.is_some());
    }

    #[tokio::test]
    async fn get_server_fuses_application_data() {
        let client = client_backend(Endpoint::Main, &["a1b2"]);
        let app = ApplicationApi::new(Some(app_backend(Endpoint::Main)), None, 100);
        let registry = registry(Some(client), None, Some(app));

        let server = registry.get_server("a1b2").await.unwrap();
        assert_eq!(server.node.as_ref().unwrap().id, 7);
        assert_eq!(server.app_server.as_ref().unwrap().uuid, "uuid-a1b2");
        assert_eq!(server.owner.as_ref().unwrap().record.id, 3);
    }

    #[tokio::test]
    async fn get_server_is_absent_without_live_resources() {
        let client = FakeGateway::new(Endpoint::Main, Tier::Client, |request| {
            if request.path == "servers/a1b2" {
                record_response(client_server_attrs("a1b2", "uuid-a1b2", 7))
            } else {
                ApiResponse::new(500, "daemon offline")
            }
        });
        let registry = registry(Some(client), None, None);
        assert!(registry.get_server("a1b2").await.is_none());
    }

    #[tokio::test]
    async fn validate_short_circuits_on_main_success() {
        let main = client_backend(Endpoint::Main, &["a1b2"]);
        let oci = client_backend(Endpoint::Oci, &["a1b2"]);
        let registry = registry(Some(main), Some(oci.clone()), None);

        assert!(registry.validate_server_id("a1b2").await);
        assert_eq!(oci.calls(), 0);
        assert!(!registry.validate_server_id("nope").await);
    }

    #[tokio::test]
    async fn batch_drops_missing_and_preserves_order() {
        let client = client_backend(Endpoint::Main, &["a", "b"]);
        let registry = registry(Some(client), None, None);

        let ids = vec!["a".to_string(), "missing".to_string(), "b".to_string()];
        let servers = registry.get_servers_from_list(&ids).await;
        let found: Vec<&str> = servers.iter().map(ClientServer::identifier).collect();
        assert_eq!(found, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn fast_listing_skips_refresh_and_hydration() {
        let client = client_backend(Endpoint::Main, &["a1b2"]);
        let app_gateway = app_backend(Endpoint::Main);
        let app = ApplicationApi::new(Some(app_gateway.clone()), None, 100);
        let registry = registry(Some(client.clone()), None, Some(app));

        let servers = registry.get_servers(true).await;
        assert_eq!(servers.len(), 1);
        assert!(servers[0].resources.is_none());
        // Stale/empty cache is used as-is: no application fan-out happened.
        assert_eq!(app_gateway.calls(), 0);
        assert!(client
            .requests()
            .iter()
            .all(|r| !r.path.ends_with("/resources")));
    }

    #[tokio::test]
    async fn full_listing_merges_endpoints_and_hydrates() {
        let main = client_backend(Endpoint::Main, &["a1b2"]);
        let oci = client_backend(Endpoint::Oci, &["z9y8"]);
        let app = ApplicationApi::new(Some(app_backend(Endpoint::Main)), None, 100);
        let registry = registry(Some(main), Some(oci), Some(app));

        let servers = registry.get_servers(false).await;
        assert_eq!(servers.len(), 2);
        let by_id = |id: &str| servers.iter().find(|s| s.identifier() == id).unwrap();
        assert_eq!(by_id("a1b2").endpoint, Endpoint::Main);
        assert_eq!(by_id("z9y8").endpoint, Endpoint::Oci);
        assert!(servers.iter().all(|s| s.resources.is_some()));
        // Application data only matches the main-endpoint server.
        assert!(by_id("a1b2").node.is_some());
        assert!(by_id("z9y8").node.is_none());
    }

    #[tokio::test]
    async fn one_endpoint_failing_keeps_the_other_in_listing() {
        let main = FakeGateway::new(Endpoint::Main, Tier::Client, |_| {
            ApiResponse::transport_failure("connection refused")
        });
        let oci = client_backend(Endpoint::Oci, &["z9y8"]);
        let registry = registry(Some(main), Some(oci), None);

        let servers = registry.get_servers(true).await;
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].identifier(), "z9y8");
    }
}
