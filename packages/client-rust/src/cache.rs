//! Cross-tier fusion cache.
//!
//! The client tier returns minimal server records; the richer attributes
//! (owning node, owning user, full limits) live only in the application tier
//! under different identifiers. This cache holds a time-windowed snapshot of
//! application-tier nodes and servers, keyed for O(1) lookup, and fuses that
//! data onto client-tier records by shared identifiers.
//!
//! Readers never observe a half-updated cache: both maps live in one
//! [`CacheSnapshot`] behind an `ArcSwap`, and a refresh replaces the whole
//! snapshot atomically. Staleness inside the freshness window is tolerated;
//! it never affects client-tier-only fields.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::time::Instant;
use tracing::debug;

use roost_core::records::{AppServerRecord, NodeRecord};

use crate::application::ApplicationApi;
use crate::entity::User;
use crate::gateway::Endpoint;

/// Node cache key: node id spaces may collide across deployments, so ids are
/// qualified by their origin endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub endpoint: Endpoint,
    pub id: i64,
}

/// Application server plus the endpoint it was fetched from. UUIDs are
/// globally unique across deployments, but follow-up calls for embedded
/// relationships must be routed back to the origin endpoint.
#[derive(Debug, Clone)]
struct CachedServer {
    endpoint: Endpoint,
    record: AppServerRecord,
}

/// One immutable cache generation, replaced wholesale on refresh.
#[derive(Default)]
struct CacheSnapshot {
    nodes: HashMap<NodeKey, NodeRecord>,
    servers: HashMap<String, CachedServer>,
}

/// Application-tier data fused onto one client server record.
///
/// Every field is independently optional: a miss is absence, never an error,
/// and fusion proceeds with whatever matched.
#[derive(Default)]
pub struct FusedData {
    pub node: Option<NodeRecord>,
    pub app_server: Option<AppServerRecord>,
    pub owner: Option<User>,
}

impl FusedData {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Time-windowed snapshot cache over application-tier nodes and servers.
pub struct FusionCache {
    snapshot: ArcSwap<CacheSnapshot>,
    /// Refresh critical section plus the last successful refresh instant.
    /// Holding the lock across the fetch serializes concurrent refreshes, so
    /// a second caller arriving mid-refresh re-checks freshness afterwards
    /// instead of fanning out again.
    refreshed_at: tokio::sync::Mutex<Option<Instant>>,
    freshness_window: Duration,
}

impl FusionCache {
    #[must_use]
    pub fn new(freshness_window: Duration) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(CacheSnapshot::default()),
            refreshed_at: tokio::sync::Mutex::new(None),
            freshness_window,
        }
    }

    /// Number of cached (nodes, servers); mainly for diagnostics.
    #[must_use]
    pub fn len(&self) -> (usize, usize) {
        let snapshot = self.snapshot.load();
        (snapshot.nodes.len(), snapshot.servers.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        let (nodes, servers) = self.len();
        nodes == 0 && servers == 0
    }

    /// Refreshes the snapshot from every enabled application endpoint.
    ///
    /// No-op when the application tier is fully disabled, or when the
    /// freshness window has not elapsed and `force` is false. Node and server
    /// lists are fetched concurrently per endpoint and endpoints are fanned
    /// out concurrently; one endpoint failing only costs that endpoint's
    /// records. The refresh timestamp is the instant the refresh began.
    pub async fn refresh(&self, app: &ApplicationApi, force: bool) {
        if !app.enabled() {
            return;
        }

        let mut refreshed_at = self.refreshed_at.lock().await;
        let started = Instant::now();
        if !force {
            let fresh = refreshed_at
                .is_some_and(|prev| started.duration_since(prev) < self.freshness_window);
            if fresh {
                return;
            }
        }

        debug!("refreshing application-tier node and server caches");
        let fetches = app.enabled_endpoints().into_iter().map(|endpoint| {
            let api = app.clone();
            async move {
                let (nodes, servers) = futures_util::future::join(
                    api.node_records(endpoint),
                    api.servers(endpoint),
                )
                .await;
                (endpoint, nodes, servers)
            }
        });
        let results = futures_util::future::join_all(fetches).await;

        let mut snapshot = CacheSnapshot::default();
        for (endpoint, nodes, servers) in results {
            for node in nodes {
                snapshot.nodes.insert(
                    NodeKey {
                        endpoint,
                        id: node.id,
                    },
                    node,
                );
            }
            for record in servers {
                snapshot
                    .servers
                    .insert(record.uuid.clone(), CachedServer { endpoint, record });
            }
        }

        debug!(
            nodes = snapshot.nodes.len(),
            servers = snapshot.servers.len(),
            "replaced fusion cache snapshot",
        );
        self.snapshot.store(Arc::new(snapshot));
        *refreshed_at = Some(started);
    }

    /// Pure read against the current snapshot. Looks up the node by the
    /// client record's endpoint-qualified node id and the application server
    /// by UUID; when the server matches, the embedded user relationship is
    /// materialized as a [`User`] bound to the application handle so it can
    /// lazily fetch further data. Never triggers a refresh.
    #[must_use]
    pub fn fuse(
        &self,
        endpoint: Endpoint,
        node_id: i64,
        uuid: &str,
        api: Option<&ApplicationApi>,
    ) -> FusedData {
        let snapshot = self.snapshot.load();

        let node = snapshot
            .nodes
            .get(&NodeKey {
                endpoint,
                id: node_id,
            })
            .cloned();

        let cached = snapshot.servers.get(uuid);
        let owner = cached.and_then(|server| {
            server.record.owner().cloned().map(|record| {
                User::new(record, server.endpoint, api.cloned())
            })
        });
        let app_server = cached.map(|server| server.record.clone());

        FusedData {
            node,
            app_server,
            owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::gateway::{ApiRequest, ApiResponse, Tier};
    use crate::testing::{app_server_attrs, list_response, node_attrs, FakeGateway};

    use super::*;

    /// Fake application backend with one node (id 7) and one server ("abc").
    fn seeded_gateway(endpoint: Endpoint) -> Arc<FakeGateway> {
        FakeGateway::new(endpoint, Tier::Application, |request: &ApiRequest| {
            if request.path == "nodes" {
                list_response(&[node_attrs(7)], 1, 1)
            } else {
                list_response(&[app_server_attrs("abc", 7, 3)], 1, 1)
            }
        })
    }

    fn api_over(gateway: Arc<FakeGateway>) -> ApplicationApi {
        ApplicationApi::new(Some(gateway), None, 100)
    }

    #[tokio::test]
    async fn fuse_hits_on_matching_identifiers() {
        let api = api_over(seeded_gateway(Endpoint::Main));
        let cache = FusionCache::new(Duration::from_secs(300));
        cache.refresh(&api, true).await;

        let fused = cache.fuse(Endpoint::Main, 7, "abc", Some(&api));
        assert_eq!(fused.node.as_ref().unwrap().id, 7);
        assert_eq!(fused.app_server.as_ref().unwrap().uuid, "abc");
        assert_eq!(fused.owner.as_ref().unwrap().record.id, 3);
    }

    #[tokio::test]
    async fn fuse_misses_are_absent_not_errors() {
        let api = api_over(seeded_gateway(Endpoint::Main));
        let cache = FusionCache::new(Duration::from_secs(300));
        cache.refresh(&api, true).await;

        let fused = cache.fuse(Endpoint::Main, 99, "zzz", Some(&api));
        assert!(fused.node.is_none());
        assert!(fused.app_server.is_none());
        assert!(fused.owner.is_none());
    }

    #[tokio::test]
    async fn node_lookup_is_endpoint_qualified() {
        let api = api_over(seeded_gateway(Endpoint::Main));
        let cache = FusionCache::new(Duration::from_secs(300));
        cache.refresh(&api, true).await;

        // Node 7 was cached from main; a client record from oci must not fuse with it.
        let fused = cache.fuse(Endpoint::Oci, 7, "abc", Some(&api));
        assert!(fused.node.is_none());
        // Server UUIDs are globally unique, so the uuid still matches.
        assert!(fused.app_server.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_within_window_fans_out_once() {
        let gateway = seeded_gateway(Endpoint::Main);
        let api = api_over(gateway.clone());
        let cache = FusionCache::new(Duration::from_secs(300));

        cache.refresh(&api, false).await;
        cache.refresh(&api, false).await;
        // One fan-out: one nodes fetch + one servers fetch.
        assert_eq!(gateway.calls(), 2);

        tokio::time::advance(Duration::from_secs(301)).await;
        cache.refresh(&api, false).await;
        assert_eq!(gateway.calls(), 4);
    }

    #[tokio::test]
    async fn forced_refresh_always_fans_out() {
        let gateway = seeded_gateway(Endpoint::Main);
        let api = api_over(gateway.clone());
        let cache = FusionCache::new(Duration::from_secs(300));

        cache.refresh(&api, true).await;
        cache.refresh(&api, true).await;
        assert_eq!(gateway.calls(), 4);
    }

    #[tokio::test]
    async fn one_endpoint_failing_keeps_the_other_endpoints_data() {
        let main = seeded_gateway(Endpoint::Main);
        let oci = FakeGateway::new(Endpoint::Oci, Tier::Application, |_| {
            ApiResponse::transport_failure("connection refused")
        });
        let api = ApplicationApi::new(Some(main), Some(oci), 100);
        let cache = FusionCache::new(Duration::from_secs(300));
        cache.refresh(&api, true).await;

        let (nodes, servers) = cache.len();
        assert_eq!(nodes, 1);
        assert_eq!(servers, 1);
        assert!(cache.fuse(Endpoint::Main, 7, "abc", Some(&api)).node.is_some());
    }

    #[tokio::test]
    async fn refresh_is_a_noop_when_tier_is_disabled() {
        let api = ApplicationApi::new(None, None, 100);
        let cache = FusionCache::new(Duration::from_secs(300));
        cache.refresh(&api, true).await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn refresh_replaces_rather_than_merges() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let second_run = Arc::new(AtomicBool::new(false));
        let flag = second_run.clone();
        let gateway = FakeGateway::new(Endpoint::Main, Tier::Application, move |request| {
            if request.path == "nodes" {
                let id = if flag.load(Ordering::SeqCst) { 8 } else { 7 };
                list_response(&[node_attrs(id)], 1, 1)
            } else {
                list_response(&[], 1, 1)
            }
        });
        let api = api_over(gateway);
        let cache = FusionCache::new(Duration::from_secs(300));

        cache.refresh(&api, true).await;
        second_run.store(true, Ordering::SeqCst);
        cache.refresh(&api, true).await;

        // The old node 7 entry is gone: whole-cache replacement, not a merge.
        assert!(cache.fuse(Endpoint::Main, 7, "x", Some(&api)).node.is_none());
        assert!(cache.fuse(Endpoint::Main, 8, "x", Some(&api)).node.is_some());
    }
}
