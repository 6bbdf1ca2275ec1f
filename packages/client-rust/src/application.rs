//! Administrative (application-tier) operation surface.
//!
//! Every operation is addressed to one endpoint explicitly; the dual-endpoint
//! fan-out lives in the fusion cache and registry, not here. Calls against a
//! disabled endpoint degrade to empty/absent/false with a warning. List calls
//! request the embedded relationships the fusion cache depends on.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, warn};

use roost_core::envelope::Envelope;
use roost_core::records::{
    AllocationRecord, AppServerRecord, EggRecord, LocationRecord, NestRecord, NodeRecord,
    UserRecord,
};
use roost_core::requests::{
    CreateAllocationsRequest, CreateLocationRequest, CreateNodeRequest, CreateServerRequest,
    CreateUserRequest, UpdateLocationRequest, UpdateNodeRequest, UpdateServerBuildRequest,
    UpdateServerDetailsRequest, UpdateServerStartupRequest, UpdateUserRequest,
};

use crate::entity::{Nest, Node, User};
use crate::error::Error;
use crate::gateway::{ApiRequest, Endpoint, Gateway, Tier};
use crate::paginate::paginate;

const NODE_INCLUDE: &str = "location,allocations";
const SERVER_INCLUDE: &str = "user,node";
const USER_INCLUDE: &str = "servers";
const NEST_INCLUDE: &str = "eggs";
const EGG_INCLUDE: &str = "nest";
const LOCATION_INCLUDE: &str = "nodes";

/// Application API handle over up to two endpoint gateways.
///
/// Cheap to clone; entities hold a clone so they can issue follow-up calls.
#[derive(Clone)]
pub struct ApplicationApi {
    inner: Arc<Inner>,
}

struct Inner {
    main: Option<Arc<dyn Gateway>>,
    oci: Option<Arc<dyn Gateway>>,
    page_cap: u32,
}

impl ApplicationApi {
    pub(crate) fn new(
        main: Option<Arc<dyn Gateway>>,
        oci: Option<Arc<dyn Gateway>>,
        page_cap: u32,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                main,
                oci,
                page_cap,
            }),
        }
    }

    /// True when at least one endpoint has a credential.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.inner.main.is_some() || self.inner.oci.is_some()
    }

    /// Enabled endpoints in fan-out order (main first).
    #[must_use]
    pub fn enabled_endpoints(&self) -> Vec<Endpoint> {
        Endpoint::ALL
            .into_iter()
            .filter(|&endpoint| self.gateway(endpoint).is_ok())
            .collect()
    }

    fn gateway(&self, endpoint: Endpoint) -> Result<&Arc<dyn Gateway>, Error> {
        let slot = match endpoint {
            Endpoint::Main => &self.inner.main,
            Endpoint::Oci => &self.inner.oci,
        };
        slot.as_ref().ok_or(Error::Disabled {
            tier: Tier::Application,
            endpoint,
        })
    }

    fn gateway_or_warn(&self, endpoint: Endpoint, operation: &str) -> Option<&Arc<dyn Gateway>> {
        match self.gateway(endpoint) {
            Ok(gateway) => Some(gateway),
            Err(e) => {
                warn!(operation, error = %e, "skipping application call");
                None
            }
        }
    }

    pub(crate) async fn close(&self) {
        let closes = [&self.inner.main, &self.inner.oci]
            .into_iter()
            .flatten()
            .map(|gateway| gateway.close());
        futures_util::future::join_all(closes).await;
    }

    /// Fetches a single enveloped record, absent on any failure.
    async fn fetch_record<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        operation: &'static str,
        request: ApiRequest,
        expected: u16,
    ) -> Option<T> {
        let gateway = self.gateway_or_warn(endpoint, operation)?;
        let response = gateway.send(request).await;
        if response.status != expected {
            error!(
                endpoint = %endpoint,
                operation,
                status = response.status,
                body = %response.body,
                "application call failed",
            );
            return None;
        }
        match response.json::<Envelope<T>>() {
            Ok(envelope) => Some(envelope.attributes),
            Err(e) => {
                error!(endpoint = %endpoint, operation, error = %e, "malformed application response");
                None
            }
        }
    }

    /// Fires an action-style request, true iff the backend answered `expected`.
    async fn action(
        &self,
        endpoint: Endpoint,
        operation: &'static str,
        request: ApiRequest,
        expected: u16,
    ) -> bool {
        let Some(gateway) = self.gateway_or_warn(endpoint, operation) else {
            return false;
        };
        let response = gateway.send(request).await;
        if response.status == expected {
            true
        } else {
            error!(
                endpoint = %endpoint,
                operation,
                status = response.status,
                body = %response.body,
                "application action failed",
            );
            false
        }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        operation: &'static str,
        path: &str,
        include: &str,
    ) -> Vec<T> {
        let Some(gateway) = self.gateway_or_warn(endpoint, operation) else {
            return Vec::new();
        };
        let query = [("include", include)];
        paginate(gateway.as_ref(), path, &query, self.inner.page_cap).await
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// All users, with their server relationship embedded.
    pub async fn users(&self, endpoint: Endpoint) -> Vec<User> {
        let records: Vec<UserRecord> = self.list(endpoint, "users", "users", USER_INCLUDE).await;
        records
            .into_iter()
            .map(|record| User::bound(record, endpoint, self.clone()))
            .collect()
    }

    pub async fn user(&self, endpoint: Endpoint, user_id: i64) -> Option<User> {
        let request = ApiRequest::get(format!("users/{user_id}")).query("include", USER_INCLUDE);
        self.fetch_record(endpoint, "user", request, 200)
            .await
            .map(|record| User::bound(record, endpoint, self.clone()))
    }

    pub async fn create_user(&self, endpoint: Endpoint, payload: &CreateUserRequest) -> Option<User> {
        let request = ApiRequest::post("users").json(payload);
        self.fetch_record(endpoint, "create_user", request, 201)
            .await
            .map(|record| User::bound(record, endpoint, self.clone()))
    }

    pub async fn update_user(
        &self,
        endpoint: Endpoint,
        user_id: i64,
        payload: &UpdateUserRequest,
    ) -> Option<User> {
        let request = ApiRequest::patch(format!("users/{user_id}")).json(payload);
        self.fetch_record(endpoint, "update_user", request, 200)
            .await
            .map(|record| User::bound(record, endpoint, self.clone()))
    }

    pub async fn delete_user(&self, endpoint: Endpoint, user_id: i64) -> bool {
        let request = ApiRequest::delete(format!("users/{user_id}"));
        self.action(endpoint, "delete_user", request, 204).await
    }

    // -----------------------------------------------------------------------
    // Servers
    // -----------------------------------------------------------------------

    /// All servers with user+node relationships embedded; the fusion cache
    /// keys these by UUID.
    pub async fn servers(&self, endpoint: Endpoint) -> Vec<AppServerRecord> {
        self.list(endpoint, "servers", "servers", SERVER_INCLUDE).await
    }

    pub async fn server(&self, endpoint: Endpoint, server_id: i64) -> Option<AppServerRecord> {
        let request =
            ApiRequest::get(format!("servers/{server_id}")).query("include", SERVER_INCLUDE);
        self.fetch_record(endpoint, "server", request, 200).await
    }

    pub async fn create_server(
        &self,
        endpoint: Endpoint,
        payload: &CreateServerRequest,
    ) -> Option<AppServerRecord> {
        let request = ApiRequest::post("servers").json(payload);
        self.fetch_record(endpoint, "create_server", request, 201).await
    }

    pub async fn update_server_details(
        &self,
        endpoint: Endpoint,
        server_id: i64,
        payload: &UpdateServerDetailsRequest,
    ) -> Option<AppServerRecord> {
        let request = ApiRequest::patch(format!("servers/{server_id}/details")).json(payload);
        self.fetch_record(endpoint, "update_server_details", request, 200).await
    }

    pub async fn update_server_build(
        &self,
        endpoint: Endpoint,
        server_id: i64,
        payload: &UpdateServerBuildRequest,
    ) -> Option<AppServerRecord> {
        let request = ApiRequest::patch(format!("servers/{server_id}/build")).json(payload);
        self.fetch_record(endpoint, "update_server_build", request, 200).await
    }

    pub async fn update_server_startup(
        &self,
        endpoint: Endpoint,
        server_id: i64,
        payload: &UpdateServerStartupRequest,
    ) -> Option<AppServerRecord> {
        let request = ApiRequest::patch(format!("servers/{server_id}/startup")).json(payload);
        self.fetch_record(endpoint, "update_server_startup", request, 200).await
    }

    pub async fn suspend_server(&self, endpoint: Endpoint, server_id: i64) -> bool {
        let request = ApiRequest::post(format!("servers/{server_id}/suspend"));
        self.action(endpoint, "suspend_server", request, 204).await
    }

    pub async fn unsuspend_server(&self, endpoint: Endpoint, server_id: i64) -> bool {
        let request = ApiRequest::post(format!("servers/{server_id}/unsuspend"));
        self.action(endpoint, "unsuspend_server", request, 204).await
    }

    pub async fn rebuild_server(&self, endpoint: Endpoint, server_id: i64) -> bool {
        let request = ApiRequest::post(format!("servers/{server_id}/rebuild"));
        self.action(endpoint, "rebuild_server", request, 204).await
    }

    pub async fn reinstall_server(&self, endpoint: Endpoint, server_id: i64) -> bool {
        let request = ApiRequest::post(format!("servers/{server_id}/reinstall"));
        self.action(endpoint, "reinstall_server", request, 204).await
    }

    /// Deletes a server; `force` bypasses graceful daemon teardown.
    pub async fn delete_server(&self, endpoint: Endpoint, server_id: i64, force: bool) -> bool {
        let path = if force {
            format!("servers/{server_id}/force")
        } else {
            format!("servers/{server_id}")
        };
        self.action(endpoint, "delete_server", ApiRequest::delete(path), 204).await
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// All nodes as entities, with location+allocations embedded.
    pub async fn nodes(&self, endpoint: Endpoint) -> Vec<Node> {
        self.node_records(endpoint)
            .await
            .into_iter()
            .map(|record| Node::bound(record, endpoint, self.clone()))
            .collect()
    }

    /// Raw node records for the fusion cache.
    pub(crate) async fn node_records(&self, endpoint: Endpoint) -> Vec<NodeRecord> {
        self.list(endpoint, "nodes", "nodes", NODE_INCLUDE).await
    }

    pub async fn node(&self, endpoint: Endpoint, node_id: i64) -> Option<Node> {
        let request = ApiRequest::get(format!("nodes/{node_id}")).query("include", NODE_INCLUDE);
        self.fetch_record(endpoint, "node", request, 200)
            .await
            .map(|record| Node::bound(record, endpoint, self.clone()))
    }

    /// Raw daemon configuration document for a node.
    pub async fn node_configuration(&self, endpoint: Endpoint, node_id: i64) -> Option<Value> {
        let gateway = self.gateway_or_warn(endpoint, "node_configuration")?;
        let response = gateway
            .send(ApiRequest::get(format!("nodes/{node_id}/configuration")))
            .await;
        if response.status != 200 {
            error!(
                endpoint = %endpoint,
                node_id,
                status = response.status,
                body = %response.body,
                "application call failed",
            );
            return None;
        }
        match response.json::<Value>() {
            Ok(config) => Some(config),
            Err(e) => {
                error!(endpoint = %endpoint, node_id, error = %e, "failed to fetch node configuration");
                None
            }
        }
    }

    pub async fn create_node(&self, endpoint: Endpoint, payload: &CreateNodeRequest) -> Option<Node> {
        let request = ApiRequest::post("nodes").json(payload);
        self.fetch_record(endpoint, "create_node", request, 201)
            .await
            .map(|record| Node::bound(record, endpoint, self.clone()))
    }

    pub async fn update_node(
        &self,
        endpoint: Endpoint,
        node_id: i64,
        payload: &UpdateNodeRequest,
    ) -> Option<Node> {
        let request = ApiRequest::patch(format!("nodes/{node_id}")).json(payload);
        self.fetch_record(endpoint, "update_node", request, 200)
            .await
            .map(|record| Node::bound(record, endpoint, self.clone()))
    }

    pub async fn delete_node(&self, endpoint: Endpoint, node_id: i64) -> bool {
        let request = ApiRequest::delete(format!("nodes/{node_id}"));
        self.action(endpoint, "delete_node", request, 204).await
    }

    // -----------------------------------------------------------------------
    // Node allocations
    // -----------------------------------------------------------------------

    pub async fn node_allocations(&self, endpoint: Endpoint, node_id: i64) -> Vec<AllocationRecord> {
        let Some(gateway) = self.gateway_or_warn(endpoint, "node_allocations") else {
            return Vec::new();
        };
        let path = format!("nodes/{node_id}/allocations");
        paginate(gateway.as_ref(), &path, &[], self.inner.page_cap).await
    }

    pub async fn create_allocations(
        &self,
        endpoint: Endpoint,
        node_id: i64,
        payload: &CreateAllocationsRequest,
    ) -> bool {
        let request = ApiRequest::post(format!("nodes/{node_id}/allocations")).json(payload);
        self.action(endpoint, "create_allocations", request, 204).await
    }

    pub async fn delete_allocation(
        &self,
        endpoint: Endpoint,
        node_id: i64,
        allocation_id: i64,
    ) -> bool {
        let request = ApiRequest::delete(format!("nodes/{node_id}/allocations/{allocation_id}"));
        self.action(endpoint, "delete_allocation", request, 204).await
    }

    // -----------------------------------------------------------------------
    // Nests & eggs
    // -----------------------------------------------------------------------

    pub async fn nests(&self, endpoint: Endpoint) -> Vec<Nest> {
        let records: Vec<NestRecord> = self.list(endpoint, "nests", "nests", NEST_INCLUDE).await;
        records
            .into_iter()
            .map(|record| Nest::bound(record, endpoint, self.clone()))
            .collect()
    }

    pub async fn nest(&self, endpoint: Endpoint, nest_id: i64) -> Option<Nest> {
        let request = ApiRequest::get(format!("nests/{nest_id}")).query("include", NEST_INCLUDE);
        self.fetch_record(endpoint, "nest", request, 200)
            .await
            .map(|record| Nest::bound(record, endpoint, self.clone()))
    }

    pub async fn eggs(&self, endpoint: Endpoint, nest_id: i64) -> Vec<EggRecord> {
        let Some(gateway) = self.gateway_or_warn(endpoint, "eggs") else {
            return Vec::new();
        };
        let path = format!("nests/{nest_id}/eggs");
        let query = [("include", EGG_INCLUDE)];
        paginate(gateway.as_ref(), &path, &query, self.inner.page_cap).await
    }

    pub async fn egg(&self, endpoint: Endpoint, nest_id: i64, egg_id: i64) -> Option<EggRecord> {
        let request =
            ApiRequest::get(format!("nests/{nest_id}/eggs/{egg_id}")).query("include", EGG_INCLUDE);
        self.fetch_record(endpoint, "egg", request, 200).await
    }

    // -----------------------------------------------------------------------
    // Locations
    // -----------------------------------------------------------------------

    pub async fn locations(&self, endpoint: Endpoint) -> Vec<LocationRecord> {
        self.list(endpoint, "locations", "locations", LOCATION_INCLUDE).await
    }

    pub async fn location(&self, endpoint: Endpoint, location_id: i64) -> Option<LocationRecord> {
        let request =
            ApiRequest::get(format!("locations/{location_id}")).query("include", LOCATION_INCLUDE);
        self.fetch_record(endpoint, "location", request, 200).await
    }

    pub async fn create_location(
        &self,
        endpoint: Endpoint,
        payload: &CreateLocationRequest,
    ) -> Option<LocationRecord> {
        let request = ApiRequest::post("locations").json(payload);
        self.fetch_record(endpoint, "create_location", request, 201).await
    }

    pub async fn update_location(
        &self,
        endpoint: Endpoint,
        location_id: i64,
        payload: &UpdateLocationRequest,
    ) -> Option<LocationRecord> {
        let request = ApiRequest::patch(format!("locations/{location_id}")).json(payload);
        self.fetch_record(endpoint, "update_location", request, 200).await
    }

    pub async fn delete_location(&self, endpoint: Endpoint, location_id: i64) -> bool {
        let request = ApiRequest::delete(format!("locations/{location_id}"));
        self.action(endpoint, "delete_location", request, 204).await
    }
}
