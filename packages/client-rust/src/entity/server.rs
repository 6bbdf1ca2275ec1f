//! Client-tier server entity with fused application-tier data.

use std::sync::Arc;

use tracing::error;

use roost_core::envelope::Envelope;
use roost_core::records::{AppServerRecord, ClientServerRecord, NodeRecord, ResourceUsageRecord};
use roost_core::requests::{PowerRequest, PowerSignal, SendCommandRequest};

use crate::cache::FusedData;
use crate::entity::User;
use crate::gateway::{ApiRequest, Endpoint, Gateway};

/// A server as seen through the client tier, enriched with whatever
/// application-tier data fused onto it.
///
/// The origin endpoint is part of the server's identity: every follow-up
/// operation is routed through the gateway of the deployment that produced
/// the record.
#[derive(Clone)]
pub struct ClientServer {
    pub record: ClientServerRecord,
    /// Deployment that answered for this server.
    pub endpoint: Endpoint,
    /// Owning node, when the fusion cache had a match.
    pub node: Option<NodeRecord>,
    /// Full application-tier record, when the fusion cache had a match.
    pub app_server: Option<AppServerRecord>,
    /// Owning user materialized from the fused server's relationship.
    pub owner: Option<User>,
    /// Live utilization, populated by [`ClientServer::hydrate`].
    pub resources: Option<ResourceUsageRecord>,
    gateway: Arc<dyn Gateway>,
}

impl ClientServer {
    pub(crate) fn new(
        record: ClientServerRecord,
        endpoint: Endpoint,
        gateway: Arc<dyn Gateway>,
        fused: FusedData,
    ) -> Self {
        Self {
            record,
            endpoint,
            node: fused.node,
            app_server: fused.app_server,
            owner: fused.owner,
            resources: None,
            gateway,
        }
    }

    /// Short identifier used in client-tier paths.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.record.identifier
    }

    /// Globally unique UUID shared with the application tier.
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.record.uuid
    }

    /// Fetches the current live utilization snapshot.
    pub async fn live_resources(&self) -> Option<ResourceUsageRecord> {
        let path = format!("servers/{}/resources", self.record.identifier);
        let response = self.gateway.send(ApiRequest::get(path)).await;
        match response.json::<Envelope<ResourceUsageRecord>>() {
            Ok(envelope) => Some(envelope.attributes),
            Err(e) => {
                error!(
                    identifier = %self.record.identifier,
                    endpoint = %self.endpoint,
                    error = %e,
                    "failed to fetch live resources",
                );
                None
            }
        }
    }

    /// Populates [`ClientServer::resources`] with a live snapshot, dropping
    /// the entity entirely when no live data is available.
    pub(crate) async fn hydrate(mut self) -> Option<Self> {
        match self.live_resources().await {
            Some(resources) => {
                self.resources = Some(resources);
                Some(self)
            }
            None => {
                error!(
                    identifier = %self.record.identifier,
                    endpoint = %self.endpoint,
                    "dropping server without live resource data",
                );
                None
            }
        }
    }

    /// Sends a power signal. True iff the daemon acknowledged (204).
    pub async fn power(&self, signal: PowerSignal) -> bool {
        let path = format!("servers/{}/power", self.record.identifier);
        let request = ApiRequest::post(path).json(&PowerRequest { signal });
        let response = self.gateway.send(request).await;
        if response.status == 204 {
            true
        } else {
            error!(
                identifier = %self.record.identifier,
                endpoint = %self.endpoint,
                status = response.status,
                "power signal failed",
            );
            false
        }
    }

    /// Sends a console command. True iff the daemon acknowledged (204).
    pub async fn send_command(&self, command: &str) -> bool {
        let path = format!("servers/{}/command", self.record.identifier);
        let request = ApiRequest::post(path).json(&SendCommandRequest {
            command: command.to_string(),
        });
        let response = self.gateway.send(request).await;
        if response.status == 204 {
            true
        } else {
            error!(
                identifier = %self.record.identifier,
                endpoint = %self.endpoint,
                status = response.status,
                "console command failed",
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::gateway::{ApiResponse, Tier};
    use crate::testing::{client_server_attrs, record_response, resources_attrs, FakeGateway};

    use super::*;

    fn record() -> ClientServerRecord {
        serde_json::from_value(client_server_attrs("a1b2", "uuid-a1b2", 7)).unwrap()
    }

    #[tokio::test]
    async fn hydrate_populates_live_resources() {
        let gateway = FakeGateway::new(Endpoint::Main, Tier::Client, |request| {
            assert_eq!(request.path, "servers/a1b2/resources");
            record_response(resources_attrs())
        });
        let server = ClientServer::new(record(), Endpoint::Main, gateway, FusedData::empty());
        let server = server.hydrate().await.unwrap();
        assert_eq!(server.resources.unwrap().current_state, "running");
    }

    #[tokio::test]
    async fn hydrate_drops_server_when_resources_unavailable() {
        let gateway = FakeGateway::new(Endpoint::Main, Tier::Client, |_| {
            ApiResponse::new(500, "daemon offline")
        });
        let server = ClientServer::new(record(), Endpoint::Main, gateway, FusedData::empty());
        assert!(server.hydrate().await.is_none());
    }

    #[tokio::test]
    async fn power_sends_signal_to_origin_endpoint_gateway() {
        let gateway = FakeGateway::new(Endpoint::Oci, Tier::Client, |request| {
            assert_eq!(request.path, "servers/a1b2/power");
            assert_eq!(request.body.as_ref().unwrap(), &json!({"signal": "start"}));
            ApiResponse::new(204, "")
        });
        let server = ClientServer::new(record(), Endpoint::Oci, gateway.clone(), FusedData::empty());
        assert!(server.power(PowerSignal::Start).await);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn rejected_command_is_false() {
        let gateway = FakeGateway::new(Endpoint::Main, Tier::Client, |_| {
            ApiResponse::new(502, "daemon unreachable")
        });
        let server = ClientServer::new(record(), Endpoint::Main, gateway, FusedData::empty());
        assert!(!server.send_command("say hello").await);
    }
}
