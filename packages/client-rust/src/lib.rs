//! `Roost` Client -- typed async client for game-server panel deployments.
//!
//! A panel installation exposes two HTTP tiers: the client tier, scoped to
//! the servers a user account can see, and the application tier, the
//! administrative surface over users, nodes, locations, nests, and eggs.
//! Deployments here come in pairs, a primary (`main`) and a container-hosted
//! secondary (`oci`), each with its own base URL and credentials.
//!
//! [`PanelRegistry`] is the entry point. It owns one gateway per configured
//! tier/endpoint combination, fans client reads out across endpoints, and
//! fuses application-tier detail (node, owning user, administrative server
//! record) onto client-tier results through a snapshot cache.
//!
//! ```no_run
//! use roost_client::{Credentials, PanelConfig, PanelRegistry};
//!
//! # async fn example() {
//! let mut config = PanelConfig::new("https://panel.example.com", "https://oci.example.com");
//! config.credentials = Credentials {
//!     client_main: Some("ptlc_...".into()),
//!     ..Credentials::default()
//! };
//!
//! let registry = PanelRegistry::new(&config);
//! for server in registry.get_servers(false).await {
//!     println!("{} on {}", server.identifier(), server.endpoint);
//! }
//! registry.close().await;
//! # }
//! ```

pub mod application;
pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod paginate;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use application::ApplicationApi;
pub use cache::{FusedData, FusionCache, NodeKey};
pub use config::{Credentials, PanelConfig};
pub use entity::{ClientServer, Nest, Node, User};
pub use error::Error;
pub use gateway::{ApiRequest, ApiResponse, Endpoint, Gateway, HttpGateway, Method, Tier};
pub use registry::PanelRegistry;
