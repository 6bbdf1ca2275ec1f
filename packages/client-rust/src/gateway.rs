//! Endpoint gateways: one HTTP session per tier × backend deployment.
//!
//! A gateway is bound to exactly one capacity tier (client or application)
//! and one backend deployment (main or oci). It issues single requests and
//! normalizes transport failures into a synthetic [`ApiResponse`] so every
//! caller branches on status codes through one channel instead of two.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::Error;

// ---------------------------------------------------------------------------
// Endpoint / Tier
// ---------------------------------------------------------------------------

/// Backend deployment serving the panel API.
///
/// Both deployments expose the same tiers; a record's origin endpoint is part
/// of its identity and determines where follow-up operations are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Main,
    Oci,
}

impl Endpoint {
    /// Probe/fan-out order: main is always tried or listed first.
    pub const ALL: [Endpoint; 2] = [Endpoint::Main, Endpoint::Oci];
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Main => f.write_str("main"),
            Endpoint::Oci => f.write_str("oci"),
        }
    }
}

/// API capacity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Self-service surface scoped to one operator's servers.
    Client,
    /// Administrative surface spanning users, nodes, locations, nests, eggs.
    Application,
}

impl Tier {
    /// Path segment under the API root for this tier.
    #[must_use]
    pub fn path_prefix(self) -> &'static str {
        match self {
            Tier::Client => "client",
            Tier::Application => "application",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_prefix())
    }
}

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// HTTP method subset used by the panel API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
            Method::Patch => f.write_str("PATCH"),
            Method::Delete => f.write_str("DELETE"),
        }
    }
}

/// One request against a gateway, with a path relative to the tier root.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path under the tier prefix, e.g. `"servers/a1b2c3d4"`. Empty string
    /// addresses the tier root itself (the client-tier server list).
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attaches a JSON body serialized from the given payload.
    #[must_use]
    pub fn json<T: Serialize>(mut self, payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(value) => self.body = Some(value),
            // Our payload types serialize infallibly; a failure here is a
            // programmer error in the payload definition.
            Err(e) => error!(path = %self.path, error = %e, "failed to serialize request body"),
        }
        self
    }

    /// The value of the `page` query parameter, if any. Used by fakes in tests.
    #[cfg(test)]
    pub(crate) fn page(&self) -> Option<u32> {
        self.query
            .iter()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
    }
}

/// Uniform response carrying a status code and raw body text.
///
/// Transport-level failures are represented as a synthetic response with
/// status [`ApiResponse::TRANSPORT_FAILURE`] and the error message as body,
/// so downstream logic needs only status-code branching.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Synthetic status for requests that never produced an HTTP response.
    pub const TRANSPORT_FAILURE: u16 = 0;

    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Builds the synthetic response for a network/timeout failure.
    #[must_use]
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            status: Self::TRANSPORT_FAILURE,
            body: message.into(),
        }
    }

    /// True for any 2xx status.
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self.status, 200..=299)
    }

    /// Decodes the body as `T`, mapping failure states to the error taxonomy:
    /// synthetic transport responses, non-2xx statuses, and malformed bodies
    /// each yield their own variant.
    ///
    /// # Errors
    ///
    /// `Error::Transport` for synthetic responses, `Error::Upstream` for
    /// non-2xx statuses, `Error::Decode` for schema mismatches.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        match self.status {
            Self::TRANSPORT_FAILURE => Err(Error::Transport(self.body.clone())),
            200..=299 => serde_json::from_str(&self.body).map_err(Error::from),
            status => Err(Error::Upstream {
                status,
                body: self.body.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// One HTTP session bound to one tier × endpoint combination.
///
/// Wrapped in `Arc<dyn Gateway>` so registries, entities, and test fakes can
/// share sessions across async boundaries. Disabled combinations are
/// represented as absent gateways, never as gateways that fail.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Backend deployment this gateway is bound to.
    fn endpoint(&self) -> Endpoint;

    /// Capacity tier this gateway is bound to.
    fn tier(&self) -> Tier;

    /// Issues a single request. Never returns a transport error: network
    /// failures become a synthetic [`ApiResponse`].
    async fn send(&self, request: ApiRequest) -> ApiResponse;

    /// Releases the underlying session. Idempotent; default is a no-op
    /// because pooled HTTP clients close on drop.
    async fn close(&self) {}
}

// ---------------------------------------------------------------------------
// HttpGateway
// ---------------------------------------------------------------------------

/// Production gateway over a pooled `reqwest` client with bearer auth.
pub struct HttpGateway {
    http: reqwest::Client,
    /// Base URL including the tier prefix, no trailing slash.
    base: String,
    endpoint: Endpoint,
    tier: Tier,
}

impl HttpGateway {
    /// Builds a gateway for one tier × endpoint with a static bearer token.
    ///
    /// # Errors
    ///
    /// `Error::Configuration` when the token is not a valid header value or
    /// the HTTP client cannot be constructed.
    pub fn new(
        endpoint: Endpoint,
        tier: Tier,
        base_url: &str,
        token: &str,
        request_timeout: Duration,
    ) -> Result<Arc<Self>, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::Configuration(format!("invalid bearer token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build http client: {e}")))?;

        Ok(Arc::new(Self {
            http,
            base: format!("{}/{}", base_url.trim_end_matches('/'), tier.path_prefix()),
            endpoint,
            tier,
        }))
    }

    fn url_for(&self, path: &str) -> String {
        if path.is_empty() {
            self.base.clone()
        } else {
            format!("{}/{}", self.base, path)
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    async fn send(&self, request: ApiRequest) -> ApiResponse {
        let url = self.url_for(&request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, &url).query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    endpoint = %self.endpoint,
                    tier = %self.tier,
                    path = %request.path,
                    error = %e,
                    "transport failure",
                );
                return ApiResponse::transport_failure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => ApiResponse::new(status, body),
            Err(e) => {
                warn!(
                    endpoint = %self.endpoint,
                    tier = %self.tier,
                    path = %request.path,
                    error = %e,
                    "failed to read response body",
                );
                ApiResponse::transport_failure(e.to_string())
            }
        }
    }
}
