//! Shared fakes and response builders for unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::gateway::{ApiRequest, ApiResponse, Endpoint, Gateway, Tier};

type Handler = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

/// Installs a fmt subscriber honoring `RUST_LOG` for debugging test runs.
/// Safe to call from multiple tests; only the first call installs.
#[allow(dead_code)]
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory gateway driven by a response handler closure.
///
/// Records every request and optionally sleeps before answering so that
/// paused-clock tests can exercise probe timeouts deterministically.
pub(crate) struct FakeGateway {
    endpoint: Endpoint,
    tier: Tier,
    delay: Option<Duration>,
    calls: AtomicU32,
    requests: Mutex<Vec<ApiRequest>>,
    handler: Handler,
}

impl FakeGateway {
    pub fn new(
        endpoint: Endpoint,
        tier: Tier,
        handler: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            endpoint,
            tier,
            delay: None,
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        })
    }

    /// Like [`FakeGateway::new`], but every response is delayed.
    pub fn with_delay(
        endpoint: Endpoint,
        tier: Tier,
        delay: Duration,
        handler: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            endpoint,
            tier,
            delay: Some(delay),
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    async fn send(&self, request: ApiRequest) -> ApiResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(&request)
    }
}

// ---------------------------------------------------------------------------
// Response builders
// ---------------------------------------------------------------------------

/// 200 list envelope wrapping the given attribute records.
pub(crate) fn list_response(records: &[Value], current_page: u32, total_pages: u32) -> ApiResponse {
    let data: Vec<Value> = records
        .iter()
        .map(|attributes| json!({"object": "record", "attributes": attributes}))
        .collect();
    let body = json!({
        "object": "list",
        "data": data,
        "meta": {"pagination": {
            "total": records.len(),
            "count": records.len(),
            "per_page": 50,
            "current_page": current_page,
            "total_pages": total_pages,
        }},
    });
    ApiResponse::new(200, body.to_string())
}

/// 200 single-object envelope wrapping the given attributes.
pub(crate) fn record_response(attributes: Value) -> ApiResponse {
    ApiResponse::new(200, json!({"object": "record", "attributes": attributes}).to_string())
}

pub(crate) fn client_server_attrs(identifier: &str, uuid: &str, node: i64) -> Value {
    json!({
        "identifier": identifier,
        "uuid": uuid,
        "name": format!("server {identifier}"),
        "node": node,
    })
}

pub(crate) fn node_attrs(id: i64) -> Value {
    json!({"id": id, "name": format!("node-{id}"), "location_id": 1})
}

pub(crate) fn app_server_attrs(uuid: &str, node: i64, user_id: i64) -> Value {
    json!({
        "id": node * 100,
        "uuid": uuid,
        "identifier": uuid,
        "name": format!("server {uuid}"),
        "user": user_id,
        "node": node,
        "relationships": {
            "user": {"object": "user", "attributes": {
                "id": user_id,
                "username": format!("user{user_id}"),
                "email": format!("user{user_id}@example.com"),
            }},
        },
    })
}

pub(crate) fn resources_attrs() -> Value {
    json!({
        "current_state": "running",
        "resources": {
            "memory_bytes": 1024,
            "cpu_absolute": 5.0,
            "disk_bytes": 2048,
            "network_rx_bytes": 1,
            "network_tx_bytes": 2,
            "uptime": 1000,
        },
    })
}
