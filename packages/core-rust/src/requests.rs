//! Typed request payloads for create/update operations.
//!
//! Update payloads model the panel's partial-update semantics: every field is
//! optional and absent fields are omitted from the serialized body, so the
//! panel leaves them untouched.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::records::server::{FeatureLimits, Limits};

/// Body for `POST application/users`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Body for `PATCH application/users/{id}`. All fields optional.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Body for `POST application/locations`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateLocationRequest {
    /// Short code, e.g. `"eu"`.
    pub short: String,
    /// Human-readable description.
    pub long: String,
}

/// Body for `PATCH application/locations/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateLocationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
}

/// Body for `POST application/nodes`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateNodeRequest {
    pub name: String,
    pub location_id: i64,
    pub fqdn: String,
    /// Daemon connection scheme, `"http"` or `"https"`.
    pub scheme: String,
    pub memory: i64,
    pub memory_overallocate: i64,
    pub disk: i64,
    pub disk_overallocate: i64,
    pub upload_size: i64,
    pub daemon_listen: i64,
    pub daemon_sftp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body for `PATCH application/nodes/{id}`. All fields optional.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateNodeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_overallocate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_overallocate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_listen: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_sftp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_mode: Option<bool>,
}

/// Allocation selection inside a [`CreateServerRequest`].
#[derive(Debug, Clone, Serialize)]
pub struct ServerAllocationRequest {
    /// Id of the primary allocation.
    pub default: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional: Vec<i64>,
}

/// Body for `POST application/servers`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub name: String,
    /// Numeric id of the owning user.
    pub user: i64,
    pub egg: i64,
    pub docker_image: String,
    pub startup: String,
    /// Startup environment variables.
    pub environment: HashMap<String, Value>,
    pub limits: Limits,
    pub feature_limits: FeatureLimits,
    pub allocation: ServerAllocationRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_on_completion: Option<bool>,
}

/// Body for `PATCH application/servers/{id}/details`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateServerDetailsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body for `PATCH application/servers/{id}/build`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateServerBuildRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_limits: Option<FeatureLimits>,
}

/// Body for `PATCH application/servers/{id}/startup`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateServerStartupRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egg: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_scripts: Option<bool>,
}

/// Body for `POST application/nodes/{id}/allocations`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAllocationsRequest {
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Port expressions, e.g. `"25565"` or `"25570-25580"`.
    pub ports: Vec<String>,
}

/// Power action accepted by the client tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSignal {
    Start,
    Stop,
    Restart,
    Kill,
}

/// Body for `POST client/servers/{id}/power`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PowerRequest {
    pub signal: PowerSignal,
}

/// Body for `POST client/servers/{id}/command`.
#[derive(Debug, Clone, Serialize)]
pub struct SendCommandRequest {
    pub command: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn update_user_omits_absent_fields() {
        let body = UpdateUserRequest {
            email: Some("new@example.com".to_string()),
            ..UpdateUserRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"email": "new@example.com"})
        );
    }

    #[test]
    fn empty_update_serializes_to_empty_object() {
        let body = UpdateServerBuildRequest::default();
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({}));
    }

    #[test]
    fn create_server_omits_empty_additional_allocations() {
        let body = CreateServerRequest {
            name: "lobby".to_string(),
            user: 3,
            egg: 5,
            docker_image: "ghcr.io/example/java:17".to_string(),
            startup: "java -jar server.jar".to_string(),
            environment: HashMap::new(),
            limits: Limits::default(),
            feature_limits: FeatureLimits::default(),
            allocation: ServerAllocationRequest {
                default: 41,
                additional: Vec::new(),
            },
            description: None,
            external_id: None,
            start_on_completion: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["allocation"], json!({"default": 41}));
        assert!(value.get("description").is_none());
    }

    #[test]
    fn power_signal_serializes_lowercase() {
        let body = PowerRequest {
            signal: PowerSignal::Restart,
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"signal": "restart"})
        );
    }
}
