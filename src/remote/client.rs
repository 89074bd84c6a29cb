use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::error;

use crate::core::config::RemoteConfig;

/// Client for the upstream account service. Every call resolves to a
/// [`RemoteReply`] so handlers can always produce a response, even when
/// the upstream is unreachable.
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
}

/// Outcome of one upstream call. `offline` is set for network failures
/// and upstream 5xx responses so callers can fall back to local data.
#[derive(Debug)]
pub struct RemoteReply {
    pub success: bool,
    pub status_code: u16,
    pub data: Value,
    pub offline: bool,
}

impl RemoteReply {
    fn from_parts(status: reqwest::StatusCode, data: Value) -> Self {
        let body_success = data
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(status.is_success());
        Self {
            success: status.is_success() && body_success,
            status_code: status.as_u16(),
            data,
            offline: status.is_server_error(),
        }
    }

    fn unreachable() -> Self {
        Self {
            success: false,
            status_code: 0,
            data: json!({"message": "Upstream server is unavailable"}),
            offline: true,
        }
    }
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json(&self, path: &str, payload: &Value) -> RemoteReply {
        let url = format!("{}{}", self.base_url, path);
        match self.client.post(&url).json(payload).send().await {
            Ok(response) => {
                let status = response.status();
                let data = response.json::<Value>().await.unwrap_or(Value::Null);
                RemoteReply::from_parts(status, data)
            }
            Err(e) => {
                error!(url = %url, error = %e, "upstream request failed");
                RemoteReply::unreachable()
            }
        }
    }

    async fn get_json(&self, path: &str) -> RemoteReply {
        let url = format!("{}{}", self.base_url, path);
        match self.client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                let data = response.json::<Value>().await.unwrap_or(Value::Null);
                RemoteReply::from_parts(status, data)
            }
            Err(e) => {
                error!(url = %url, error = %e, "upstream request failed");
                RemoteReply::unreachable()
            }
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> RemoteReply {
        self.post_json("/register", &json!({"email": email, "password": password}))
            .await
    }

    pub async fn get_plans(&self) -> RemoteReply {
        self.get_json("/api/info/plans").await
    }

    pub async fn get_system_info(&self) -> RemoteReply {
        self.get_json("/api/info/system").await
    }
}
