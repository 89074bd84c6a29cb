use crate::models::tag::Tag;
use serde::{Deserialize, Serialize};

/// Proxy record with its attached tags, as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proxy {
    pub id: i64,
    pub name: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(rename = "type")]
    pub scheme: String,
    pub status: String,
    pub response_time: Option<f64>,
    pub public_ip: Option<String>,
    pub location: Option<String>,
    pub fail_count: i64,
    pub last_tested: Option<String>,
    pub last_used_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub tags: Vec<Tag>,
}

impl Proxy {
    /// Render as a `scheme://[user:pass@]host:port` line
    pub fn as_url_line(&self) -> String {
        let auth = if !self.username.is_empty() && !self.password.is_empty() {
            format!("{}:{}@", self.username, self.password)
        } else {
            String::new()
        };
        format!("{}://{}{}:{}", self.scheme, auth, self.host, self.port)
    }
}

pub const VALID_SCHEMES: [&str; 4] = ["http", "https", "socks4", "socks5"];
pub const VALID_STATUSES: [&str; 3] = ["pending", "live", "dead"];

/// Fields accepted when creating or updating a proxy
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyInput {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "type", default = "default_scheme")]
    pub scheme: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

fn default_scheme() -> String {
    "http".to_string()
}

impl ProxyInput {
    /// Host/port/scheme validation shared by add and update
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Host and port are required".to_string());
        }

        if !self
            .host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err("Invalid host format".to_string());
        }

        if self.port == 0 {
            return Err("Port must be between 1-65535".to_string());
        }

        if !VALID_SCHEMES.contains(&self.scheme.as_str()) {
            return Err("Invalid proxy type".to_string());
        }

        Ok(())
    }

    /// Display name falls back to host:port
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("{}:{}", self.host.trim(), self.port))
    }
}
