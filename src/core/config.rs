use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub proxy_check: ProxyCheckConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

/// Token issuance settings. The secret and expiry are always taken from
/// here, never from ambient process state.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret_key: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_token_expiry_minutes")]
    pub token_expiry_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    #[serde(default = "default_remote_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyCheckConfig {
    #[serde(default = "default_test_urls")]
    pub test_urls: Vec<String>,
    #[serde(default = "default_proxy_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_concurrent_tests")]
    pub max_concurrent_tests: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_login_attempts_per_minute: default_max_login_attempts(),
        }
    }
}

impl Default for ProxyCheckConfig {
    fn default() -> Self {
        Self {
            test_urls: default_test_urls(),
            timeout_seconds: default_proxy_timeout(),
            max_concurrent_tests: default_max_concurrent_tests(),
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    8000
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("logingate.db")
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_token_expiry_minutes() -> u64 {
    1440 // 24 hours
}

fn default_remote_timeout() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

fn default_max_login_attempts() -> u32 {
    10
}

fn default_test_urls() -> Vec<String> {
    vec![
        "https://httpbin.org/ip".to_string(),
        "https://api.ipify.org?format=json".to_string(),
        "https://ifconfig.me/ip".to_string(),
    ]
}

fn default_proxy_timeout() -> u64 {
    15
}

fn default_max_concurrent_tests() -> usize {
    5
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate server config
        if self.server.port == 0 {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        // Validate auth config
        if self.auth.secret_key.is_empty() {
            bail!("auth.secret_key must not be empty");
        }

        if self.auth.secret_key.len() < 16 {
            bail!("auth.secret_key must be at least 16 characters");
        }

        let valid_algorithms = ["HS256", "HS384", "HS512"];
        if !valid_algorithms.contains(&self.auth.algorithm.as_str()) {
            bail!(
                "Invalid token algorithm '{}'. Must be one of: HS256, HS384, HS512",
                self.auth.algorithm
            );
        }

        if self.auth.token_expiry_minutes == 0 {
            bail!("auth.token_expiry_minutes must be greater than 0");
        }

        // Validate remote config
        if self.remote.base_url.is_empty() {
            bail!("remote.base_url must not be empty");
        }

        if !self.remote.base_url.starts_with("http://")
            && !self.remote.base_url.starts_with("https://")
        {
            bail!("remote.base_url must start with http:// or https://");
        }

        if self.remote.timeout_seconds == 0 {
            bail!("remote.timeout_seconds must be greater than 0");
        }

        // Validate security config
        if self.security.max_login_attempts_per_minute == 0 {
            bail!("max_login_attempts_per_minute must be greater than 0");
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        // Validate proxy check config
        if self.proxy_check.test_urls.is_empty() {
            bail!("proxy_check.test_urls must not be empty");
        }

        if self.proxy_check.timeout_seconds == 0 {
            bail!("proxy_check.timeout_seconds must be greater than 0");
        }

        if self.proxy_check.max_concurrent_tests == 0 {
            bail!("proxy_check.max_concurrent_tests must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[server]
port = 8000

[database]
path = "test.db"

[auth]
secret_key = "a-secret-long-enough-for-tests"

[remote]
base_url = "https://auth.example.com"

[logging]
level = "info"
format = "json"
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config() {
        let file = write_config(MINIMAL);
        let config = Config::from_file(&file.path().to_path_buf()).expect("Failed to load config");

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.auth.algorithm, "HS256");
        assert_eq!(config.auth.token_expiry_minutes, 1440);
        assert_eq!(config.remote.timeout_seconds, 15);
        assert_eq!(config.security.max_login_attempts_per_minute, 10);
        assert_eq!(config.proxy_check.test_urls.len(), 3);
        assert_eq!(config.proxy_check.max_concurrent_tests, 5);
    }

    #[test]
    fn test_reject_short_secret() {
        let content = MINIMAL.replace("a-secret-long-enough-for-tests", "short");
        let file = write_config(&content);
        assert!(Config::from_file(&file.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_reject_unknown_algorithm() {
        let content = MINIMAL.replace(
            "secret_key = \"a-secret-long-enough-for-tests\"",
            "secret_key = \"a-secret-long-enough-for-tests\"\nalgorithm = \"RS256\"",
        );
        let file = write_config(&content);
        assert!(Config::from_file(&file.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_reject_bad_remote_url() {
        let content = MINIMAL.replace("https://auth.example.com", "auth.example.com");
        let file = write_config(&content);
        assert!(Config::from_file(&file.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_reject_invalid_log_level() {
        let content = MINIMAL.replace("level = \"info\"", "level = \"verbose\"");
        let file = write_config(&content);
        assert!(Config::from_file(&file.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_security_config_default() {
        let security = SecurityConfig::default();
        assert_eq!(security.max_login_attempts_per_minute, 10);
    }
}
