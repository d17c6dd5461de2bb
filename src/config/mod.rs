//! Configuration management.
//!
//! The adapter takes a [`ClientConfig`] value and never reads the environment
//! itself. Values can come from defaults, from `MCP_`-prefixed environment
//! variables, or from a configuration file:
//!
//! ```toml
//! server_url = "http://localhost:8080"
//! endpoint_path = "/mcp"
//! protocol_version = "2024-11-05"
//! call_timeout_secs = 30
//! probe_timeout_secs = 5
//! max_retries = 3
//! retry_base_delay_ms = 500
//! init_settle_delay_ms = 250
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mcp::protocol::DEFAULT_PROTOCOL_VERSION;

/// Config file name looked up by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "video-search-mcp.toml";

/// MCP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the MCP server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Path of the single MCP endpoint
    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,

    /// MCP protocol version sent during the handshake and on every call
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// Client name sent during the handshake
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Client version sent during the handshake
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Timeout for `tools/call` requests
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Timeout for the handshake and health probes
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Attempts per tool call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit between attempts
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Pause after the handshake before the session is used
    #[serde(default = "default_init_settle_delay")]
    pub init_settle_delay_ms: u64,
}

impl ClientConfig {
    /// Configuration for `server_url` with built-in defaults
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            endpoint_path: default_endpoint_path(),
            protocol_version: default_protocol_version(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            call_timeout_secs: default_call_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
            init_settle_delay_ms: default_init_settle_delay(),
        }
    }

    /// Set the retry budget
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff unit
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the post-handshake pause
    pub fn init_settle_delay(mut self, delay: Duration) -> Self {
        self.init_settle_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the protocol version
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Full URL of the MCP endpoint
    pub fn endpoint_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let path = self.endpoint_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.init_settle_delay_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(default_server_url())
    }
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_endpoint_path() -> String {
    "/mcp".to_string()
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

fn default_client_name() -> String {
    "search-via-mcp".to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_call_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    500
}

fn default_init_settle_delay() -> u64 {
    250
}

/// Load configuration from a file, with `MCP_*` environment overrides
pub fn load_config(path: &Path) -> Result<ClientConfig, config::ConfigError> {
    build_config(Some(path), mcp_environment())
}

/// Load configuration from defaults and `MCP_*` environment variables
pub fn get_config() -> Result<ClientConfig, config::ConfigError> {
    build_config(None, mcp_environment())
}

fn mcp_environment() -> config::Environment {
    config::Environment::with_prefix("MCP")
}

fn build_config(
    path: Option<&Path>,
    environment: config::Environment,
) -> Result<ClientConfig, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder.add_source(environment).build()?;

    settings.try_deserialize()
}

/// Look for a config file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("video-search-mcp").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_new_config_defaults() {
        let config = ClientConfig::new("http://localhost:9000");
        assert_eq!(config.protocol_version, "2024-11-05");
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay(), Duration::from_millis(500));
        assert_eq!(config.settle_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        assert_eq!(
            ClientConfig::new("http://localhost:8080/").endpoint_url(),
            "http://localhost:8080/mcp"
        );
        assert_eq!(
            ClientConfig::new("http://localhost:8080").endpoint_url(),
            "http://localhost:8080/mcp"
        );
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new("http://x")
            .max_retries(5)
            .retry_base_delay(Duration::from_millis(10))
            .init_settle_delay(Duration::ZERO)
            .protocol_version("2025-03-26");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_base_delay_ms, 10);
        assert_eq!(config.init_settle_delay_ms, 0);
        assert_eq!(config.protocol_version, "2025-03-26");
    }

    #[test]
    fn test_load_config_file() {
        let dir = std::env::temp_dir().join(format!("video-search-mcp-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "server_url = \"http://mcp.internal:9000\"").unwrap();
        writeln!(file, "max_retries = 5").unwrap();
        drop(file);

        let config = load_config(&path).unwrap();
        assert_eq!(config.server_url, "http://mcp.internal:9000");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.endpoint_path, "/mcp");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("MCP").source(Some(source))
    }

    #[test]
    fn test_environment_without_file() {
        let config = build_config(
            None,
            environment(&[
                ("MCP_SERVER_URL", "http://mcp.internal:9000"),
                ("MCP_MAX_RETRIES", "7"),
                ("MCP_INIT_SETTLE_DELAY_MS", "0"),
                ("OTHER_MAX_RETRIES", "1"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server_url, "http://mcp.internal:9000");
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.protocol_version, "2024-11-05");
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = std::env::temp_dir().join(format!(
            "video-search-mcp-env-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "max_retries = 5\ncall_timeout_secs = 10\n").unwrap();

        let config =
            build_config(Some(&path), environment(&[("MCP_MAX_RETRIES", "2")])).unwrap();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.call_timeout(), Duration::from_secs(10));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_default_ignores_environment() {
        assert_eq!(ClientConfig::default(), ClientConfig::new("http://localhost:8080"));
    }
}
