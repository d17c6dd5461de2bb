//! Connectivity reports for the MCP server.

use serde::{Deserialize, Serialize};

/// Overall health verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// What the health probe observed about the MCP server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    Connected,
    EmptyResponse,
    InvalidResponse,
    Initializing,
    Error,
    Unreachable,
    ConnectionFailed,
}

/// Result of a `tools/list` health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,

    pub mcp_server: ServerState,

    pub server_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tools: Option<usize>,

    /// Up to the first five tool names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    /// Number of tool names reported in a healthy probe
    pub const MAX_LISTED_TOOLS: usize = 5;

    /// A healthy report listing the server's tools
    pub fn healthy(server_url: impl Into<String>, tool_names: Vec<String>) -> Self {
        let available = tool_names.len();
        Self {
            status: HealthStatus::Healthy,
            mcp_server: ServerState::Connected,
            server_url: server_url.into(),
            available_tools: Some(available),
            tools: tool_names
                .into_iter()
                .take(Self::MAX_LISTED_TOOLS)
                .collect(),
            status_code: None,
            error: None,
        }
    }

    /// An unhealthy report
    pub fn unhealthy(
        server_url: impl Into<String>,
        state: ServerState,
        error: Option<String>,
    ) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            mcp_server: state,
            server_url: server_url.into(),
            available_tools: None,
            tools: Vec::new(),
            status_code: None,
            error,
        }
    }

    /// Attach the HTTP status code that made the server unreachable
    pub fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Whether the probe succeeded
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Session connectivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Whether a session with the MCP server could be established
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub status: ConnectionState,

    pub message: String,

    /// Shortened session id (first 8 characters followed by `...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    pub server_url: String,
}

impl SessionStatus {
    /// Build a status from an optional session id
    pub fn from_session(server_url: impl Into<String>, session_id: Option<&str>) -> Self {
        match session_id {
            Some(id) => Self {
                status: ConnectionState::Connected,
                message: "MCP Server Connected".to_string(),
                session_id: Some(shorten_session_id(id)),
                server_url: server_url.into(),
            },
            None => Self {
                status: ConnectionState::Disconnected,
                message: "MCP Server Disconnected".to_string(),
                session_id: None,
                server_url: server_url.into(),
            },
        }
    }
}

fn shorten_session_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("{}...", prefix)
}
