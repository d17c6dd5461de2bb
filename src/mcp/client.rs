//! MCP tool invoker.
//!
//! [`McpClient`] is what the presentation layer talks to. It obtains a
//! session, posts `tools/call`, classifies the reply, retries transient
//! failures with linear backoff and normalizes the payload. Every path ends
//! in a [`ToolOutcome`]; nothing is raised past this boundary.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::decode::decode;
use super::protocol::{
    CallToolResult, JsonRpcRequest, JsonRpcResponse, ListToolsResult, RequestIds, ToolDescriptor,
};
use super::session::{SessionManager, SessionState, SessionStore};
use super::transport::{HttpTransport, McpTransport, RequestHeaders, TransportError};
use crate::config::ClientConfig;
use crate::error::{classify_rpc_error, CallError};
use crate::models::{HealthReport, SearchTool, ServerState, SessionStatus, ToolOutcome};
use crate::normalize::Normalizer;
use crate::utils::{with_retry, RetryPolicy};

/// Default `max_results` argument for [`McpClient::search`]
pub const DEFAULT_MAX_RESULTS: u32 = 25;

/// Client for one MCP server
#[derive(Debug)]
pub struct McpClient {
    config: ClientConfig,
    transport: Arc<dyn McpTransport>,
    sessions: SessionManager,
    ids: Arc<RequestIds>,
    normalizer: Normalizer,
}

impl McpClient {
    /// Create a client that talks HTTP to `config.endpoint_url()`
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::new(config.endpoint_url())?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over any transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn McpTransport>) -> Self {
        let ids = Arc::new(RequestIds::new());
        let sessions = SessionManager::with_store(
            transport.clone(),
            Arc::new(SessionStore::new()),
            ids.clone(),
            &config,
        );

        Self {
            config,
            transport,
            sessions,
            ids,
            normalizer: Normalizer::default(),
        }
    }

    /// Replace the normalization chain
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session manager
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Call `name` with the configured retry budget
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolOutcome {
        self.call_tool_with_retries(name, arguments, self.config.max_retries)
            .await
    }

    /// Call `name` with at most `max_retries` attempts
    pub async fn call_tool_with_retries(
        &self,
        name: &str,
        arguments: Value,
        max_retries: u32,
    ) -> ToolOutcome {
        let policy = RetryPolicy::new(max_retries).base_delay(self.config.retry_delay());
        let args = &arguments;

        let text = with_retry(policy, move |attempt| self.attempt_call(name, args, attempt)).await;

        match text {
            Ok(text) => {
                let mut outcome = self.normalizer.normalize(&text, name);
                if let ToolOutcome::Results(result) = &mut outcome {
                    if result.query.is_empty() {
                        if let Some(query) = arguments.get("query").and_then(Value::as_str) {
                            result.query = query.to_string();
                        }
                    }
                }
                outcome
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "MCP tool call failed");
                ToolOutcome::error(e.to_string())
            }
        }
    }

    /// Run one of the search tools
    pub async fn search(&self, tool: SearchTool, query: &str, max_results: u32) -> ToolOutcome {
        let arguments = serde_json::json!({
            "query": query,
            "max_results": max_results,
        });
        self.call_tool(tool.name(), arguments).await
    }

    /// List the tools the server advertises
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, CallError> {
        let session_id = self.sessions.get_or_create_session().await;
        let request = JsonRpcRequest::list_tools(self.ids.next_id());
        let result = self
            .exchange(request, session_id, self.config.probe_timeout())
            .await?;

        Ok(ListToolsResult::from_value(result).tools)
    }

    /// Probe the server with `tools/list`
    pub async fn health(&self) -> HealthReport {
        let server_url = self.config.server_url.as_str();

        match self.list_tools().await {
            Ok(tools) => {
                HealthReport::healthy(server_url, tools.into_iter().map(|t| t.name).collect())
            }
            Err(CallError::Transport(TransportError::Status(code))) => {
                HealthReport::unhealthy(server_url, ServerState::Unreachable, None)
                    .with_status_code(code)
            }
            Err(CallError::Transport(e)) => HealthReport::unhealthy(
                server_url,
                ServerState::ConnectionFailed,
                Some(e.to_string()),
            ),
            Err(CallError::EmptyBody) => HealthReport::unhealthy(
                server_url,
                ServerState::EmptyResponse,
                Some("Server returned empty response (may still be initializing)".to_string()),
            ),
            Err(CallError::Decode(_)) => HealthReport::unhealthy(
                server_url,
                ServerState::InvalidResponse,
                Some("Server returned invalid response format (neither JSON nor SSE)".to_string()),
            ),
            Err(CallError::NotYetInitialized { .. }) => HealthReport::unhealthy(
                server_url,
                ServerState::Initializing,
                Some("Server is still initializing".to_string()),
            ),
            Err(CallError::InvalidParameters { message })
            | Err(CallError::Protocol { message, .. }) => {
                HealthReport::unhealthy(server_url, ServerState::Error, Some(message))
            }
            Err(e @ (CallError::NoContent | CallError::ToolFailed { .. })) => {
                HealthReport::unhealthy(server_url, ServerState::Error, Some(e.to_string()))
            }
        }
    }

    /// Whether a session can be established, running the handshake if needed
    pub async fn status(&self) -> SessionStatus {
        let session_id = self.sessions.get_or_create_session().await;
        SessionStatus::from_session(&self.config.server_url, session_id.as_deref())
    }

    /// Drop the cached session so the next call runs a fresh handshake
    pub fn reset_session(&self) {
        self.sessions.invalidate();
    }

    /// Current handshake state
    pub fn session_state(&self) -> SessionState {
        self.sessions.state()
    }

    async fn attempt_call(
        &self,
        name: &str,
        arguments: &Value,
        attempt: u32,
    ) -> Result<String, CallError> {
        let session_id = self.sessions.get_or_create_session().await;
        let request = JsonRpcRequest::call_tool(self.ids.next_id(), name, arguments.clone());

        tracing::debug!(tool = name, attempt, id = request.id, "calling MCP tool");
        let result = self
            .exchange(request, session_id, self.config.call_timeout())
            .await?;

        let result = CallToolResult::from_value(result).ok_or(CallError::NoContent)?;
        if result.is_error {
            let message = result
                .into_first_text()
                .unwrap_or_else(|| "tool reported an error".to_string());
            return Err(CallError::ToolFailed { message });
        }
        result.into_first_text().ok_or(CallError::NoContent)
    }

    /// Post one request and classify the reply
    async fn exchange(
        &self,
        request: JsonRpcRequest,
        session_id: Option<String>,
        timeout: Duration,
    ) -> Result<Value, CallError> {
        let outcome = self.post(request, session_id, timeout).await;

        if let Err(e) = &outcome {
            if e.invalidates_session() {
                tracing::debug!(error = %e, "error invalidates the MCP session");
                self.sessions.invalidate();
            }
        }
        outcome
    }

    async fn post(
        &self,
        request: JsonRpcRequest,
        session_id: Option<String>,
        timeout: Duration,
    ) -> Result<Value, CallError> {
        let headers = RequestHeaders::new(session_id, Some(self.config.protocol_version.clone()));
        let method = request.method;
        let reply = self
            .transport
            .post(&request.into(), &headers, timeout)
            .await?;

        if !reply.is_success() {
            return Err(TransportError::Status(reply.status).into());
        }
        if reply.is_empty() {
            tracing::debug!(method, "empty MCP response body");
            return Err(CallError::EmptyBody);
        }

        let body = decode(&reply.body).map_err(|e| {
            tracing::debug!(method, error = %e, body = %preview(&reply.body), "undecodable MCP response");
            e
        })?;

        match JsonRpcResponse::from_value(body) {
            Some(response) => response.into_result().map_err(|error| {
                tracing::debug!(method, code = error.code, message = %error.message, "MCP protocol error");
                classify_rpc_error(error)
            }),
            None => {
                tracing::debug!(method, "response is not a JSON-RPC envelope");
                Ok(Value::Null)
            }
        }
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
