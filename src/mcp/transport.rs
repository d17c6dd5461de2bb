//! HTTP transport for the MCP endpoint.
//!
//! Every interaction is a POST of a JSON-RPC message to a single endpoint.
//! The transport only moves bytes: it reports the HTTP status, the session
//! header and the body text, and leaves interpretation to its callers.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::protocol::OutgoingMessage;

/// Header carrying the session id
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Header carrying the negotiated protocol version
pub const PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";

/// Accepted response encodings
pub const ACCEPT_VALUE: &str = "application/json, text/event-stream";

/// Per-request headers beyond the fixed content negotiation headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    pub session_id: Option<String>,
    pub protocol_version: Option<String>,
}

impl RequestHeaders {
    /// Headers for a message sent within `session_id`, if any
    pub fn new(session_id: Option<String>, protocol_version: Option<String>) -> Self {
        Self {
            session_id,
            protocol_version,
        }
    }
}

/// What came back from a POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub session_id: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            session_id: None,
            body: body.into(),
        }
    }

    /// Attach a session id response header
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body is empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Errors moving a message to or from the server
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not connect to the server
    #[error("connection failed: {0}")]
    Connection(String),

    /// Request exceeded its timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Any other HTTP client failure
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Could not encode the outgoing message
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A way to post MCP messages to a server
#[async_trait]
pub trait McpTransport: Send + Sync + std::fmt::Debug {
    /// The endpoint messages are posted to
    fn endpoint(&self) -> &str;

    /// Post one message and return the raw reply
    async fn post(
        &self,
        message: &OutgoingMessage,
        headers: &RequestHeaders,
        timeout: Duration,
    ) -> Result<HttpReply, TransportError>;
}

/// The reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Arc<Client>,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport for `endpoint` with default client settings
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self::from_client(Arc::new(client), endpoint))
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn map_error(err: reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Http(err)
        }
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(
        &self,
        message: &OutgoingMessage,
        headers: &RequestHeaders,
        timeout: Duration,
    ) -> Result<HttpReply, TransportError> {
        let body = serde_json::to_vec(message)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, ACCEPT_VALUE)
            .timeout(timeout)
            .body(body);

        if let Some(version) = &headers.protocol_version {
            request = request.header(PROTOCOL_VERSION_HEADER, version);
        }
        if let Some(session_id) = &headers.session_id {
            request = request.header(SESSION_HEADER, session_id);
        }

        tracing::debug!(
            method = message.method(),
            id = ?message.id(),
            session = headers.session_id.is_some(),
            "posting MCP message"
        );

        let response = request
            .send()
            .await
            .map_err(|e| Self::map_error(e, timeout))?;

        let status = response.status().as_u16();
        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(e, timeout))?;

        tracing::debug!(
            method = message.method(),
            status,
            body_len = body.len(),
            "received MCP reply"
        );

        Ok(HttpReply {
            status,
            session_id,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_helpers() {
        let reply = HttpReply::new(204, "  \n").with_session_id("abc");
        assert!(reply.is_success());
        assert!(reply.is_empty());
        assert_eq!(reply.session_id.as_deref(), Some("abc"));

        let reply = HttpReply::new(404, "{}");
        assert!(!reply.is_success());
        assert!(!reply.is_empty());
    }

    #[test]
    fn test_transport_endpoint() {
        let transport = HttpTransport::new("http://localhost:8080/mcp").unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:8080/mcp");
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(TransportError::Status(503).to_string(), "HTTP status 503");
        assert_eq!(
            TransportError::Connection("refused".into()).to_string(),
            "connection failed: refused"
        );
    }
}
