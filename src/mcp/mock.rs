//! Scripted transport for testing purposes.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::protocol::{methods, OutgoingMessage};
use super::transport::{HttpReply, McpTransport, RequestHeaders, TransportError};

/// A request the mock transport has seen
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub id: Option<u64>,
    pub headers: RequestHeaders,
    pub body: Value,
    pub timeout: Duration,
}

type ScriptedReply = Result<HttpReply, TransportError>;

/// A transport that replays scripted replies per method.
///
/// Replies queued for a method are consumed in order; once a queue is empty
/// the method falls back to a well-behaved default (a session-granting
/// `initialize`, an acknowledged notification, an empty `tools/list`, and a
/// `tools/call` with no content).
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<ScriptedReply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Session id handed out by the default `initialize` reply
    pub const DEFAULT_SESSION_ID: &'static str = "mock-session";

    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method`.
    pub fn push_reply(&self, method: &str, reply: HttpReply) {
        lock(&self.replies)
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(reply));
    }

    /// Queue a transport failure for `method`.
    pub fn push_error(&self, method: &str, error: TransportError) {
        lock(&self.replies)
            .entry(method.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// Queue a JSON body for `method` with status 200.
    pub fn push_json(&self, method: &str, body: Value) {
        self.push_reply(method, HttpReply::new(200, body.to_string()));
    }

    /// Queue a successful `tools/call` whose first content item is `text`.
    pub fn push_tool_text(&self, text: &str) {
        self.push_json(
            methods::TOOLS_CALL,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "content": [{ "type": "text", "text": text }] }
            }),
        );
    }

    /// Queue a protocol error for `method`.
    pub fn push_rpc_error(&self, method: &str, code: i64, message: &str) {
        self.push_json(
            method,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": code, "message": message }
            }),
        );
    }

    /// All requests seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests seen for `method`
    pub fn count(&self, method: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    fn default_reply(method: &str) -> HttpReply {
        match method {
            methods::INITIALIZE => HttpReply::new(
                200,
                r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{}}}"#,
            )
            .with_session_id(Self::DEFAULT_SESSION_ID),
            methods::INITIALIZED => HttpReply::new(202, ""),
            methods::TOOLS_LIST => {
                HttpReply::new(200, r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#)
            }
            _ => HttpReply::new(200, r#"{"jsonrpc":"2.0","id":1,"result":{"content":[]}}"#),
        }
    }
}

#[async_trait]
impl McpTransport for MockTransport {
    fn endpoint(&self) -> &str {
        "mock://mcp"
    }

    async fn post(
        &self,
        message: &OutgoingMessage,
        headers: &RequestHeaders,
        timeout: Duration,
    ) -> Result<HttpReply, TransportError> {
        let method = message.method();
        lock(&self.requests).push(RecordedRequest {
            method: method.to_string(),
            id: message.id(),
            headers: headers.clone(),
            body: serde_json::to_value(message)?,
            timeout,
        });

        let scripted = lock(&self.replies)
            .get_mut(method)
            .and_then(|queue| queue.pop_front());

        // Yield so concurrent callers interleave like they would on a socket
        tokio::task::yield_now().await;

        scripted.unwrap_or_else(|| Ok(Self::default_reply(method)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
