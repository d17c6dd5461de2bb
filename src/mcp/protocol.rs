//! JSON-RPC 2.0 envelope types for the MCP wire protocol.
//!
//! Outgoing messages are either requests (carry an `id`, expect a response)
//! or notifications (no `id`). Incoming responses carry exactly one of
//! `result` or `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// JSON-RPC protocol version
pub const JSONRPC_VERSION: &str = "2.0";

/// Default MCP protocol version
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC error code for invalid method parameters
pub const INVALID_PARAMS: i64 = -32602;

/// MCP method names
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const TOOLS_LIST: &str = "tools/list";
}

// ========== OUTGOING ==========

/// Client identity sent during `initialize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Parameters of the `initialize` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub client_info: ClientInfo,
    pub capabilities: Value,
}

impl InitializeParams {
    /// Build handshake parameters with an empty capability set
    pub fn new(
        protocol_version: impl Into<String>,
        client_name: impl Into<String>,
        client_version: impl Into<String>,
    ) -> Self {
        Self {
            protocol_version: protocol_version.into(),
            client_info: ClientInfo {
                name: client_name.into(),
                version: client_version.into(),
            },
            capabilities: Value::Object(Default::default()),
        }
    }
}

/// Parameters of a `tools/call` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Value,
}

/// An empty `{}` parameter object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyParams {}

/// Request parameters, one shape per method
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    Initialize(InitializeParams),
    CallTool(CallToolParams),
    Empty(EmptyParams),
}

/// A JSON-RPC request (expects a response)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: RequestParams,
}

impl JsonRpcRequest {
    /// `initialize` request
    pub fn initialize(id: u64, params: InitializeParams) -> Self {
        Self::new(id, methods::INITIALIZE, RequestParams::Initialize(params))
    }

    /// `tools/call` request
    pub fn call_tool(id: u64, name: impl Into<String>, arguments: Value) -> Self {
        Self::new(
            id,
            methods::TOOLS_CALL,
            RequestParams::CallTool(CallToolParams {
                name: name.into(),
                arguments,
            }),
        )
    }

    /// `tools/list` request
    pub fn list_tools(id: u64) -> Self {
        Self::new(id, methods::TOOLS_LIST, RequestParams::Empty(EmptyParams {}))
    }

    fn new(id: u64, method: &'static str, params: RequestParams) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC notification (no `id`, no response expected)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: EmptyParams,
}

impl JsonRpcNotification {
    /// `notifications/initialized`
    pub fn initialized() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: methods::INITIALIZED,
            params: EmptyParams {},
        }
    }
}

/// Anything the client posts to the MCP endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

impl OutgoingMessage {
    /// Method name of the message
    pub fn method(&self) -> &'static str {
        match self {
            OutgoingMessage::Request(req) => req.method,
            OutgoingMessage::Notification(notif) => notif.method,
        }
    }

    /// Request id, `None` for notifications
    pub fn id(&self) -> Option<u64> {
        match self {
            OutgoingMessage::Request(req) => Some(req.id),
            OutgoingMessage::Notification(_) => None,
        }
    }
}

impl From<JsonRpcRequest> for OutgoingMessage {
    fn from(req: JsonRpcRequest) -> Self {
        OutgoingMessage::Request(req)
    }
}

impl From<JsonRpcNotification> for OutgoingMessage {
    fn from(notif: JsonRpcNotification) -> Self {
        OutgoingMessage::Notification(notif)
    }
}

/// Monotonic request id source
#[derive(Debug)]
pub struct RequestIds {
    next: AtomicU64,
}

impl RequestIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Take the next id
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

// ========== INCOMING ==========

/// A JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,

    #[serde(default = "unknown_error_message")]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn unknown_error_message() -> String {
    "Unknown error".to_string()
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

/// A JSON-RPC response: success payload or protocol error
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponse {
    Failure {
        #[serde(default)]
        id: Option<Value>,
        error: JsonRpcError,
    },
    Success {
        #[serde(default)]
        id: Option<Value>,
        result: Value,
    },
}

impl JsonRpcResponse {
    /// Interpret a decoded body as a response envelope
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Whether the response is a protocol error
    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcResponse::Failure { .. })
    }

    /// Extract the result payload or the protocol error
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self {
            JsonRpcResponse::Success { result, .. } => Ok(result),
            JsonRpcResponse::Failure { error, .. } => Err(error),
        }
    }
}

/// One item of a `tools/call` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default)]
    pub content_type: String,

    #[serde(default)]
    pub text: String,
}

/// The `tools/call` result payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,

    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    /// Parse a result payload
    pub fn from_value(result: Value) -> Option<Self> {
        serde_json::from_value(result).ok()
    }

    /// Text of the first content item; only that item is consumed
    pub fn into_first_text(self) -> Option<String> {
        self.content.into_iter().next().map(|item| item.text)
    }

    /// Text of the first content item of a raw result payload
    pub fn first_text(result: Value) -> Option<String> {
        Self::from_value(result)?.into_first_text()
    }
}

/// A tool advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    #[serde(default = "unknown_tool_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub input_schema: Value,
}

fn unknown_tool_name() -> String {
    "Unknown".to_string()
}

/// The `tools/list` result payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

impl ListToolsResult {
    /// Parse a result payload; anything unrecognisable lists no tools
    pub fn from_value(result: Value) -> Self {
        serde_json::from_value(result).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_initialize() {
        let req = JsonRpcRequest::initialize(
            1,
            InitializeParams::new("2024-11-05", "search-via-mcp", "0.1.0"),
        );
        let json = serde_json::to_value(OutgoingMessage::from(req)).unwrap();
        assert_eq!(
            json,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "clientInfo": { "name": "search-via-mcp", "version": "0.1.0" },
                    "capabilities": {}
                }
            })
        );
    }

    #[test]
    fn test_serialize_notification_has_no_id() {
        let json =
            serde_json::to_value(OutgoingMessage::from(JsonRpcNotification::initialized()))
                .unwrap();
        assert_eq!(
            json,
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized", "params": {} })
        );
    }

    #[test]
    fn test_serialize_call_tool() {
        let req = JsonRpcRequest::call_tool(7, "search_youtube_videos", json!({ "query": "rust" }));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["method"], "tools/call");
        assert_eq!(json["id"], 7);
        assert_eq!(json["params"]["name"], "search_youtube_videos");
        assert_eq!(json["params"]["arguments"]["query"], "rust");
    }

    #[test]
    fn test_serialize_list_tools_has_empty_params() {
        let json = serde_json::to_value(JsonRpcRequest::list_tools(3)).unwrap();
        assert_eq!(json["params"], json!({}));
    }

    #[test]
    fn test_request_ids_are_monotonic() {
        let ids = RequestIds::new();
        let a = ids.next_id();
        let b = ids.next_id();
        let c = ids.next_id();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_deserialize_success() {
        let resp = JsonRpcResponse::from_value(json!({
            "jsonrpc": "2.0", "id": 2, "result": { "content": [] }
        }))
        .unwrap();
        assert!(!resp.is_error());
        assert_eq!(resp.into_result().unwrap(), json!({ "content": [] }));
    }

    #[test]
    fn test_deserialize_failure() {
        let resp = JsonRpcResponse::from_value(json!({
            "jsonrpc": "2.0", "id": 2,
            "error": { "code": -32602, "message": "Invalid params", "data": "x" }
        }))
        .unwrap();
        assert!(resp.is_error());
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
        assert_eq!(err.message, "Invalid params");
        assert_eq!(err.data, Some(json!("x")));
    }

    #[test]
    fn test_error_wins_when_both_present() {
        let resp = JsonRpcResponse::from_value(json!({
            "error": { "code": 1, "message": "m" }, "result": {}
        }))
        .unwrap();
        assert!(resp.is_error());
    }

    #[test]
    fn test_error_without_fields_gets_defaults() {
        let resp = JsonRpcResponse::from_value(json!({ "error": {} })).unwrap();
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, 0);
        assert_eq!(err.message, "Unknown error");
    }

    #[test]
    fn test_not_an_envelope() {
        assert!(JsonRpcResponse::from_value(json!({ "hello": "world" })).is_none());
        assert!(JsonRpcResponse::from_value(json!([1, 2])).is_none());
    }

    #[test]
    fn test_first_text() {
        let text = CallToolResult::first_text(json!({
            "content": [
                { "type": "text", "text": "first" },
                { "type": "text", "text": "second" }
            ]
        }));
        assert_eq!(text.as_deref(), Some("first"));

        assert!(CallToolResult::first_text(json!({ "content": [] })).is_none());
        assert!(CallToolResult::first_text(json!({})).is_none());
        assert!(CallToolResult::first_text(Value::Null).is_none());
    }

    #[test]
    fn test_tool_error_flag() {
        let parsed = CallToolResult::from_value(json!({
            "content": [{ "type": "text", "text": "quota exceeded" }],
            "isError": true
        }))
        .unwrap();
        assert!(parsed.is_error);
        assert_eq!(parsed.into_first_text().as_deref(), Some("quota exceeded"));

        let parsed = CallToolResult::from_value(json!({ "content": [] })).unwrap();
        assert!(!parsed.is_error);
    }

    #[test]
    fn test_list_tools_result() {
        let result = ListToolsResult::from_value(json!({
            "tools": [{ "name": "search_youtube_videos", "inputSchema": {} }, {}]
        }));
        assert_eq!(result.tools.len(), 2);
        assert_eq!(result.tools[0].name, "search_youtube_videos");
        assert_eq!(result.tools[1].name, "Unknown");

        assert!(ListToolsResult::from_value(Value::Null).tools.is_empty());
    }

    #[test]
    fn test_jsonrpc_error_display() {
        let err = JsonRpcError {
            code: -32601,
            message: "Method not found".into(),
            data: None,
        };
        assert_eq!(format!("{err}"), "JSON-RPC error -32601: Method not found");
    }
}
