//! MCP session handling.
//!
//! A [`SessionStore`] holds the one session id an adapter instance uses.
//! The [`SessionManager`] runs the `initialize` / `notifications/initialized`
//! handshake when no id is cached, collapsing concurrent handshakes into one.
//!
//! ```text
//! UNINITIALIZED --get_or_create_session--> INITIALIZING --ok--> READY
//!       ^                                       |                 |
//!       +------------- handshake failed --------+                 |
//!       +------------------------ invalidate ---------------------+
//! ```
//!
//! Invalidation does not synchronize with in-flight readers: a call may still
//! use an id invalidated a moment earlier. The failure that stale id causes
//! triggers another invalidation and handshake.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;

use super::decode::{decode, DecodeError};
use super::protocol::{
    InitializeParams, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    RequestIds,
};
use super::transport::{McpTransport, RequestHeaders, TransportError};
use crate::config::ClientConfig;

/// Handshake state of a session store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Shared holder of the cached session id.
///
/// Reads of a cached id take an uncontended read lock and never wait on a
/// handshake; the handshake lock is only taken when no id is cached.
#[derive(Debug, Default)]
pub struct SessionStore {
    session_id: RwLock<Option<String>>,
    handshake: Mutex<()>,
    initializing: AtomicBool,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached session id, if any
    pub fn get(&self) -> Option<String> {
        self.session_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, session_id: String) {
        *self
            .session_id
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(session_id);
    }

    /// Drop the cached session id
    pub fn invalidate(&self) {
        self.session_id
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Current handshake state
    pub fn state(&self) -> SessionState {
        if self.initializing.load(Ordering::SeqCst) {
            SessionState::Initializing
        } else if self.get().is_some() {
            SessionState::Ready
        } else {
            SessionState::Uninitialized
        }
    }
}

/// Why a handshake failed
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("initialize request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("initialize returned HTTP status {0}")]
    Status(u16),

    #[error("initialize response carried no mcp-session-id header")]
    MissingSessionId,

    #[error("initialize response could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error("initialize rejected: {0}")]
    Rejected(JsonRpcError),
}

/// Settings the handshake needs
#[derive(Debug, Clone)]
struct HandshakeSettings {
    protocol_version: String,
    client_name: String,
    client_version: String,
    timeout: Duration,
    settle_delay: Duration,
}

/// Runs handshakes against one server and caches the resulting session
#[derive(Debug)]
pub struct SessionManager {
    transport: Arc<dyn McpTransport>,
    store: Arc<SessionStore>,
    ids: Arc<RequestIds>,
    settings: HandshakeSettings,
}

impl SessionManager {
    /// Create a manager with its own session store
    pub fn new(transport: Arc<dyn McpTransport>, config: &ClientConfig) -> Self {
        Self::with_store(
            transport,
            Arc::new(SessionStore::new()),
            Arc::new(RequestIds::new()),
            config,
        )
    }

    /// Create a manager over an existing store and id source
    pub fn with_store(
        transport: Arc<dyn McpTransport>,
        store: Arc<SessionStore>,
        ids: Arc<RequestIds>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            transport,
            store,
            ids,
            settings: HandshakeSettings {
                protocol_version: config.protocol_version.clone(),
                client_name: config.client_name.clone(),
                client_version: config.client_version.clone(),
                timeout: config.probe_timeout(),
                settle_delay: config.settle_delay(),
            },
        }
    }

    /// The session store
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Current handshake state
    pub fn state(&self) -> SessionState {
        self.store.state()
    }

    /// Return the cached session id, running the handshake if there is none.
    ///
    /// Returns `None` when the handshake fails; the state stays
    /// uninitialized and the next call tries again.
    pub async fn get_or_create_session(&self) -> Option<String> {
        if let Some(session_id) = self.store.get() {
            return Some(session_id);
        }

        let _guard = self.store.handshake.lock().await;

        // Another caller may have finished the handshake while we waited
        if let Some(session_id) = self.store.get() {
            return Some(session_id);
        }

        self.store.initializing.store(true, Ordering::SeqCst);
        let outcome = self.handshake().await;
        self.store.initializing.store(false, Ordering::SeqCst);

        match outcome {
            Ok(session_id) => Some(session_id),
            Err(e) => {
                tracing::warn!(error = %e, "MCP initialization failed");
                None
            }
        }
    }

    /// Drop the cached session. Never blocks on a handshake.
    pub fn invalidate(&self) {
        tracing::debug!("invalidating cached MCP session");
        self.store.invalidate();
    }

    async fn handshake(&self) -> Result<String, HandshakeError> {
        let settings = &self.settings;
        let request = JsonRpcRequest::initialize(
            self.ids.next_id(),
            InitializeParams::new(
                settings.protocol_version.clone(),
                settings.client_name.clone(),
                settings.client_version.clone(),
            ),
        );

        tracing::debug!(protocol_version = %settings.protocol_version, "sending initialize");
        let reply = self
            .transport
            .post(&request.into(), &RequestHeaders::default(), settings.timeout)
            .await?;

        if !reply.is_success() {
            return Err(HandshakeError::Status(reply.status));
        }
        let session_id = reply
            .session_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or(HandshakeError::MissingSessionId)?;

        let body = decode(&reply.body)?;
        if let Some(JsonRpcResponse::Failure { error, .. }) = JsonRpcResponse::from_value(body) {
            return Err(HandshakeError::Rejected(error));
        }

        let headers = RequestHeaders::new(Some(session_id.clone()), None);
        let notification = self
            .transport
            .post(
                &JsonRpcNotification::initialized().into(),
                &headers,
                settings.timeout,
            )
            .await?;

        if !notification.is_success() {
            // Some servers do not acknowledge notifications properly
            tracing::warn!(
                status = notification.status,
                "initialized notification not acknowledged, proceeding anyway"
            );
        }

        // The id stays unpublished until the server has settled, so lock-free
        // readers cannot use it early
        tokio::time::sleep(settings.settle_delay).await;
        self.store.set(session_id.clone());

        tracing::info!("MCP session established");
        Ok(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::mock::MockTransport;
    use crate::mcp::protocol::methods;
    use crate::mcp::transport::{HttpReply, SESSION_HEADER};

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:8080").init_settle_delay(Duration::ZERO)
    }

    fn manager(transport: &Arc<MockTransport>) -> SessionManager {
        SessionManager::new(transport.clone(), &config())
    }

    #[tokio::test]
    async fn test_handshake_caches_session() {
        let transport = Arc::new(MockTransport::new());
        let sessions = manager(&transport);
        assert_eq!(sessions.state(), SessionState::Uninitialized);

        let first = sessions.get_or_create_session().await;
        let second = sessions.get_or_create_session().await;

        assert_eq!(first.as_deref(), Some(MockTransport::DEFAULT_SESSION_ID));
        assert_eq!(first, second);
        assert_eq!(sessions.state(), SessionState::Ready);
        assert_eq!(transport.count(methods::INITIALIZE), 1);
        assert_eq!(transport.count(methods::INITIALIZED), 1);
    }

    #[tokio::test]
    async fn test_handshake_messages() {
        let transport = Arc::new(MockTransport::new());
        manager(&transport).get_or_create_session().await;

        let requests = transport.requests();
        let init = &requests[0];
        assert_eq!(init.method, methods::INITIALIZE);
        assert!(init.headers.session_id.is_none());
        assert_eq!(init.body["params"]["protocolVersion"], "2024-11-05");
        assert_eq!(init.body["params"]["clientInfo"]["name"], "search-via-mcp");
        assert_eq!(init.body["params"]["capabilities"], serde_json::json!({}));
        assert_eq!(init.timeout, Duration::from_secs(5));

        let notif = &requests[1];
        assert_eq!(notif.method, methods::INITIALIZED);
        assert!(notif.id.is_none());
        assert!(notif.body.get("id").is_none());
        assert_eq!(
            notif.headers.session_id.as_deref(),
            Some(MockTransport::DEFAULT_SESSION_ID)
        );
    }

    #[tokio::test]
    async fn test_missing_session_header_fails() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(
            methods::INITIALIZE,
            HttpReply::new(200, r#"{"jsonrpc":"2.0","id":1,"result":{}}"#),
        );
        let sessions = manager(&transport);

        assert!(sessions.get_or_create_session().await.is_none());
        assert_eq!(sessions.state(), SessionState::Uninitialized);
        assert_eq!(transport.count(methods::INITIALIZED), 0);

        // Next attempt runs a fresh handshake
        assert!(sessions.get_or_create_session().await.is_some());
        assert_eq!(transport.count(methods::INITIALIZE), 2);
    }

    #[tokio::test]
    async fn test_non_success_status_fails() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(
            methods::INITIALIZE,
            HttpReply::new(500, "oops").with_session_id("abc"),
        );
        let sessions = manager(&transport);

        assert!(sessions.get_or_create_session().await.is_none());
        assert!(sessions.store().get().is_none());
    }

    #[tokio::test]
    async fn test_rejected_initialize_fails() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(
            methods::INITIALIZE,
            HttpReply::new(
                200,
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"unsupported version"}}"#,
            )
            .with_session_id("abc"),
        );
        let sessions = manager(&transport);

        assert!(sessions.get_or_create_session().await.is_none());
    }

    #[tokio::test]
    async fn test_sse_initialize_reply_accepted() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(
            methods::INITIALIZE,
            HttpReply::new(
                200,
                "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n",
            )
            .with_session_id("sse-session"),
        );
        let sessions = manager(&transport);

        assert_eq!(
            sessions.get_or_create_session().await.as_deref(),
            Some("sse-session")
        );
    }

    #[tokio::test]
    async fn test_unacknowledged_notification_tolerated() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(methods::INITIALIZED, HttpReply::new(400, "bad"));
        let sessions = manager(&transport);

        assert!(sessions.get_or_create_session().await.is_some());
        assert_eq!(sessions.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_handshake() {
        let transport = Arc::new(MockTransport::new());
        let sessions = manager(&transport);

        sessions.get_or_create_session().await;
        sessions.invalidate();
        assert_eq!(sessions.state(), SessionState::Uninitialized);

        sessions.get_or_create_session().await;
        assert_eq!(transport.count(methods::INITIALIZE), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_handshakes_collapse() {
        let transport = Arc::new(MockTransport::new());
        let sessions = Arc::new(manager(&transport));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let sessions = sessions.clone();
            tasks.spawn(async move { sessions.get_or_create_session().await });
        }
        while let Some(result) = tasks.join_next().await {
            assert_eq!(
                result.unwrap().as_deref(),
                Some(MockTransport::DEFAULT_SESSION_ID)
            );
        }

        assert_eq!(transport.count(methods::INITIALIZE), 1);
        assert_eq!(transport.count(methods::INITIALIZED), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_withheld_until_settled() {
        let transport = Arc::new(MockTransport::new());
        let config = ClientConfig::new("http://localhost:8080")
            .init_settle_delay(Duration::from_millis(250));
        let sessions = Arc::new(SessionManager::new(transport.clone(), &config));

        let first = tokio::spawn({
            let sessions = sessions.clone();
            async move { sessions.get_or_create_session().await }
        });

        // Let the first caller reach the settle pause
        for _ in 0..100 {
            if transport.count(methods::INITIALIZED) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(transport.count(methods::INITIALIZED), 1);
        assert_eq!(sessions.state(), SessionState::Initializing);
        assert!(sessions.store().get().is_none());

        let start = tokio::time::Instant::now();
        let second = sessions.get_or_create_session().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(second.as_deref(), Some(MockTransport::DEFAULT_SESSION_ID));

        assert_eq!(
            first.await.unwrap().as_deref(),
            Some(MockTransport::DEFAULT_SESSION_ID)
        );
        assert_eq!(transport.count(methods::INITIALIZE), 1);
        assert_eq!(sessions.state(), SessionState::Ready);
    }

    #[test]
    fn test_session_header_name() {
        assert_eq!(SESSION_HEADER, "mcp-session-id");
    }
}
