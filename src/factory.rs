//! Connect handshake and session construction.

use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::error::ExplorerResult;
use crate::identifier::{IdentifierInput, Resolved};
use crate::protocol::{ConnectRequest, Endpoint, decode_connect_response};
use crate::session::RemoteGameSession;
use crate::transport::{HttpTransport, Transport};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Builds the per-session transport once the handshake succeeded.
type TransportBuilder = dyn Fn() -> ExplorerResult<Arc<dyn Transport>> + Send + Sync;

/// Connects to the game server and creates bound sessions.
///
/// The factory's own transport is used only for `/connect`; every session
/// gets a fresh transport from the builder.
pub struct RemoteGameSessionFactory {
    username: String,
    transport: Arc<dyn Transport>,
    session_transport: Arc<TransportBuilder>,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for RemoteGameSessionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteGameSessionFactory")
            .field("username", &self.username)
            .field("transport", &self.transport)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl RemoteGameSessionFactory {
    /// Creates a factory talking HTTP to the server named in `config`.
    #[instrument(skip(config), fields(server_url = %config.server_url(), username = %config.username()))]
    pub fn new(config: &ClientConfig) -> ExplorerResult<Self> {
        let server_url = config.server_url().clone();
        let timeout = config.timeout();
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&server_url, timeout)?);
        let session_transport: Arc<TransportBuilder> = Arc::new(move || {
            let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&server_url, timeout)?);
            Ok(transport)
        });
        info!("Created session factory");
        Ok(Self {
            username: config.username().clone(),
            transport,
            session_transport,
            dispatcher: Dispatcher::detect(),
        })
    }

    /// Creates a factory over caller-supplied transports.
    ///
    /// `session_transport` is invoked once per created session.
    pub fn with_transports<F>(username: impl Into<String>, transport: Arc<dyn Transport>, session_transport: F) -> Self
    where
        F: Fn() -> ExplorerResult<Arc<dyn Transport>> + Send + Sync + 'static,
    {
        Self {
            username: username.into(),
            transport,
            session_transport: Arc::new(session_transport),
            dispatcher: Dispatcher::detect(),
        }
    }

    /// Overrides the background strategy handed to new sessions.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Username sent with every handshake.
    pub fn username(&self) -> &str {
        &self.username
    }

    fn connect_body(&self, resolved: &Resolved<'_>) -> ExplorerResult<Value> {
        let request = ConnectRequest {
            vsid: resolved.visual().map(|v| v.to_payload()),
            username: &self.username,
        };
        Ok(serde_json::to_value(request)?)
    }

    fn bind(&self, mut resolved: Resolved<'_>, payload: &Value) -> ExplorerResult<RemoteGameSession> {
        let sid = decode_connect_response(payload)?;
        resolved.assign_sid(&sid);
        info!(sid = %sid, "Connected");
        let transport = (self.session_transport)()?;
        Ok(RemoteGameSession::new(sid, transport, self.dispatcher.clone()))
    }

    /// Performs the `/connect` handshake, blocking until the server answers.
    ///
    /// On success the new id is written back onto a caller-supplied
    /// [`SessionIdentifier`](crate::SessionIdentifier), replacing any previous one.
    /// Inside an async runtime the HTTP transport returns a transport error
    /// instead of blocking; use [`create_async`](Self::create_async) there.
    #[instrument(skip(self, identifier), fields(username = %self.username))]
    pub fn create<'a>(&self, identifier: impl Into<IdentifierInput<'a>>) -> ExplorerResult<RemoteGameSession> {
        let resolved = identifier.into().resolve()?;
        let body = self.connect_body(&resolved)?;
        debug!(body = %body, "Sending connect request");
        let payload = self.transport.post_blocking(Endpoint::Connect, &body)?;
        self.bind(resolved, &payload)
    }

    /// Async counterpart of [`create`](Self::create) for Tokio callers.
    #[instrument(skip(self, identifier), fields(username = %self.username))]
    pub async fn create_async<'a>(
        &self,
        identifier: impl Into<IdentifierInput<'a>>,
    ) -> ExplorerResult<RemoteGameSession> {
        let resolved = identifier.into().resolve()?;
        let body = self.connect_body(&resolved)?;
        debug!(body = %body, "Sending connect request");
        let payload = self.transport.post(Endpoint::Connect, &body).await?;
        self.bind(resolved, &payload)
    }
}
