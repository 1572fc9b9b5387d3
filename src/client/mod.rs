//! WebSocket client with lifecycle listeners.
//!
//! [`WebSocketClient`] owns one transport connection at a time and a
//! [`ListenerRegistry`]. All notifications are delivered by a single
//! dispatcher task, so two notification passes never overlap.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use signal_socket::{Environment, SignalListener, SocketListener, WebSocketClient};
//!
//! struct Printer;
//!
//! impl SocketListener for Printer {
//!     fn on_connected(&self) { println!("connected"); }
//!     fn on_disconnected(&self) { println!("disconnected"); }
//!     fn on_error(&self, message: &str) { eprintln!("{message}"); }
//!     fn signal_listener(&self) -> Option<&dyn SignalListener> { Some(self) }
//! }
//!
//! impl SignalListener for Printer {
//!     fn on_signal(&self, signal: Option<&str>) { println!("{signal:?}"); }
//! }
//!
//! # async fn example() -> signal_socket::Result<()> {
//! let client = WebSocketClient::builder()
//!     .environment(Environment::Debug)
//!     .build()?;
//!
//! client.add_listener(Arc::new(Printer));
//! client.connect();
//! client.send("hello");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent client configuration.
pub mod builder;

/// Serialized event dispatch.
pub(crate) mod dispatch;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::identifiers::{ConnectionId, ListenerId};
use crate::listener::{ListenerRegistry, SocketListener};
use crate::state::ConnectionState;
use crate::transport::{CloseCode, EventSink, Transport, TransportHandle};

use self::dispatch::Dispatch;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;

// ============================================================================
// Types
// ============================================================================

/// The live transport connection.
struct ActiveConnection {
    id: ConnectionId,
    handle: Box<dyn TransportHandle>,
    /// Consecutive receive failures since the last successful receive.
    receive_failures: u32,
}

/// State guarded by one lock so state and handle never disagree.
#[derive(Default)]
struct Session {
    state: ConnectionState,
    active: Option<ActiveConnection>,
}

impl Session {
    /// Returns the active connection if it is `id`.
    fn current(&mut self, id: ConnectionId) -> Option<&mut ActiveConnection> {
        self.active.as_mut().filter(|active| active.id == id)
    }
}

/// Internal shared state for a client.
pub(crate) struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    listeners: ListenerRegistry,
    session: Mutex<Session>,
    dispatch_tx: mpsc::UnboundedSender<Dispatch>,
}

// ============================================================================
// WebSocketClient
// ============================================================================

/// Single-connection WebSocket client.
///
/// Cheap to clone; clones share the same connection and listeners.
/// `connect`, `disconnect` and `send` never block and never fail: outcomes
/// arrive through listener callbacks.
///
/// Dropping the last clone closes the live connection.
#[derive(Clone)]
pub struct WebSocketClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for WebSocketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketClient")
            .field("endpoint", &self.inner.config.endpoint.as_str())
            .field("state", &self.state())
            .field("listeners", &self.inner.listeners.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// WebSocketClient - Constructor
// ============================================================================

impl WebSocketClient {
    /// Returns a builder for configuring a client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client and spawns its dispatcher on `runtime`.
    pub(crate) fn new(config: ClientConfig, transport: Arc<dyn Transport>, runtime: &Handle) -> Self {
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(ClientInner {
            config,
            transport,
            listeners: ListenerRegistry::new(),
            session: Mutex::new(Session::default()),
            dispatch_tx,
        });

        runtime.spawn(dispatch::run_dispatcher(Arc::downgrade(&inner), dispatch_rx));

        debug!(endpoint = %inner.config.endpoint, "Client created");

        Self { inner }
    }
}

// ============================================================================
// WebSocketClient - Accessors
// ============================================================================

impl WebSocketClient {
    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.session.lock().state
    }

    /// Returns `true` if the connection is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Returns the configured endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.config.endpoint
    }

    /// Returns the client configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the listener registry.
    #[inline]
    #[must_use]
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.inner.listeners
    }
}

// ============================================================================
// WebSocketClient - Listeners
// ============================================================================

impl WebSocketClient {
    /// Registers a listener. Adding the same listener twice is a no-op.
    pub fn add_listener(&self, listener: Arc<dyn SocketListener>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    /// Unregisters a listener by handle.
    pub fn remove_listener(&self, listener: &Arc<dyn SocketListener>) -> bool {
        self.inner.listeners.remove_listener(listener)
    }

    /// Unregisters a listener by token.
    pub fn remove_listener_id(&self, id: &ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }
}

// ============================================================================
// WebSocketClient - Connection
// ============================================================================

impl WebSocketClient {
    /// Opens a connection to the configured endpoint.
    ///
    /// Does nothing unless the client is disconnected. The outcome arrives
    /// as `on_connected` or `on_error`.
    pub fn connect(&self) {
        let mut session = self.inner.session.lock();

        if !session.state.can_connect() {
            debug!(state = %session.state, "Connect ignored");
            return;
        }

        let id = ConnectionId::next();
        let events = EventSink::new(id, self.inner.dispatch_tx.clone());

        session.state = ConnectionState::Connecting;
        // Holding the lock across `open` keeps the dispatcher from seeing
        // events for `id` before it is the active connection.
        let handle = self.inner.transport.open(&self.inner.config.endpoint, events);
        let superseded = session.active.replace(ActiveConnection {
            id,
            handle,
            receive_failures: 0,
        });
        drop(session);

        debug!(connection = %id, "Connecting");
        drop(superseded);
    }

    /// Requests a normal ("going away") close of the open connection.
    ///
    /// Does nothing unless the client is connected. The state changes when
    /// the transport confirms the close.
    pub fn disconnect(&self) {
        let session = self.inner.session.lock();

        match (&session.active, session.state) {
            (Some(active), ConnectionState::Connected) => {
                debug!(connection = %active.id, "Disconnecting");
                active.handle.close(CloseCode::Away, None);
            }
            (_, state) => debug!(%state, "Disconnect ignored"),
        }
    }

    /// Sends a text message without waiting.
    ///
    /// Failures, including sending while not connected, are reported
    /// through `on_error`; no transport send is attempted unless connected.
    pub fn send(&self, message: impl Into<String>) {
        let message = message.into();
        let session = self.inner.session.lock();

        if let (Some(active), ConnectionState::Connected) = (&session.active, session.state) {
            active.handle.send(message);
            return;
        }

        let state = session.state;
        drop(session);

        warn!(%state, len = message.len(), "Send while not connected");
        self.inner.report(Error::not_connected(state));
    }

    /// Waits until every event queued before this call has been delivered.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.inner.dispatch_tx.send(Dispatch::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

// ============================================================================
// ClientInner
// ============================================================================

impl ClientInner {
    /// Queues an error notification behind any pending events.
    fn report(&self, error: Error) {
        if self
            .dispatch_tx
            .send(Dispatch::Error(error.to_string()))
            .is_err()
        {
            debug!(%error, "Dispatcher gone, error dropped");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
