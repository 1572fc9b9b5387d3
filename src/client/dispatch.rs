//! Serialized event dispatch.
//!
//! Transport events and locally raised errors share one queue drained by a
//! single task. That task is the only place listeners are notified from,
//! which keeps notification passes from interleaving.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Weak;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::error::Error;
use crate::identifiers::ConnectionId;
use crate::state::ConnectionState;
use crate::transport::{CloseCode, Frame, TransportEvent};

use super::ClientInner;

// ============================================================================
// Constants
// ============================================================================

/// Close reason sent when the receive failure policy trips.
const RECEIVE_FAILURE_CLOSE_REASON: &str = "too many receive failures";

// ============================================================================
// Dispatch
// ============================================================================

/// One unit of work for the dispatcher.
#[derive(Debug)]
pub(crate) enum Dispatch {
    /// Event from a transport connection.
    Transport {
        connection: ConnectionId,
        event: TransportEvent,
    },
    /// Error raised by the client itself.
    Error(String),
    /// Reply once everything queued before this has been handled.
    Flush(oneshot::Sender<()>),
}

// ============================================================================
// Dispatcher Task
// ============================================================================

/// Drains the dispatch queue until the client is gone.
pub(crate) async fn run_dispatcher(
    inner: Weak<ClientInner>,
    mut dispatch_rx: mpsc::UnboundedReceiver<Dispatch>,
) {
    while let Some(dispatch) = dispatch_rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };

        match dispatch {
            Dispatch::Transport { connection, event } => inner.handle_event(connection, event),
            Dispatch::Error(message) => inner.notify_error(&message),
            Dispatch::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("Dispatcher terminated");
}

// ============================================================================
// Event Handlers
// ============================================================================

impl ClientInner {
    /// Applies one transport event. Events from other connections are dropped.
    fn handle_event(&self, connection: ConnectionId, event: TransportEvent) {
        match event {
            TransportEvent::Opened => self.on_opened(connection),
            TransportEvent::OpenFailed(message) => self.on_open_failed(connection, message),
            TransportEvent::Closed { code, reason } => self.on_closed(connection, code, reason),
            TransportEvent::Received(result) => self.on_received(connection, result),
            // Reported even after the close; the send was issued while connected.
            TransportEvent::SendFailed(message) => {
                if self.session.lock().current(connection).is_none() {
                    trace!(%connection, "Send failed on finished connection");
                }
                self.notify_error(&Error::send(message).to_string());
            }
        }
    }

    fn on_opened(&self, connection: ConnectionId) {
        {
            let mut session = self.session.lock();
            if session.current(connection).is_none() {
                warn!(%connection, "Open event for superseded connection");
                return;
            }
            session.state = ConnectionState::Connected;
        }

        info!(%connection, endpoint = %self.config.endpoint, "Connected");
        self.listeners.notify_all(|l| l.on_connected());
        self.arm_receive(connection);
    }

    fn on_open_failed(&self, connection: ConnectionId, message: String) {
        let released = {
            let mut session = self.session.lock();
            if session.current(connection).is_none() {
                trace!(%connection, "Stale open failure dropped");
                return;
            }
            session.state = ConnectionState::Disconnected;
            session.active.take()
        };
        drop(released);

        let error = Error::connection(message);
        warn!(%connection, %error, "Open failed");
        self.notify_error(&error.to_string());
    }

    fn on_closed(&self, connection: ConnectionId, code: Option<CloseCode>, reason: Option<String>) {
        let released = {
            let mut session = self.session.lock();
            if session.current(connection).is_none() {
                trace!(%connection, "Stale close dropped");
                return;
            }
            session.state = ConnectionState::Disconnected;
            session.active.take()
        };
        drop(released);

        info!(%connection, ?code, ?reason, "Disconnected");
        self.listeners.notify_all(|l| l.on_disconnected());
    }

    /// Handles one receive completion and re-arms the loop.
    fn on_received(&self, connection: ConnectionId, result: Result<Frame, String>) {
        let failures = {
            let mut session = self.session.lock();
            let connected = session.state.is_connected();
            let Some(active) = session.current(connection).filter(|_| connected) else {
                trace!(%connection, "Stale receive dropped");
                return;
            };

            if result.is_err() {
                active.receive_failures = active.receive_failures.saturating_add(1);
            } else {
                active.receive_failures = 0;
            }
            active.receive_failures
        };

        match result {
            Ok(Frame::Text(text)) => {
                trace!(%connection, len = text.len(), "Text frame");
                self.notify_signal(Some(&text));
            }
            Ok(Frame::Binary(data)) => {
                debug!(%connection, len = data.len(), "Binary frame dropped");
            }
            Ok(Frame::Unsupported(kind)) => {
                let error = Error::unsupported_frame(kind);
                warn!(%connection, %error, "Frame dropped");
                self.notify_error(&error.to_string());
            }
            Err(message) => {
                let error = Error::receive(message);
                warn!(%connection, %error, failures, "Receive failed");
                self.notify_error(&error.to_string());

                if self.config.receive_failure_policy.should_close(failures) {
                    self.close_after_failures(connection, failures);
                }
            }
        }

        self.arm_receive(connection);
    }

    /// Issues the next receive if `connection` is still open.
    fn arm_receive(&self, connection: ConnectionId) {
        let mut session = self.session.lock();
        let connected = session.state.is_connected();
        if let Some(active) = session.current(connection).filter(|_| connected) {
            active.handle.receive();
        }
    }

    fn close_after_failures(&self, connection: ConnectionId, failures: u32) {
        let mut session = self.session.lock();
        if let Some(active) = session.current(connection) {
            warn!(%connection, failures, "Closing after repeated receive failures");
            active
                .handle
                .close(CloseCode::Error, Some(RECEIVE_FAILURE_CLOSE_REASON.to_string()));
        }
    }

    // ========================================================================
    // Notification Passes
    // ========================================================================

    fn notify_error(&self, message: &str) {
        self.listeners.notify_all(|l| l.on_error(message));
    }

    fn notify_signal(&self, signal: Option<&str>) {
        self.listeners.notify_all(|l| {
            if let Some(signal_listener) = l.signal_listener() {
                signal_listener.on_signal(signal);
            }
        });
    }
}
