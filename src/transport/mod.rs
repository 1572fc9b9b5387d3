//! WebSocket transport layer.
//!
//! The transport is the collaborator that owns the socket. The client
//! talks to it through two traits and hears back through one channel:
//!
//! ```text
//! ┌──────────────────┐  open / send / receive / close  ┌──────────────────┐
//! │  WebSocketClient │ ──────────────────────────────► │  TransportHandle │
//! │                  │                                 │  (socket task)   │
//! │   dispatcher  ◄──┼──────── EventSink ──────────────┤                  │
//! └──────────────────┘   TransportEvent, in order      └──────────────────┘
//! ```
//!
//! Every event carries the [`ConnectionId`] of the connection that produced
//! it, so the client can ignore events from a superseded connection.
//!
//! # Receive Model
//!
//! Receives are armed one at a time: [`TransportHandle::receive`] asks for
//! exactly one inbound frame, delivered as [`TransportEvent::Received`].
//! The client re-arms after handling each completion.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | tokio-tungstenite implementation ([`WsTransport`]) |

// ============================================================================
// Submodules
// ============================================================================

/// tokio-tungstenite transport.
pub mod websocket;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::mpsc;
use tracing::trace;
use url::Url;

use crate::client::dispatch::Dispatch;
use crate::identifiers::ConnectionId;

// ============================================================================
// Re-exports
// ============================================================================

pub use websocket::WsTransport;

// ============================================================================
// CloseCode
// ============================================================================

/// WebSocket close status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseCode {
    /// 1000: normal closure.
    Normal,
    /// 1001: endpoint going away.
    Away,
    /// 1011: unexpected condition.
    Error,
    /// Any other status code.
    Other(u16),
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        match code {
            1000 => Self::Normal,
            1001 => Self::Away,
            1011 => Self::Error,
            other => Self::Other(other),
        }
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        match code {
            CloseCode::Normal => 1000,
            CloseCode::Away => 1001,
            CloseCode::Error => 1011,
            CloseCode::Other(other) => other,
        }
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u16::from(*self))
    }
}

// ============================================================================
// Frame
// ============================================================================

/// One inbound unit delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload.
    Text(String),
    /// Binary payload.
    Binary(Vec<u8>),
    /// Any other frame kind the transport surfaced, by name.
    Unsupported(String),
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Event reported by a transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed; the connection is open.
    Opened,
    /// Connection could not be opened. No further events follow.
    OpenFailed(String),
    /// Connection closed. Only [`TransportEvent::SendFailed`] for later
    /// sends can follow.
    Closed {
        /// Close code, if a close frame was exchanged.
        code: Option<CloseCode>,
        /// Close reason, if one was given.
        reason: Option<String>,
    },
    /// Completion of one armed receive.
    Received(Result<Frame, String>),
    /// An outbound message could not be transmitted.
    SendFailed(String),
}

// ============================================================================
// EventSink
// ============================================================================

/// Ordered channel from one transport connection into the client.
#[derive(Debug, Clone)]
pub struct EventSink {
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<Dispatch>,
}

impl EventSink {
    /// Creates a sink tagging events with `connection`.
    pub(crate) fn new(connection: ConnectionId, tx: mpsc::UnboundedSender<Dispatch>) -> Self {
        Self { connection, tx }
    }

    /// Returns the connection this sink belongs to.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Delivers an event to the client.
    ///
    /// Returns `false` if the client has gone away.
    pub fn emit(&self, event: TransportEvent) -> bool {
        trace!(connection = %self.connection, ?event, "Transport event");
        self.tx
            .send(Dispatch::Transport {
                connection: self.connection,
                event,
            })
            .is_ok()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Opens transport connections.
pub trait Transport: Send + Sync + 'static {
    /// Starts connecting to `url` without blocking.
    ///
    /// The outcome is reported through `events`: [`TransportEvent::Opened`]
    /// or [`TransportEvent::OpenFailed`].
    fn open(&self, url: &Url, events: EventSink) -> Box<dyn TransportHandle>;
}

/// Live connection owned by the client.
///
/// Calls made before [`TransportEvent::Opened`] take effect once the
/// connection opens. Dropping the handle closes the connection.
pub trait TransportHandle: Send + Sync {
    /// Queues a text message. Failures arrive as [`TransportEvent::SendFailed`].
    fn send(&self, text: String);

    /// Arms one receive. The result arrives as [`TransportEvent::Received`].
    fn receive(&self);

    /// Starts the closing handshake. Completion arrives as [`TransportEvent::Closed`].
    fn close(&self, code: CloseCode, reason: Option<String>);
}

// ============================================================================
// Tests
// ============================================================================
