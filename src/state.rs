//! Connection lifecycle state.
//!
//! ```text
//! Disconnected ──connect()──► Connecting ──opened──► Connected
//!      ▲                          │                      │
//!      └────────open failed───────┘                      │
//!      └──────────────closed (remote or disconnect())────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`WebSocketClient`](crate::WebSocketClient).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection and no attempt in flight.
    #[default]
    Disconnected,
    /// Transport asked to open, waiting for the open event.
    Connecting,
    /// Transport confirmed the connection is open.
    Connected,
}

impl ConnectionState {
    /// Returns `true` if `connect()` should start a new connection.
    #[inline]
    #[must_use]
    pub const fn can_connect(self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Returns `true` if `disconnect()` and `send()` act on the transport.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns the lowercase state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
