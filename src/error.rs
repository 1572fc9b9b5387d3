//! Error types for the signal socket client.
//!
//! Runtime failures never reach the caller of `connect`, `disconnect` or
//! `send`; they are rendered with [`Display`](std::fmt::Display) and handed
//! to listeners through `on_error`. Only construction returns [`Result`].
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::NotConnected`] |
//! | Traffic | [`Error::Send`], [`Error::Receive`], [`Error::UnsupportedFrame`] |
//! | External | [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError;

use crate::state::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint URL could not be parsed.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] ParseError),

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection could not be opened.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Socket task already finished when a send was issued.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation requires an open connection.
    #[error("Not connected: client is {state}")]
    NotConnected {
        /// State the client was in when the operation was attempted.
        state: ConnectionState,
    },

    // ========================================================================
    // Traffic Errors
    // ========================================================================
    /// Outbound message could not be transmitted.
    #[error("Failed to send message: {message}")]
    Send {
        /// Description reported by the transport.
        message: String,
    },

    /// Inbound receive completed with a failure.
    #[error("Failed to receive message: {message}")]
    Receive {
        /// Description reported by the transport.
        message: String,
    },

    /// Inbound frame was neither text nor binary.
    #[error("Unsupported frame: {kind}")]
    UnsupportedFrame {
        /// Short name of the frame kind.
        kind: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// Failure reported by tungstenite while connecting, reading or writing.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected(state: ConnectionState) -> Self {
        Self::NotConnected { state }
    }

    /// Creates a send error.
    #[inline]
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
        }
    }

    /// Creates a receive error.
    #[inline]
    pub fn receive(message: impl Into<String>) -> Self {
        Self::Receive {
            message: message.into(),
        }
    }

    /// Creates an unsupported frame error.
    #[inline]
    pub fn unsupported_frame(kind: impl Into<String>) -> Self {
        Self::UnsupportedFrame { kind: kind.into() }
    }
}

// ============================================================================
// Tests
// ============================================================================
