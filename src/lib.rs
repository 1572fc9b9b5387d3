//! Signal Socket - single-connection WebSocket client with listeners.
//!
//! A [`WebSocketClient`] keeps one WebSocket connection, runs a receive
//! loop over it, and broadcasts lifecycle and data events to a dynamic set
//! of listeners.
//!
//! # Architecture
//!
//! ```text
//!  caller ── connect / send / disconnect ──► WebSocketClient ──► TransportHandle
//!                                                  ▲                    │
//!  listeners ◄── notification passes ── dispatcher ◄── TransportEvent ──┘
//! ```
//!
//! Key design principles:
//!
//! - One connection at a time; each `connect()` replaces the handle wholesale
//! - Events from a superseded connection are ignored
//! - A single dispatcher task delivers every notification, in order
//! - Failures never reach the caller; they are reported through `on_error`
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use signal_socket::{Environment, SocketListener, WebSocketClient};
//!
//! struct Status;
//!
//! impl SocketListener for Status {
//!     fn on_connected(&self) { println!("connected"); }
//!     fn on_disconnected(&self) { println!("disconnected"); }
//!     fn on_error(&self, message: &str) { eprintln!("error: {message}"); }
//! }
//!
//! #[tokio::main]
//! async fn main() -> signal_socket::Result<()> {
//!     let client = WebSocketClient::builder()
//!         .environment(Environment::Production)
//!         .build()?;
//!
//!     client.add_listener(Arc::new(Status));
//!     client.connect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`WebSocketClient`] and [`ClientBuilder`] |
//! | [`config`] | Endpoint environments and receive failure policy |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Listener tokens and connection generations |
//! | [`listener`] | Listener capabilities and [`ListenerRegistry`] |
//! | [`state`] | [`ConnectionState`] |
//! | [`transport`] | Transport traits and the tokio-tungstenite transport |

// ============================================================================
// Modules
// ============================================================================

/// WebSocket client and builder.
pub mod client;

/// Client configuration.
pub mod config;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Listener capabilities and registry.
pub mod listener;

/// Connection lifecycle state.
pub mod state;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientBuilder, WebSocketClient};

// Configuration types
pub use config::{ClientConfig, Environment, ReceiveFailurePolicy};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, ListenerId};

// Listener types
pub use listener::{ListenerRegistry, SignalListener, SocketListener};

// State types
pub use state::ConnectionState;

// Transport types
pub use transport::{
    CloseCode, EventSink, Frame, Transport, TransportEvent, TransportHandle, WsTransport,
};
