//! Listener capabilities and registry.
//!
//! Listeners are shared handles (`Arc<dyn SocketListener>`) compared by
//! allocation, never by value.
//!
//! # Capabilities
//!
//! | Trait | Methods | Required |
//! |-------|---------|----------|
//! | [`SocketListener`] | `on_connected`, `on_disconnected`, `on_error` | yes |
//! | [`SignalListener`] | `on_signal` | no, exposed via [`SocketListener::signal_listener`] |

// ============================================================================
// Submodules
// ============================================================================

/// Ordered, identity-deduplicated listener storage.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use registry::ListenerRegistry;

// ============================================================================
// SocketListener
// ============================================================================

/// Receives lifecycle notifications from a [`WebSocketClient`](crate::WebSocketClient).
///
/// All methods run on the client's dispatcher task, one notification pass
/// at a time. Implementations should return quickly and must not block on
/// the client.
pub trait SocketListener: Send + Sync {
    /// The connection opened.
    fn on_connected(&self);

    /// The connection closed.
    fn on_disconnected(&self);

    /// A connection, send or receive failure occurred.
    fn on_error(&self, message: &str);

    /// Returns the optional inbound-text capability.
    ///
    /// Listeners without it are skipped when text arrives.
    fn signal_listener(&self) -> Option<&dyn SignalListener> {
        None
    }
}

// ============================================================================
// SignalListener
// ============================================================================

/// Optional capability: receives inbound text payloads.
pub trait SignalListener: Send + Sync {
    /// A text frame arrived.
    fn on_signal(&self, signal: Option<&str>);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl SocketListener for Plain {
        fn on_connected(&self) {}
        fn on_disconnected(&self) {}
        fn on_error(&self, _message: &str) {}
    }

    struct WithSignal;

    impl SocketListener for WithSignal {
        fn on_connected(&self) {}
        fn on_disconnected(&self) {}
        fn on_error(&self, _message: &str) {}

        fn signal_listener(&self) -> Option<&dyn SignalListener> {
            Some(self)
        }
    }

    impl SignalListener for WithSignal {
        fn on_signal(&self, _signal: Option<&str>) {}
    }

    #[test]
    fn test_signal_capability_defaults_to_none() {
        assert!(Plain.signal_listener().is_none());
    }

    #[test]
    fn test_signal_capability_can_be_exposed() {
        assert!(WithSignal.signal_listener().is_some());
    }
}
