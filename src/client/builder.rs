//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use signal_socket::{Environment, ReceiveFailurePolicy, WebSocketClient};
//!
//! # async fn example() -> signal_socket::Result<()> {
//! let client = WebSocketClient::builder()
//!     .environment(Environment::Production)
//!     .receive_failure_policy(ReceiveFailurePolicy::Unbounded)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::{ClientConfig, Environment, ReceiveFailurePolicy, parse_endpoint};
use crate::error::{Error, Result};
use crate::transport::{Transport, WsTransport};

use super::WebSocketClient;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`WebSocketClient`].
///
/// Use [`WebSocketClient::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct ClientBuilder {
    /// Base configuration, e.g. from [`ClientConfig::from_env`].
    config: Option<ClientConfig>,
    /// Environment selecting the endpoint.
    environment: Option<Environment>,
    /// Explicit endpoint override.
    endpoint: Option<String>,
    /// Receive failure handling.
    receive_failure_policy: Option<ReceiveFailurePolicy>,
    /// Transport implementation.
    transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("environment", &self.environment)
            .field("endpoint", &self.endpoint)
            .field("receive_failure_policy", &self.receive_failure_policy)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    ///
    /// Later setters override individual fields.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Selects the endpoint by environment.
    #[inline]
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Overrides the endpoint with an explicit `ws://` or `wss://` URL.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the receive failure policy.
    #[inline]
    #[must_use]
    pub fn receive_failure_policy(mut self, policy: ReceiveFailurePolicy) -> Self {
        self.receive_failure_policy = Some(policy);
        self
    }

    /// Uses a custom transport instead of [`WsTransport`].
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Builds the client and starts its dispatcher.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if called outside a tokio runtime
    /// - [`Error::Config`] / [`Error::InvalidUrl`] if the endpoint is invalid
    pub fn build(self) -> Result<WebSocketClient> {
        let runtime = Handle::try_current().map_err(|_| {
            Error::config(
                "WebSocketClient must be built inside a tokio runtime.\n\
                 Example: call build() from within #[tokio::main]",
            )
        })?;

        let config = self.resolve_config()?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(WsTransport::with_runtime(runtime.clone())),
        };

        Ok(WebSocketClient::new(config, transport, &runtime))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Merges base config, environment, endpoint and policy.
    fn resolve_config(&self) -> Result<ClientConfig> {
        let mut config = match (&self.config, self.environment) {
            (_, Some(environment)) => ClientConfig::new(environment)?,
            (Some(config), None) => config.clone(),
            (None, None) => ClientConfig::new(Environment::default())?,
        };

        if let Some(endpoint) = &self.endpoint {
            config.endpoint = parse_endpoint(endpoint)?;
        }

        if let Some(policy) = self.receive_failure_policy {
            config.receive_failure_policy = policy;
        } else if let Some(base) = &self.config {
            config.receive_failure_policy = base.receive_failure_policy;
        }

        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
