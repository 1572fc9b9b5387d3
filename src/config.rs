//! Client configuration.
//!
//! The endpoint is chosen once, at construction, from an [`Environment`]
//! or an explicit URL override.
//!
//! # Environment Variables
//!
//! [`ClientConfig::from_env`] reads:
//!
//! | Variable | Values |
//! |----------|--------|
//! | `SIGNAL_SOCKET_ENV` | `debug` or `production` (default) |
//! | `SIGNAL_SOCKET_URL` | explicit `ws://` / `wss://` endpoint, wins over the environment |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Local echo server used during development.
pub const DEBUG_ENDPOINT: &str = "ws://0.0.0.0:8080/echo";

/// Public echo server.
pub const PRODUCTION_ENDPOINT: &str = "wss://echo.websocket.org";

/// Environment variable selecting the [`Environment`].
pub const ENV_VAR_ENVIRONMENT: &str = "SIGNAL_SOCKET_ENV";

/// Environment variable overriding the endpoint URL.
pub const ENV_VAR_URL: &str = "SIGNAL_SOCKET_URL";

/// Consecutive receive failures tolerated by the default policy.
const DEFAULT_MAX_RECEIVE_FAILURES: u32 = 8;

// ============================================================================
// Environment
// ============================================================================

/// Deployment environment, selecting one of two fixed endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Plain-text loopback endpoint ([`DEBUG_ENDPOINT`]).
    Debug,
    /// Encrypted public endpoint ([`PRODUCTION_ENDPOINT`]).
    #[default]
    Production,
}

impl Environment {
    /// Returns the endpoint URL string for this environment.
    #[inline]
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Debug => DEBUG_ENDPOINT,
            Self::Production => PRODUCTION_ENDPOINT,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => f.write_str("debug"),
            Self::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "local" | "dev" => Ok(Self::Debug),
            "production" | "prod" | "master" => Ok(Self::Production),
            other => Err(Error::config(format!(
                "Unknown environment '{other}'. Expected 'debug' or 'production'."
            ))),
        }
    }
}

// ============================================================================
// ReceiveFailurePolicy
// ============================================================================

/// What the receive loop does about repeated receive failures.
///
/// Every failure is reported through `on_error` and the loop re-arms in
/// both modes. There is no delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveFailurePolicy {
    /// Re-arm forever. A transport that keeps failing produces an endless
    /// stream of error notifications.
    Unbounded,
    /// Close the connection once this many consecutive failures have been
    /// reported. A successful receive resets the count.
    CloseAfter(u32),
}

impl ReceiveFailurePolicy {
    /// Returns `true` if `consecutive` failures should tear the connection down.
    #[inline]
    #[must_use]
    pub const fn should_close(self, consecutive: u32) -> bool {
        match self {
            Self::Unbounded => false,
            Self::CloseAfter(limit) => consecutive >= limit,
        }
    }
}

impl Default for ReceiveFailurePolicy {
    fn default() -> Self {
        Self::CloseAfter(DEFAULT_MAX_RECEIVE_FAILURES)
    }
}

// ============================================================================
// ClientConfig
// ============================================================================

/// Immutable client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint the client connects to.
    pub endpoint: Url,
    /// Handling of repeated receive failures.
    pub receive_failure_policy: ReceiveFailurePolicy,
}

impl ClientConfig {
    /// Creates a configuration for the given environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the built-in endpoint does not parse.
    pub fn new(environment: Environment) -> Result<Self> {
        Ok(Self {
            endpoint: Url::parse(environment.endpoint())?,
            receive_failure_policy: ReceiveFailurePolicy::default(),
        })
    }

    /// Creates a configuration for an explicit endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `endpoint` does not parse
    /// - [`Error::Config`] if the scheme is not `ws` or `wss`
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            receive_failure_policy: ReceiveFailurePolicy::default(),
        })
    }

    /// Creates a configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary variable lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_VAR_URL).filter(|v| !v.trim().is_empty()) {
            return Self::with_endpoint(url.trim());
        }

        let environment = match lookup(ENV_VAR_ENVIRONMENT) {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => Environment::default(),
        };

        Self::new(environment)
    }
}

/// Parses and validates a WebSocket endpoint URL.
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)?;

    match url.scheme() {
        "ws" | "wss" => Ok(url),
        scheme => Err(Error::config(format!(
            "Unsupported endpoint scheme '{scheme}'. Use ws:// or wss://."
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_environment_endpoints() {
        assert_eq!(Environment::Debug.endpoint(), "ws://0.0.0.0:8080/echo");
        assert_eq!(Environment::Production.endpoint(), "wss://echo.websocket.org");
    }

    #[test]
    fn test_default_environment_is_production() {
        let config = ClientConfig::new(Environment::default()).expect("valid config");
        assert_eq!(config.endpoint.scheme(), "wss");
        assert_eq!(config.endpoint.host_str(), Some("echo.websocket.org"));
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("debug".parse::<Environment>().unwrap(), Environment::Debug);
        assert_eq!(" Production ".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("master".parse::<Environment>().unwrap(), Environment::Production);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_with_endpoint_rejects_http() {
        let err = ClientConfig::with_endpoint("http://example.com").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_with_endpoint_rejects_garbage() {
        let err = ClientConfig::with_endpoint("::::").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_lookup_defaults_to_production() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).expect("valid config");
        assert_eq!(config.endpoint.as_str(), "wss://echo.websocket.org/");
    }

    #[test]
    fn test_lookup_selects_debug() {
        let config = ClientConfig::from_lookup(lookup_from(&[(ENV_VAR_ENVIRONMENT, "debug")]))
            .expect("valid config");
        assert_eq!(config.endpoint.as_str(), "ws://0.0.0.0:8080/echo");
    }

    #[test]
    fn test_lookup_url_override_wins() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_VAR_ENVIRONMENT, "debug"),
            (ENV_VAR_URL, "ws://127.0.0.1:9001/socket"),
        ]))
        .expect("valid config");
        assert_eq!(config.endpoint.as_str(), "ws://127.0.0.1:9001/socket");
    }

    #[test]
    fn test_lookup_invalid_environment() {
        let result = ClientConfig::from_lookup(lookup_from(&[(ENV_VAR_ENVIRONMENT, "qa")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_failure_policy() {
        assert!(!ReceiveFailurePolicy::Unbounded.should_close(u32::MAX));
        assert!(!ReceiveFailurePolicy::CloseAfter(3).should_close(2));
        assert!(ReceiveFailurePolicy::CloseAfter(3).should_close(3));
        assert_eq!(ReceiveFailurePolicy::default(), ReceiveFailurePolicy::CloseAfter(8));
    }
}
