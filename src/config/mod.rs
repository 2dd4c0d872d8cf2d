//! Configuration types for the API client.
//!
//! This module provides the configuration used to construct an
//! [`ApiClient`](crate::clients::ApiClient).
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ClientConfig`]: Transport settings and initial default headers
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`BaseUrl`]: A validated API base URL
//! - [`AccessToken`]: A bearer credential with masked debug output
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use cloud_api::{AccessToken, ClientConfig};
//!
//! let config = ClientConfig::builder()
//!     .access_token(AccessToken::new("initial-token").unwrap())
//!     .timeout(Duration::from_secs(30))
//!     .user_agent_prefix("my-provider/1.0")
//!     .build()
//!     .unwrap();
//! ```

mod newtypes;

pub use newtypes::{AccessToken, BaseUrl};

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::ConfigError;

/// Configuration for an [`ApiClient`](crate::clients::ApiClient).
///
/// Everything here is fixed at construction time except the access token,
/// which the client replaces when a token refresh succeeds.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    access_token: Option<AccessToken>,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    default_headers: HashMap<String, String>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the initial access token, if configured.
    #[must_use]
    pub const fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the total request timeout applied by the transport, if configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the connect timeout applied by the transport, if configured.
    #[must_use]
    pub const fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Returns the extra default headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// No field is required.
///
/// # Defaults
///
/// - `access_token`: `None` (no `Authorization` header until a refresh succeeds)
/// - `user_agent_prefix`: `None`
/// - `timeout` / `connect_timeout`: `None` (transport defaults)
/// - `default_headers`: empty
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    access_token: Option<AccessToken>,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    default_headers: HashMap<String, String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial access token.
    #[must_use]
    pub fn access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the total timeout for a single round trip.
    ///
    /// A transport timeout surfaces as a network error. To bound a whole
    /// refresh-and-retry sequence or pagination walk, use a
    /// [`RequestContext`](crate::clients::RequestContext) deadline instead.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.default_headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.default_headers.insert(name, value.into());
        self
    }

    /// Builds the [`ClientConfig`], validating the default headers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if a header name or value,
    /// or the access token, cannot be sent over HTTP.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        if let Some(token) = &self.access_token {
            HeaderValue::from_str(&token.header_value()).map_err(|e| ConfigError::InvalidHeader {
                name: "Authorization".to_string(),
                reason: e.to_string(),
            })?;
        }

        for (name, value) in &self.default_headers {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(ClientConfig {
            access_token: self.access_token,
            user_agent_prefix: self.user_agent_prefix,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            default_headers: self.default_headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_header_replaces_regardless_of_case() {
        let config = ClientConfig::builder()
            .default_header("x-region", "eu-de")
            .default_header("X-Region", "us-south")
            .build()
            .unwrap();

        assert_eq!(config.default_headers().len(), 1);
        assert_eq!(
            config.default_headers().get("X-Region"),
            Some(&"us-south".to_string())
        );
    }

    #[test]
    fn test_access_token_with_control_characters_is_rejected() {
        let result = ClientConfig::builder()
            .access_token(AccessToken::new("abc\ndef").unwrap())
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidHeader { name, .. }) if name == "Authorization"
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = ClientConfig::builder().build().unwrap();

        assert!(config.access_token().is_none());
        assert!(config.user_agent_prefix().is_none());
        assert!(config.timeout().is_none());
        assert!(config.connect_timeout().is_none());
        assert!(config.default_headers().is_empty());
    }

    #[test]
    fn test_builder_with_all_optional_fields() {
        let config = ClientConfig::builder()
            .access_token(AccessToken::new("token").unwrap())
            .user_agent_prefix("MyProvider/1.0")
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .default_header("X-Region", "us-south")
            .build()
            .unwrap();

        assert_eq!(config.access_token().unwrap().as_ref(), "token");
        assert_eq!(config.user_agent_prefix(), Some("MyProvider/1.0"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(
            config.default_headers().get("X-Region"),
            Some(&"us-south".to_string())
        );
    }

    #[test]
    fn test_builder_rejects_invalid_header_name() {
        let result = ClientConfig::builder()
            .default_header("Bad Header", "value")
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidHeader { name, .. }) if name == "Bad Header"
        ));
    }

    #[test]
    fn test_builder_rejects_invalid_header_value() {
        let result = ClientConfig::builder()
            .default_header("X-Trace", "line\nbreak")
            .build();

        assert!(matches!(result, Err(ConfigError::InvalidHeader { .. })));
    }

    #[test]
    fn test_config_debug_masks_token() {
        let config = ClientConfig::builder()
            .access_token(AccessToken::new("very-secret").unwrap())
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("ClientConfig"));
        assert!(!debug_str.contains("very-secret"));
    }
}
