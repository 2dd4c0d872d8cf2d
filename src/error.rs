//! Configuration error types for the API client.
//!
//! This module contains the error type returned when client configuration or
//! one of its validated newtypes is rejected. The same type is produced by an
//! [`EndpointResolver`](crate::clients::EndpointResolver) that cannot supply a
//! base URL.
//!
//! # Example
//!
//! ```rust
//! use cloud_api::{AccessToken, ConfigError};
//!
//! let result = AccessToken::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyAccessToken)));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring the client or resolving its endpoint.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Access token cannot be empty.
    #[error("Access token cannot be empty. Please provide a valid bearer token.")]
    EmptyAccessToken,

    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Please provide a URL with scheme and host (e.g., 'https://api.example.com').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A default header name or value is invalid.
    #[error("Invalid default header '{name}': {reason}")]
    InvalidHeader {
        /// The header name that was provided.
        name: String,
        /// Why the header was rejected.
        reason: String,
    },

    /// The endpoint resolver could not produce a base URL.
    #[error("Unable to resolve API endpoint: {reason}")]
    UnresolvedEndpoint {
        /// Why the endpoint could not be resolved.
        reason: String,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {reason}")]
    HttpClientBuild {
        /// The reason reported by the HTTP library.
        reason: String,
    },
}
