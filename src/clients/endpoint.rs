//! Base endpoint resolution.
//!
//! The client asks its [`EndpointResolver`] for the base URL once per
//! execute call, so the endpoint may change between calls (for example
//! after a region switch). A resolution failure is fatal for that call and
//! is never retried.

use std::fmt;

use crate::config::BaseUrl;
use crate::error::ConfigError;

/// Supplies the current base URL.
pub trait EndpointResolver: Send + Sync {
    /// Returns the base URL to use for the next request.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no usable endpoint is configured.
    fn resolve(&self) -> Result<BaseUrl, ConfigError>;
}

/// A fixed base URL resolves to itself.
impl EndpointResolver for BaseUrl {
    fn resolve(&self) -> Result<BaseUrl, ConfigError> {
        Ok(self.clone())
    }
}

/// An endpoint computed by a closure on every call.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, RwLock};
/// use cloud_api::{BaseUrl, ConfigError};
/// use cloud_api::clients::{DynamicEndpoint, EndpointResolver};
///
/// let region = Arc::new(RwLock::new("us-south".to_string()));
/// let current = Arc::clone(&region);
/// let endpoint = DynamicEndpoint::new(move || {
///     let region = current.read().map_err(|_| ConfigError::UnresolvedEndpoint {
///         reason: "region lock poisoned".to_string(),
///     })?;
///     BaseUrl::new(format!("https://api.{region}.example.com"))
/// });
///
/// assert_eq!(endpoint.resolve().unwrap().as_ref(), "https://api.us-south.example.com");
/// *region.write().unwrap() = "eu-de".to_string();
/// assert_eq!(endpoint.resolve().unwrap().as_ref(), "https://api.eu-de.example.com");
/// ```
pub struct DynamicEndpoint<F>(F);

impl<F> DynamicEndpoint<F>
where
    F: Fn() -> Result<BaseUrl, ConfigError> + Send + Sync,
{
    /// Wraps a closure that computes the base URL.
    pub const fn new(resolve: F) -> Self {
        Self(resolve)
    }
}

impl<F> EndpointResolver for DynamicEndpoint<F>
where
    F: Fn() -> Result<BaseUrl, ConfigError> + Send + Sync,
{
    fn resolve(&self) -> Result<BaseUrl, ConfigError> {
        (self.0)()
    }
}

impl<F> fmt::Debug for DynamicEndpoint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DynamicEndpoint(..)")
    }
}
