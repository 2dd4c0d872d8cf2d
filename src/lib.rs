//! # Cloud API Client Core
//!
//! A reusable async client layer for cloud provider APIs: every resource
//! handler of a provider sends its requests through it.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Validated newtypes for the base URL and bearer token
//! - Base endpoint resolution on every call, static or dynamic
//! - A pre-request hook and an error-translation hook
//! - Transparent bearer token refresh with exactly one retry on `401`
//! - Cursor-based pagination into typed items with early termination
//! - A structured error taxonomy with no transport types leaking out
//! - Cancellation and deadlines threaded through every call
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use cloud_api::{AccessToken, ApiClient, BaseUrl, ClientConfig};
//!
//! let config = ClientConfig::builder()
//!     .access_token(AccessToken::new("initial-token").unwrap())
//!     .user_agent_prefix("my-provider/1.0")
//!     .timeout(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//!
//! let client = ApiClient::new(BaseUrl::new("https://api.example.com").unwrap(), Some(&config)).unwrap();
//! ```
//!
//! ## Token Refresh
//!
//! When a request is rejected with `401`, the client asks its
//! [`TokenRefresher`](auth::TokenRefresher) for a new token, stores it in the
//! `Authorization` default header and re-sends once:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cloud_api::auth::RefreshTokenGrant;
//!
//! let grant = RefreshTokenGrant::new(token_url, "client-id", "client-secret", refresh_token)?;
//! let client = ApiClient::new(base_url, Some(&config))?.with_token_refresher(Arc::new(grant));
//! ```
//!
//! ## Making API Requests
//!
//! ```rust,ignore
//! use cloud_api::clients::RequestContext;
//!
//! let ctx = RequestContext::with_timeout(Duration::from_secs(60));
//!
//! let app: App = client.get("/v2/apps/1234", &ctx).await?;
//!
//! match client.delete("/v2/apps/1234", &ctx).await {
//!     Err(e) if e.is_not_found() => {} // already gone
//!     other => other?,
//! }
//!
//! let apps: Vec<App> = client.collect_all("/v2/apps", &ctx).await?;
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (requests and pages at `debug`, token
//! refreshes at `info`, failures at `warn`) and never installs a subscriber.
//! Tokens are never logged.
//!
//! ## Design Principles
//!
//! - **No global state**: The header set is owned by each client instance
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: The client is `Send + Sync` and safe to share across tasks
//! - **Async-first**: Designed for use with Tokio async runtime
//! - **Immutable requests**: The payload is re-serialized for every send

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;

// Re-export public types at crate root for convenience
pub use config::{AccessToken, BaseUrl, ClientConfig, ClientConfigBuilder};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    ApiClient, ApiError, ClientError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    PaginatedResources, PaginationError, RequestContext,
};

// Re-export token refresh types for convenience
pub use auth::{RefreshError, RefreshTokenGrant, TokenRefresher};
