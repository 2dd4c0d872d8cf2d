//! Token refresh for the API client.
//!
//! # Overview
//!
//! - [`TokenRefresher`]: The seam the client calls after a `401 Unauthorized`
//! - [`RefreshError`]: Distinguishes a terminally invalid token from a failed refresh
//! - [`RefreshTokenGrant`]: A refresher backed by an OAuth 2.0 `refresh_token` grant
//!
//! The client never persists tokens. A refresher hands back a new
//! [`AccessToken`](crate::AccessToken); the client caches it in its default
//! `Authorization` header and re-sends the failed request once.

mod refresh_grant;
mod refresher;

pub use refresh_grant::{RefreshTokenGrant, TokenGrantError};
pub use refresher::{RefreshError, TokenRefresher};
