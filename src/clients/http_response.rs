//! HTTP response type for the API client.
//!
//! The response keeps the raw body text; decoding into a caller type is an
//! explicit, separate step so that decode failures stay distinguishable from
//! API failures.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::clients::errors::DecodingError;

/// An HTTP response from the API.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: u16,
    /// Response headers, lower-cased names (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub const fn new(status: u16, headers: HashMap<String, Vec<String>>, body: String) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns the first value of a header, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Deserializes the body into `T`.
    ///
    /// An empty body decodes as JSON `null`, so `()` and `Option<_>` targets
    /// accept bodiless responses such as `204 No Content`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodingError`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DecodingError> {
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };

        serde_json::from_str(body).map_err(|source| DecodingError {
            target: std::any::type_name::<T>(),
            context: format!("response body, status {}", self.status),
            source,
        })
    }
}
