//! Cursor-based pagination.
//!
//! Collection endpoints return one page at a time inside a
//! [`PaginatedResources`] envelope. [`ApiClient::paginate`] follows the
//! `next_url` cursor page by page, decodes each raw item into the caller's
//! type and streams it to a consumer that can stop the walk at any item.
//!
//! # Example
//!
//! ```rust,ignore
//! use cloud_api::clients::RequestContext;
//!
//! let ctx = RequestContext::new();
//!
//! // Every app
//! let apps: Vec<App> = client.collect_all("/v2/apps?results-per-page=100", &ctx).await?;
//!
//! // Stop at the first match; no further pages are fetched
//! let app = client
//!     .find_first("/v2/apps", &ctx, |app: &App| app.name == "my-app")
//!     .await?;
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::context::RequestContext;
use crate::clients::errors::{ClientError, DecodingError, PaginationError};
use crate::clients::http_client::ApiClient;
use crate::clients::http_request::{HttpMethod, HttpRequest};

/// The wire envelope around one page of a collection.
///
/// A `null`, missing or empty `next_url` marks the last page. A page with a
/// cursor is never the last page, even when it carries no items.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct PaginatedResources {
    /// Path of the next page, relative to the base URL.
    #[serde(default)]
    pub next_url: Option<String>,
    /// Raw, undecoded items in page order.
    #[serde(default)]
    pub resources: Option<Vec<Value>>,
    /// Total number of items across all pages, when reported.
    #[serde(default)]
    pub total_results: Option<u64>,
}

impl PaginatedResources {
    /// Returns the cursor of the next page, or `None` on the last page.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_url.as_deref().filter(|next| !next.is_empty())
    }
}

fn abort(
    cursor: &str,
    pages_fetched: usize,
    items_delivered: usize,
    error: impl Into<ClientError>,
) -> PaginationError {
    PaginationError {
        cursor: cursor.to_string(),
        pages_fetched,
        items_delivered,
        error: error.into(),
    }
}

impl ApiClient {
    /// Walks a paginated collection, handing each item to `consumer`.
    ///
    /// Items arrive in page order, then in order within each page. When
    /// `consumer` returns `false` the walk ends immediately and successfully;
    /// no further page is fetched. An empty `start_path` yields nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError`] on the first failure (request, page
    /// envelope decode, item decode or cancellation), carrying the cursor
    /// that failed. Items already delivered are not retracted.
    pub async fn paginate<T, F>(
        &self,
        start_path: &str,
        ctx: &RequestContext,
        mut consumer: F,
    ) -> Result<(), PaginationError>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> bool,
    {
        let mut cursor = start_path.to_string();
        let mut pages_fetched = 0;
        let mut items_delivered = 0;

        while !cursor.is_empty() {
            ctx.check()
                .map_err(|e| abort(&cursor, pages_fetched, items_delivered, e))?;

            let request = HttpRequest::builder(HttpMethod::Get, cursor.as_str())
                .build()
                .map_err(|e| abort(&cursor, pages_fetched, items_delivered, e))?;

            let page: PaginatedResources = self
                .execute_into(&request, ctx)
                .await
                .map_err(|e| abort(&cursor, pages_fetched, items_delivered, e))?;
            pages_fetched += 1;

            let resources = page.resources.unwrap_or_default();
            tracing::debug!(
                cursor = %cursor,
                items = resources.len(),
                total_results = page.total_results,
                "Fetched page"
            );

            for (index, raw) in resources.into_iter().enumerate() {
                let item: T = serde_json::from_value(raw).map_err(|source| {
                    let error = DecodingError {
                        target: std::any::type_name::<T>(),
                        context: format!("item {index} of page '{cursor}'"),
                        source,
                    };
                    abort(&cursor, pages_fetched, items_delivered, error)
                })?;

                items_delivered += 1;
                if !consumer(item) {
                    tracing::debug!(cursor = %cursor, items_delivered, "Pagination stopped by consumer");
                    return Ok(());
                }
            }

            cursor = page.next_url.filter(|next| !next.is_empty()).unwrap_or_default();
        }

        Ok(())
    }

    /// Collects every item of a paginated collection.
    ///
    /// # Errors
    ///
    /// See [`paginate`](Self::paginate).
    pub async fn collect_all<T: DeserializeOwned>(
        &self,
        start_path: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<T>, PaginationError> {
        let mut items = Vec::new();
        self.paginate(start_path, ctx, |item| {
            items.push(item);
            true
        })
        .await?;
        Ok(items)
    }

    /// Returns the first item matching `predicate`, fetching no further pages
    /// once it is found.
    ///
    /// # Errors
    ///
    /// See [`paginate`](Self::paginate).
    pub async fn find_first<T, P>(
        &self,
        start_path: &str,
        ctx: &RequestContext,
        mut predicate: P,
    ) -> Result<Option<T>, PaginationError>
    where
        T: DeserializeOwned,
        P: FnMut(&T) -> bool,
    {
        let mut found = None;
        self.paginate(start_path, ctx, |item| {
            if predicate(&item) {
                found = Some(item);
                false
            } else {
                true
            }
        })
        .await?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_next_cursor_terminal_forms() {
        let page: PaginatedResources = serde_json::from_value(json!({"next_url": null})).unwrap();
        assert!(page.next_cursor().is_none());

        let page: PaginatedResources = serde_json::from_value(json!({"next_url": ""})).unwrap();
        assert!(page.next_cursor().is_none());

        let page: PaginatedResources = serde_json::from_value(json!({})).unwrap();
        assert!(page.next_cursor().is_none());
        assert!(page.resources.is_none());
    }

    #[test]
    fn test_next_cursor_keeps_query_verbatim() {
        let page: PaginatedResources = serde_json::from_value(json!({
            "next_url": "/v2/apps?order-direction=asc&page=2&results-per-page=50",
            "resources": [],
            "total_results": 75
        }))
        .unwrap();

        assert_eq!(
            page.next_cursor(),
            Some("/v2/apps?order-direction=asc&page=2&results-per-page=50")
        );
        assert_eq!(page.total_results, Some(75));
    }

    #[test]
    fn test_envelope_keeps_items_undecoded() {
        let page: PaginatedResources = serde_json::from_value(json!({
            "resources": [{"name": "a"}, 42, "text"]
        }))
        .unwrap();

        assert_eq!(page.resources.unwrap().len(), 3);
    }
}
