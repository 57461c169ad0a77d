//! Page-number paginator
//!
//! Fetches the first (or the explicitly requested) page, then walks
//! `2..=pages` sequentially using the page count reported by that first
//! response. Any failure aborts the whole listing; callers never get a
//! partial collection.

use super::types::{ListOptions, PageOptions, PaginatedResponse, PAGE_PARAM};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::http::HttpRequest;
use crate::types::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

impl Client {
    /// List every item of a paginated endpoint.
    ///
    /// With an explicit page in `options` only that page is fetched.
    /// Otherwise all pages are fetched in order and concatenated. The page
    /// counters of the last fetched page are written back into `options`.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: Option<&mut ListOptions>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        let mut defaults = ListOptions::default();
        let options = options.unwrap_or(&mut defaults);
        let requested = *options.page_options.get_or_insert_with(PageOptions::default);

        let base = options.apply_to(self.request(Method::GET, endpoint));

        let page_defined = requested.page > 0;
        let starting_page = if page_defined { requested.page } else { 1 };

        let mut result = Vec::new();

        let first = self.fetch_page::<T>(&base, starting_page, cancel).await?;
        let pages = first.pages;
        let results = first.results;
        record_page(options, starting_page, &first);
        result.extend(first.data);

        if page_defined {
            return Ok(result);
        }

        for page in 2..=pages {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let response = self.fetch_page::<T>(&base, page, cancel).await?;
            if response.pages != pages || response.results != results {
                warn!(
                    "{} changed during pagination: page {} reports {} pages/{} results, first page reported {}/{}",
                    endpoint, page, response.pages, response.results, pages, results
                );
            }
            record_page(options, page, &response);
            result.extend(response.data);
        }

        Ok(result)
    }

    /// List an endpoint through the response cache.
    ///
    /// A live entry for the same endpoint and options is returned without
    /// any request; otherwise the full listing is stored for the configured
    /// TTL. Falls back to [`Client::list_all`] when caching is disabled.
    pub async fn list_all_cached<T>(
        &self,
        endpoint: &str,
        options: Option<&mut ListOptions>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        if !self.config().use_cache {
            return self.list_all(endpoint, options, cancel).await;
        }

        let key = options
            .as_deref()
            .map_or_else(|| endpoint.to_string(), |o| o.cache_key(endpoint));

        if let Some(hit) = self.cache().get::<Vec<T>>(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let result = self.list_all::<T>(endpoint, options, cancel).await?;
        self.cache().insert(key, result.clone()).await;
        Ok(result)
    }

    /// Drop every cached listing
    pub async fn invalidate_cache(&self) {
        self.cache().invalidate().await;
    }

    /// Drop cached listings of one endpoint
    pub async fn invalidate_cache_endpoint(&self, endpoint: &str) {
        self.cache().invalidate_endpoint(endpoint).await;
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        base: &HttpRequest,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<PaginatedResponse<T>> {
        let request = base.clone().query(PAGE_PARAM, page.to_string());
        let response = self.execute(request, cancel).await?;
        let decoded: PaginatedResponse<T> = crate::client::decode_body(&response.body)?;

        debug!(
            "{} page {}/{}: {} items ({} total)",
            base.path,
            page,
            decoded.pages,
            decoded.data.len(),
            decoded.results
        );
        Ok(decoded)
    }
}

fn record_page<T>(options: &mut ListOptions, page: u32, response: &PaginatedResponse<T>) {
    options.page_options = Some(PageOptions {
        page,
        pages: response.pages,
        results: response.results,
    });
}
