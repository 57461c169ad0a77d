//! Pagination types
//!
//! [`ListOptions`] is both input (explicit page, page size, filter) and
//! output: after a listing call it holds the last fetched page and the
//! totals the provider reported.

use crate::http::HttpRequest;
use serde::{Deserialize, Serialize};

/// Header carrying the raw filter expression
pub const FILTER_HEADER: &str = "X-Filter";
/// Query parameter selecting a page
pub const PAGE_PARAM: &str = "page";
/// Query parameter selecting the page size
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Page selection and the page counters written back after a call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOptions {
    /// Explicit page on input (0 = all pages); last fetched page on output
    #[serde(default)]
    pub page: u32,
    /// Total pages reported by the provider
    #[serde(default)]
    pub pages: u32,
    /// Total results reported by the provider
    #[serde(default)]
    pub results: u32,
}

impl PageOptions {
    /// Request exactly one page
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }
}

/// Options for a listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Page selection; `None` or page 0 means every page
    pub page_options: Option<PageOptions>,
    /// Results per page
    pub page_size: Option<u32>,
    /// Opaque filter expression sent verbatim
    pub filter: Option<String>,
}

impl ListOptions {
    /// Options for one page (0 = all) with a filter expression
    pub fn new(page: u32, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        Self {
            page_options: Some(PageOptions::page(page)),
            page_size: None,
            filter: (!filter.is_empty()).then_some(filter),
        }
    }

    /// Select a single page
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page_options = Some(PageOptions::page(page));
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Set the filter expression
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Explicitly requested page, if any
    pub fn requested_page(&self) -> Option<u32> {
        self.page_options.map(|p| p.page).filter(|page| *page > 0)
    }

    /// Last page fetched by the previous call
    pub fn page(&self) -> u32 {
        self.page_options.map_or(0, |p| p.page)
    }

    /// Total pages reported by the previous call
    pub fn pages(&self) -> u32 {
        self.page_options.map_or(0, |p| p.pages)
    }

    /// Total results reported by the previous call
    pub fn results(&self) -> u32 {
        self.page_options.map_or(0, |p| p.results)
    }

    /// Add the filter header and page size to a base request
    pub(crate) fn apply_to(&self, mut request: HttpRequest) -> HttpRequest {
        if let Some(filter) = self.filter.as_deref().filter(|f| !f.is_empty()) {
            request = request.header(FILTER_HEADER, filter);
        }
        if let Some(page_size) = self.page_size.filter(|size| *size > 0) {
            request.set_query(PAGE_SIZE_PARAM, page_size.to_string());
        }
        request
    }

    /// Cache key for `endpoint` listed with these options
    pub fn cache_key(&self, endpoint: &str) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(page) = self.requested_page() {
            query.append_pair(PAGE_PARAM, &page.to_string());
        }
        if let Some(page_size) = self.page_size.filter(|size| *size > 0) {
            query.append_pair(PAGE_SIZE_PARAM, &page_size.to_string());
        }
        if let Some(filter) = self.filter.as_deref().filter(|f| !f.is_empty()) {
            query.append_pair("filter", filter);
        }

        let query = query.finish();
        if query.is_empty() {
            endpoint.to_string()
        } else {
            format!("{endpoint}?{query}")
        }
    }
}

/// One page as returned by a listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Page number of this response
    #[serde(default)]
    pub page: u32,
    /// Total number of pages
    #[serde(default)]
    pub pages: u32,
    /// Total number of results
    #[serde(default)]
    pub results: u32,
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}
