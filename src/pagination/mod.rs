//! Pagination module
//!
//! Linode list endpoints are page-number paginated: each response carries
//! `page`, `pages`, `results` and a `data` array.
//!
//! # Overview
//!
//! - [`ListOptions`] selects a page, page size and filter, and receives the
//!   page counters back after a call
//! - [`Client::list_all`](crate::Client::list_all) walks every page or
//!   fetches one explicit page
//! - [`ResponseCache`] backs
//!   [`Client::list_all_cached`](crate::Client::list_all_cached) for
//!   read-mostly catalog endpoints

mod cache;
mod paginator;
mod types;

pub use cache::ResponseCache;
pub use types::{
    ListOptions, PageOptions, PaginatedResponse, FILTER_HEADER, PAGE_PARAM, PAGE_SIZE_PARAM,
};
