//! Pagination module
//!
//! Supports: page-indexed and item-offset addressing, short-page and
//! next-marker termination, lazy and random-access traversal.
//!
//! # Overview
//!
//! The engine drives a caller-supplied fetch function that accepts a page
//! id and a page size and returns one page of results. It never performs
//! I/O itself. Two faces share the same page-id strategy and fetch
//! contract:
//!
//! - [`PaginatedApiIterator`] / [`paginate_stream`]: forward-only over
//!   bare or enveloped pages, each page fetched exactly once.
//! - [`PaginatedResults`]: restartable, indexable and sliceable over bare
//!   pages, with an unbounded per-instance page cache.

mod iterator;
mod results;
mod types;

pub use iterator::{paginate_stream, PaginatedApiIterator, ENVELOPED_PAGE_START};
pub use results::{Iter, PaginatedResults, SIMPLE_PAGE_START};
pub use types::{
    Envelope, FetchArgs, IntoEnvelope, PageFetcher, PageIds, PageRequest, PaginationOptions,
    PaginationType, DEFAULT_PAGE_PARAM, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_PARAM,
};
