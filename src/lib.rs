// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # demands
//!
//! Pagination engine and base HTTP service client.
//!
//! ## Features
//!
//! - **Lazy pagination**: forward-only iteration over page-indexed or
//!   item-offset APIs, sync ([`PaginatedApiIterator`]) or async
//!   ([`paginate_stream`])
//! - **Random access**: restartable, indexable and sliceable results backed
//!   by a per-instance page cache ([`PaginatedResults`])
//! - **Enveloped pages**: results and next-page marker read from keyed
//!   JSON objects
//! - **Service client**: shared request params, success demands, socket
//!   retries and hooks ([`HttpServiceClient`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use demands::{FetchArgs, PageRequest, PaginatedResults, PaginationOptions, Result};
//!
//! let fetch = |request: &PageRequest| -> Result<Vec<u64>> {
//!     // call the API with request.page_id and request.page_size
//!     Ok(vec![])
//! };
//!
//! let mut results = PaginatedResults::new(fetch, FetchArgs::new(), PaginationOptions::new());
//! let first = results.get(0)?;
//! let some = results.slice(10..20, 1)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      PaginationOptions                        │
//! │   page_ids() → PageIds     locate(index) → (page_id, offset)  │
//! └───────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────────────┬──────┴───────────────┬─────────────────┐
//! │ PaginatedApiIterator │   paginate_stream    │ PaginatedResults│
//! ├──────────────────────┼──────────────────────┼─────────────────┤
//! │ sync, forward-only   │ async, forward-only  │ cached, indexed │
//! │ bare or enveloped    │ bare or enveloped    │ bare pages      │
//! └──────────────────────┴──────────────────────┴─────────────────┘
//!                               │
//!                    PageFetcher / HttpServiceClient
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pagination engine
pub mod pagination;

/// HTTP service client
pub mod service;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result, ResultExt};
pub use types::*;

// Re-export commonly used types
pub use pagination::{
    paginate_stream, Envelope, FetchArgs, PageFetcher, PageRequest, PaginatedApiIterator,
    PaginatedResults, PaginationOptions, PaginationType,
};
pub use service::{Auth, ClientIdentity, HttpServiceClient, RequestHooks, RequestParams, ServiceConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
