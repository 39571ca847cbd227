//! HTTP service client module
//!
//! An extendable base for clients of a single HTTP service.
//!
//! # Features
//!
//! - **Shared Parameters**: headers, query, cookies, auth and expectations
//!   configured once and merged into every call
//! - **Success Demand**: any status >= 300 fails with
//!   [`Error::HttpService`](crate::Error::HttpService) unless listed in
//!   `expected_response_codes`
//! - **Client Identification**: `User-Agent: "{name} {version} - {app}"`
//! - **Pagination**: stream the items of paged JSON endpoints

mod client;
mod config;

pub use client::{HttpServiceClient, RequestHooks};
pub use config::{Auth, ClientIdentity, RequestParams, ServiceConfig, JSON_CONTENT_TYPE};

#[cfg(test)]
mod tests;
