//! CLI module
//!
//! Command-line interface over [`HttpServiceClient`](crate::service::HttpServiceClient).
//!
//! # Commands
//!
//! - `get` - Send a GET request and print the body
//! - `paginate` - Walk a paged endpoint, one item per line

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, PaginationArgs};
pub use runner::Runner;
