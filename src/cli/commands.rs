//! CLI commands and argument parsing

use crate::pagination::{DEFAULT_PAGE_PARAM, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_PARAM};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line client for paged HTTP services
#[derive(Parser, Debug)]
#[command(name = "demands")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the service (overrides the config file)
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Service configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Request header as `name:value` (repeatable)
    #[arg(short = 'H', long = "header", global = true)]
    pub headers: Vec<String>,

    /// Query parameter as `name=value` (repeatable)
    #[arg(short, long = "query", global = true)]
    pub query: Vec<String>,

    /// Non-2xx status code accepted as success (repeatable)
    #[arg(long, global = true)]
    pub expect: Vec<u16>,

    /// Socket-level retries per request
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a GET request and print the response body
    Get {
        /// Request path, joined onto the base URL
        path: String,
    },

    /// Walk a paged endpoint and print every item
    Paginate {
        /// Request path, joined onto the base URL
        path: String,

        #[command(flatten)]
        pagination: PaginationArgs,
    },
}

/// Pagination flags for the `paginate` command
#[derive(Args, Debug, Clone)]
pub struct PaginationArgs {
    /// Query parameter carrying the page id
    #[arg(long, default_value = DEFAULT_PAGE_PARAM)]
    pub page_param: String,

    /// Query parameter carrying the page size
    #[arg(long, default_value = DEFAULT_PAGE_SIZE_PARAM)]
    pub page_size_param: String,

    /// Items per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Addressing mode: `page` or `item`
    #[arg(long = "type", default_value = "page")]
    pub pagination_type: String,

    /// First page id (or item offset)
    #[arg(long)]
    pub start: Option<u64>,

    /// Key of the item list in an enveloped page
    #[arg(long)]
    pub results_key: Option<String>,

    /// Key of the next-page marker in an enveloped page
    #[arg(long)]
    pub next_key: Option<String>,

    /// Stop after this many items
    #[arg(long)]
    pub max_items: Option<usize>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one item per line)
    Json,
    /// Human-readable output
    Pretty,
}
