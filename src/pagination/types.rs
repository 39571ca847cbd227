//! Pagination types and traits
//!
//! Defines the options, page-id strategy, fetch contract and page envelope
//! shared by both pagination faces.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default name of the page (or offset) argument
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// Default name of the page size argument
pub const DEFAULT_PAGE_SIZE_PARAM: &str = "page_size";

/// Default number of items requested per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

// ============================================================================
// Pagination Type
// ============================================================================

/// How the fetch function interprets the page argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PaginationType {
    /// The page argument is a page index
    #[default]
    Page,
    /// The page argument is an item offset
    Item,
}

impl PaginationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Item => "item",
        }
    }
}

impl fmt::Display for PaginationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaginationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "page" => Ok(Self::Page),
            "item" => Ok(Self::Item),
            other => Err(Error::unknown_pagination_type(other)),
        }
    }
}

impl TryFrom<String> for PaginationType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

// ============================================================================
// Options
// ============================================================================

/// Configuration for a paginated traversal
///
/// Options are fixed once an iterator has been built from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationOptions {
    /// Name of the page (or offset) argument
    pub page_param: String,
    /// Name of the page size argument
    pub page_size_param: String,
    /// Items requested per fetch, must be positive
    pub page_size: usize,
    /// Page index or item offset addressing
    pub pagination_type: PaginationType,
    /// First page id; each face picks its own default when unset
    pub start: Option<u64>,
    /// Key holding the items of an enveloped page
    pub results_key: Option<String>,
    /// Key whose null value marks the last page of an enveloped traversal
    pub next_key: Option<String>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page_param: DEFAULT_PAGE_PARAM.to_string(),
            page_size_param: DEFAULT_PAGE_SIZE_PARAM.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            pagination_type: PaginationType::Page,
            start: None,
            results_key: None,
            next_key: None,
        }
    }
}

impl PaginationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from a string-keyed map, rejecting unknown keys
    pub fn from_map(map: &JsonObject) -> Result<Self> {
        let mut options = Self::default();

        for (key, value) in map {
            match key.as_str() {
                "page_param" => options.page_param = expect_str(key, value)?,
                "page_size_param" => options.page_size_param = expect_str(key, value)?,
                "page_size" => {
                    let size = expect_u64(key, value)?;
                    if size == 0 {
                        return Err(Error::invalid_option(key, "page size must be positive"));
                    }
                    options.page_size = usize::try_from(size)
                        .map_err(|_| Error::invalid_option(key, "page size too large"))?;
                }
                "pagination_type" => {
                    options.pagination_type = expect_str(key, value)?.parse()?;
                }
                "start" => {
                    options.start = if value.is_null() {
                        None
                    } else {
                        Some(expect_u64(key, value)?)
                    };
                }
                "results_key" => options.results_key = optional_str(key, value)?,
                "next_key" => options.next_key = optional_str(key, value)?,
                _ => return Err(Error::unknown_option(key)),
            }
        }

        Ok(options)
    }

    /// Build options from a JSON object value
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Self::from_map(map),
            _ => Err(Error::config("pagination options must be an object")),
        }
    }

    #[must_use]
    pub fn page_param(mut self, name: impl Into<String>) -> Self {
        self.page_param = name.into();
        self
    }

    #[must_use]
    pub fn page_size_param(mut self, name: impl Into<String>) -> Self {
        self.page_size_param = name.into();
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    #[must_use]
    pub fn pagination_type(mut self, pagination_type: PaginationType) -> Self {
        self.pagination_type = pagination_type;
        self
    }

    #[must_use]
    pub fn start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn results_key(mut self, key: impl Into<String>) -> Self {
        self.results_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn next_key(mut self, key: impl Into<String>) -> Self {
        self.next_key = Some(key.into());
        self
    }

    /// First page id, using `page_default` when page addressing has no start
    pub fn resolved_start(&self, page_default: u64) -> u64 {
        match self.pagination_type {
            PaginationType::Page => self.start.unwrap_or(page_default),
            PaginationType::Item => self.start.unwrap_or(0),
        }
    }

    /// The unbounded page id sequence for this configuration
    pub fn page_ids(&self, page_default: u64) -> PageIds {
        let step = match self.pagination_type {
            PaginationType::Page => 1,
            PaginationType::Item => self.page_size as u64,
        };
        PageIds::new(self.resolved_start(page_default), step)
    }

    /// Translate an absolute item index into `(page_id, offset)`
    ///
    /// A zero page size maps every index onto the first page.
    pub fn locate(&self, index: usize, page_default: u64) -> (u64, usize) {
        let page = index.checked_div(self.page_size).unwrap_or(0) as u64;
        let offset = index.checked_rem(self.page_size).unwrap_or(index);
        let start = self.resolved_start(page_default);

        match self.pagination_type {
            PaginationType::Page => (start + page, offset),
            PaginationType::Item => (start + page * self.page_size as u64, offset),
        }
    }

    fn effective_results_key(&self) -> Option<&str> {
        self.results_key.as_deref().filter(|key| !key.is_empty())
    }

    fn effective_next_key(&self) -> Option<&str> {
        self.next_key.as_deref().filter(|key| !key.is_empty())
    }
}

fn expect_str(key: &str, value: &JsonValue) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_option(key, format!("expected a string, got {value}")))
}

fn optional_str(key: &str, value: &JsonValue) -> Result<Option<String>> {
    if value.is_null() {
        Ok(None)
    } else {
        expect_str(key, value).map(Some)
    }
}

fn expect_u64(key: &str, value: &JsonValue) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        Error::invalid_option(key, format!("expected a non-negative integer, got {value}"))
    })
}

// ============================================================================
// Page Ids
// ============================================================================

/// Infinite, strictly increasing sequence of page ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageIds {
    next: u64,
    step: u64,
}

impl PageIds {
    pub fn new(start: u64, step: u64) -> Self {
        Self { next: start, step }
    }

    /// Take the next page id
    pub fn advance(&mut self) -> u64 {
        let current = self.next;
        self.next += self.step;
        current
    }

    /// The id the next call to `advance` will return
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Iterator for PageIds {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        Some(self.advance())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

// ============================================================================
// Fetch Contract
// ============================================================================

/// Fixed arguments passed through unchanged on every fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchArgs {
    /// Positional arguments
    pub args: Vec<JsonValue>,
    /// Keyword arguments
    pub kwargs: JsonObject,
}

impl FetchArgs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<JsonValue>) -> Self {
        self.args.push(value.into());
        self
    }

    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

/// Arguments for one call of the fetch function
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Page index or item offset being requested
    pub page_id: u64,
    /// Number of items requested
    pub page_size: usize,
    /// Fixed positional arguments
    pub args: Vec<JsonValue>,
    /// Fixed keyword arguments merged with the page and page size arguments
    pub kwargs: JsonObject,
}

impl PageRequest {
    /// Merge the fixed arguments with the page arguments for `page_id`
    pub fn new(fixed: &FetchArgs, options: &PaginationOptions, page_id: u64) -> Self {
        let mut kwargs = fixed.kwargs.clone();
        kwargs.insert(options.page_param.clone(), JsonValue::from(page_id));
        kwargs.insert(
            options.page_size_param.clone(),
            JsonValue::from(options.page_size as u64),
        );

        Self {
            page_id,
            page_size: options.page_size,
            args: fixed.args.clone(),
            kwargs,
        }
    }

    /// Look up a keyword argument
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.kwargs.get(key)
    }

    /// Keyword arguments rendered as query string pairs
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.kwargs
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

/// Supplies pages to the pagination engine
///
/// Errors returned here reach the consumer unchanged.
pub trait PageFetcher<P> {
    fn fetch(&mut self, request: &PageRequest) -> Result<P>;
}

impl<P, F> PageFetcher<P> for F
where
    F: FnMut(&PageRequest) -> Result<P>,
{
    fn fetch(&mut self, request: &PageRequest) -> Result<P> {
        self(request)
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A fetched page, either a bare item list or a keyed envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// The page is the item sequence itself
    Bare(Vec<T>),
    /// Items extracted from a mapping, plus the next marker
    Keyed {
        items: Vec<T>,
        /// `None`: marker absent. `Some(None)`: present and null.
        next: Option<Option<String>>,
    },
}

impl<T> Envelope<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Self::Bare(items) | Self::Keyed { items, .. } => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Keyed { items, .. } => items,
        }
    }

    pub fn size(&self) -> usize {
        self.items().len()
    }

    /// Whether no page should be fetched after this one
    pub fn is_last_page(&self, page_size: usize) -> bool {
        match self {
            Self::Keyed { next: Some(None), .. } => true,
            _ if page_size == 0 => true,
            Self::Keyed { .. } | Self::Bare(_) => self.size() < page_size,
        }
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Interpret a JSON page according to `results_key` and `next_key`
    pub fn from_json(value: JsonValue, options: &PaginationOptions) -> Result<Self> {
        let results_key = options.effective_results_key();

        match value {
            JsonValue::Array(items) => match results_key {
                Some(key) => Err(Error::record_extraction(
                    key,
                    "expected an object page, got an array",
                )),
                None => Ok(Self::Bare(decode_items(items)?)),
            },
            JsonValue::Object(mut map) => {
                let next = options
                    .effective_next_key()
                    .and_then(|key| map.get(key))
                    .map(next_marker);

                let Some(key) = results_key else {
                    return Err(Error::record_extraction(
                        "$",
                        "object page requires a results_key",
                    ));
                };

                let items = match map.remove(key) {
                    Some(JsonValue::Array(items)) => items,
                    Some(other) => {
                        return Err(Error::record_extraction(
                            key,
                            format!("expected an array, got {other}"),
                        ))
                    }
                    None => return Err(Error::record_extraction(key, "key not found in page")),
                };

                Ok(Self::Keyed {
                    items: decode_items(items)?,
                    next,
                })
            }
            other => Err(Error::record_extraction(
                results_key.unwrap_or("$"),
                format!("expected an array or object page, got {other}"),
            )),
        }
    }
}

fn decode_items<T: DeserializeOwned>(items: Vec<JsonValue>) -> Result<Vec<T>> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(Error::from))
        .collect()
}

fn next_marker(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Conversion from a raw fetch result into an [`Envelope`]
pub trait IntoEnvelope<T> {
    fn into_envelope(self, options: &PaginationOptions) -> Result<Envelope<T>>;
}

impl<T> IntoEnvelope<T> for Vec<T> {
    fn into_envelope(self, _options: &PaginationOptions) -> Result<Envelope<T>> {
        Ok(Envelope::Bare(self))
    }
}

impl<T> IntoEnvelope<T> for Envelope<T> {
    fn into_envelope(self, _options: &PaginationOptions) -> Result<Envelope<T>> {
        Ok(self)
    }
}

impl<T: DeserializeOwned> IntoEnvelope<T> for JsonValue {
    fn into_envelope(self, options: &PaginationOptions) -> Result<Envelope<T>> {
        Envelope::from_json(self, options)
    }
}
