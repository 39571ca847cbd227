//! Random-access view over a paginated function
//!
//! Pages are cached by page id for the lifetime of the [`PaginatedResults`]
//! instance and never evicted.

use super::types::{FetchArgs, PageFetcher, PageIds, PageRequest, PaginationOptions};
use crate::error::{Error, Result};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::iter::FusedIterator;
use std::ops::{Bound, RangeBounds};
use tracing::{debug, trace};

/// First page number for random-access traversals when `start` is unset
pub const SIMPLE_PAGE_START: u64 = 0;

/// Restartable, indexable and sliceable sequence backed by a page cache
///
/// Only short-page termination applies: a traversal ends on the first page
/// holding fewer than `page_size` items.
pub struct PaginatedResults<F, T> {
    fetcher: F,
    args: FetchArgs,
    options: PaginationOptions,
    cache: BTreeMap<u64, Vec<T>>,
    fetches: usize,
}

impl<F, T> PaginatedResults<F, T>
where
    F: PageFetcher<Vec<T>>,
{
    pub fn new(fetcher: F, args: FetchArgs, options: PaginationOptions) -> Self {
        Self {
            fetcher,
            args,
            options,
            cache: BTreeMap::new(),
            fetches: 0,
        }
    }

    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    /// Number of times the fetch function has been called
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Number of pages held in the cache
    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    /// Get the page for `page_id`, fetching it on a cache miss
    pub fn page(&mut self, page_id: u64) -> Result<&[T]> {
        match self.cache.entry(page_id) {
            Entry::Occupied(entry) => {
                trace!(page_id, "Page cache hit");
                Ok(entry.into_mut().as_slice())
            }
            Entry::Vacant(entry) => {
                let request = PageRequest::new(&self.args, &self.options, page_id);
                debug!(page_id, page_size = request.page_size, "Fetching page");
                let page = self.fetcher.fetch(&request)?;
                self.fetches += 1;
                Ok(entry.insert(page).as_slice())
            }
        }
    }

    /// Get the item at absolute position `index`
    pub fn get(&mut self, index: usize) -> Result<&T> {
        let (page_id, offset) = self.options.locate(index, SIMPLE_PAGE_START);
        self.page(page_id)?
            .get(offset)
            .ok_or(Error::IndexOutOfRange { index })
    }

    /// Iterate over every item from the first page
    pub fn iter(&mut self) -> Iter<'_, F, T> {
        let ids = self.options.page_ids(SIMPLE_PAGE_START);
        Iter {
            results: self,
            ids,
            current: None,
            offset: 0,
            done: false,
        }
    }

    /// Collect the items of `range`, keeping every `step`th one
    ///
    /// The range end is exclusive; an unbounded end runs to the end of the
    /// data. Pages are walked in order, so a fetch error anywhere before the
    /// end of the range is returned.
    pub fn slice<R>(&mut self, range: R, step: usize) -> Result<Vec<T>>
    where
        R: RangeBounds<usize>,
        T: Clone,
    {
        if step == 0 {
            return Err(Error::InvalidSlice {
                message: "slice step cannot be zero".to_string(),
            });
        }

        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let stop = match range.end_bound() {
            Bound::Included(&end) => end.checked_add(1),
            Bound::Excluded(&end) => Some(end),
            Bound::Unbounded => None,
        }
        .unwrap_or(usize::MAX);

        if start >= stop {
            return Ok(Vec::new());
        }

        let mut selected = Vec::new();
        for (index, item) in self.iter().enumerate().take(stop) {
            let item = item?;
            if index >= start && (index - start) % step == 0 {
                selected.push(item);
            }
        }

        Ok(selected)
    }
}

impl<'a, F, T> IntoIterator for &'a mut PaginatedResults<F, T>
where
    F: PageFetcher<Vec<T>>,
    T: Clone,
{
    type Item = Result<T>;
    type IntoIter = Iter<'a, F, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`PaginatedResults`], serving cached pages first
pub struct Iter<'a, F, T> {
    results: &'a mut PaginatedResults<F, T>,
    ids: PageIds,
    /// Id and length of the page being read
    current: Option<(u64, usize)>,
    offset: usize,
    done: bool,
}

impl<F, T> Iterator for Iter<'_, F, T>
where
    F: PageFetcher<Vec<T>>,
    T: Clone,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let page_size = self.results.options.page_size;

        loop {
            if self.done {
                return None;
            }

            let (page_id, len) = match self.current {
                Some(current) => current,
                None => {
                    let page_id = self.ids.advance();
                    let len = match self.results.page(page_id) {
                        Ok(page) => page.len(),
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    };
                    self.current = Some((page_id, len));
                    self.offset = 0;
                    (page_id, len)
                }
            };

            if self.offset < len {
                let item = self
                    .results
                    .cache
                    .get(&page_id)
                    .and_then(|page| page.get(self.offset))
                    .cloned();
                self.offset += 1;
                if let Some(item) = item {
                    return Some(Ok(item));
                }
                continue;
            }

            if len < page_size || page_size == 0 {
                self.done = true;
            } else {
                self.current = None;
            }
        }
    }
}

impl<F, T> FusedIterator for Iter<'_, F, T>
where
    F: PageFetcher<Vec<T>>,
    T: Clone,
{
}
