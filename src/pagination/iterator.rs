//! Forward-only traversal over enveloped pages
//!
//! [`PaginatedApiIterator`] is the synchronous face; [`paginate_stream`]
//! drives the same traversal for async fetch functions.

use super::types::{
    FetchArgs, IntoEnvelope, PageFetcher, PageIds, PageRequest, PaginationOptions,
};
use crate::error::{Error, Result};
use futures::stream::{self, Stream, TryStreamExt};
use std::future::Future;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use tracing::debug;

/// First page number for enveloped traversals when `start` is unset
pub const ENVELOPED_PAGE_START: u64 = 1;

/// Lazy, single-pass iterator over the items of a paginated function
///
/// Each page is fetched once, in increasing page id order. Iteration ends
/// right after the items of the last page have been yielded. A fetch error
/// is yielded once and ends the iteration.
///
/// ```rust,ignore
/// let numbers = |req: &PageRequest| -> Result<Vec<u64>> {
///     let start = req.page_id as usize * req.page_size;
///     Ok((0..25).skip(start).take(req.page_size).collect())
/// };
/// let options = PaginationOptions::new().page_size(10).start(0);
/// let all: Vec<u64> = PaginatedApiIterator::new(numbers, FetchArgs::new(), options)
///     .collect::<Result<_>>()?;
/// ```
pub struct PaginatedApiIterator<F, P, T> {
    fetcher: F,
    args: FetchArgs,
    options: PaginationOptions,
    ids: PageIds,
    buffer: std::vec::IntoIter<T>,
    done: bool,
    _page: PhantomData<fn() -> P>,
}

impl<F, P, T> PaginatedApiIterator<F, P, T>
where
    F: PageFetcher<P>,
    P: IntoEnvelope<T>,
{
    pub fn new(fetcher: F, args: FetchArgs, options: PaginationOptions) -> Self {
        let ids = options.page_ids(ENVELOPED_PAGE_START);
        Self {
            fetcher,
            args,
            options,
            ids,
            buffer: Vec::new().into_iter(),
            done: false,
            _page: PhantomData,
        }
    }

    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    fn next_page(&mut self) -> Result<Vec<T>> {
        let request = PageRequest::new(&self.args, &self.options, self.ids.advance());
        debug!(
            page_id = request.page_id,
            page_size = request.page_size,
            "Fetching page"
        );

        let envelope = self
            .fetcher
            .fetch(&request)?
            .into_envelope(&self.options)?;

        if envelope.is_last_page(self.options.page_size) {
            debug!(
                page_id = request.page_id,
                items = envelope.size(),
                "Reached last page"
            );
            self.done = true;
        }

        Ok(envelope.into_items())
    }
}

impl<F, P, T> Iterator for PaginatedApiIterator<F, P, T>
where
    F: PageFetcher<P>,
    P: IntoEnvelope<T>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            match self.next_page() {
                Ok(items) => self.buffer = items.into_iter(),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<F, P, T> FusedIterator for PaginatedApiIterator<F, P, T>
where
    F: PageFetcher<P>,
    P: IntoEnvelope<T>,
{
}

struct StreamState<F> {
    fetch: F,
    args: FetchArgs,
    options: PaginationOptions,
    ids: PageIds,
    done: bool,
}

/// Async counterpart of [`PaginatedApiIterator`]
///
/// `fetch` is called with one [`PageRequest`] at a time; the next page is
/// only requested once every item of the current one has been consumed.
pub fn paginate_stream<F, Fut, P, T>(
    fetch: F,
    args: FetchArgs,
    options: PaginationOptions,
) -> impl Stream<Item = Result<T>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<P>>,
    P: IntoEnvelope<T>,
{
    let state = StreamState {
        fetch,
        ids: options.page_ids(ENVELOPED_PAGE_START),
        args,
        options,
        done: false,
    };

    stream::try_unfold(state, |mut state| async move {
        if state.done {
            return Ok::<_, Error>(None);
        }

        let request = PageRequest::new(&state.args, &state.options, state.ids.advance());
        debug!(
            page_id = request.page_id,
            page_size = request.page_size,
            "Fetching page"
        );

        let envelope = (state.fetch)(request)
            .await?
            .into_envelope(&state.options)?;
        state.done = envelope.is_last_page(state.options.page_size);

        let items = stream::iter(envelope.into_items().into_iter().map(Ok::<T, Error>));
        Ok(Some((items, state)))
    })
    .try_flatten()
}
