//! Lazy page streams over paged platform listings.
//!
//! A stream built by [`pages`] requests page `n + 1` only when polled again after yielding page
//! `n`, so a consumer stops pagination simply by not polling (or dropping) the stream.

use std::future::Future;

use anyhow::Result;
use futures_util::{Stream, stream};

/// One page of a paged listing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Whether the platform advertised a following page.
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self { Self { items, has_next: false } }
}

/// Stream pages from `fetch`, starting at page 1.
///
/// The stream ends after the first page that is empty or has no successor. A fetch error is yielded
/// once and ends the stream.
pub fn pages<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = Result<Page<T>>> + 'a
where
    T: 'a,
    F: FnMut(u32) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>>> + 'a,
{
    stream::try_unfold((fetch, Some(1u32)), |(mut fetch, next)| async move {
        let Some(number) = next else {
            return Ok(None);
        };
        let page = fetch(number).await?;
        let next = (page.has_next && !page.items.is_empty()).then(|| number + 1);
        Ok::<_, anyhow::Error>(Some((page, (fetch, next))))
    })
}
