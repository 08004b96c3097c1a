// remote-ops: pagination and job polling for cloud SDK calls
// Copyright 2025 MinIO, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Draining a paginated remote listing into one ordered sequence.
//!
//! [`drain`] turns a [`PageFetcher`] into a [`Drainer`], which fetches pages
//! lazily and one at a time: the first page with no token, every following
//! page with the token returned by its predecessor. Items come out in the
//! order the backend returned them.
//!
//! ```no_run
//! use remote_ops::drain::{DrainConfig, drain};
//! use remote_ops::error::FetchError;
//! use remote_ops::types::{ContinuationToken, Page};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let fetcher = |token: Option<ContinuationToken>| async move {
//!         // call the listing API of your client here
//!         let page = match token {
//!             None => Page::new(vec!["a", "b"], Some("page-2")),
//!             Some(_) => Page::last(vec!["c"]),
//!         };
//!         Ok::<_, FetchError>(page)
//!     };
//!
//!     let mut drainer = drain(DrainConfig::builder().fetcher(fetcher).max_pages(100).build())?;
//!     while let Some(item) = drainer.next_item().await {
//!         println!("{}", item?);
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use typed_builder::TypedBuilder;

use crate::error::{Error, ValidationErr};
use crate::types::{ContinuationToken, Page, PageFetcher, ToStream};

/// Configuration of a single drain.
///
/// Constructed right before use with [`DrainConfig::builder()`] and consumed
/// by [`drain`].
#[derive(TypedBuilder)]
pub struct DrainConfig<F> {
    /// Fetches the page addressed by a continuation token.
    pub(crate) fetcher: F,
    /// Stop after this many pages even if the backend reports more. Reaching
    /// the cap is not an error; see [`Drainer::is_truncated`].
    #[builder(default, setter(strip_option))]
    pub(crate) max_pages: Option<u32>,
    /// Continue a listing from a token returned by an earlier, truncated
    /// drain instead of starting from the first page.
    #[builder(default, setter(strip_option, into))]
    pub(crate) start_token: Option<ContinuationToken>,
    /// Checked before every page fetch.
    #[builder(default, setter(strip_option))]
    pub(crate) cancel: Option<CancellationToken>,
}

/// Validates `config` and returns a lazy [`Drainer`] over the listing.
///
/// Nothing is fetched until the drainer is polled. Each call starts a new
/// cursor, so draining twice re-fetches the listing from the start.
pub fn drain<T, F>(config: DrainConfig<F>) -> Result<Drainer<T, F>, Error>
where
    T: Send,
    F: PageFetcher<T>,
{
    if config.max_pages == Some(0) {
        return Err(ValidationErr::InvalidMaxPages(0).into());
    }
    Ok(Drainer {
        fetcher: config.fetcher,
        max_pages: config.max_pages,
        cancel: config.cancel,
        next_token: config.start_token,
        buffer: VecDeque::new(),
        pages_fetched: 0,
        is_done: false,
        truncated: false,
    })
}

/// Lazy, ordered sequence of the items of a paginated listing.
///
/// Items can be pulled one by one with [`next_item`](Drainer::next_item),
/// page by page with [`next_page`](Drainer::next_page), as a
/// [`Stream`](Drainer::into_stream), or all at once with
/// [`collect_all`](Drainer::collect_all).
///
/// A fetch failure ends the drain: the error is returned once and every
/// later call returns `None`. Items handed out before the failure stay
/// handed out.
pub struct Drainer<T, F> {
    fetcher: F,
    max_pages: Option<u32>,
    cancel: Option<CancellationToken>,
    next_token: Option<ContinuationToken>,
    buffer: VecDeque<T>,
    pages_fetched: u32,
    is_done: bool,
    truncated: bool,
}

impl<T, F> Drainer<T, F>
where
    T: Send,
    F: PageFetcher<T>,
{
    /// Returns the next item, fetching the next page when the current one
    /// is used up. Pages with no items but a continuation token are skipped
    /// over, not treated as the end of the listing.
    pub async fn next_item(&mut self) -> Option<Result<T, Error>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            match self.fetch_next().await? {
                Ok(page) => self.buffer.extend(page.into_items()),
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// Returns the next page.
    ///
    /// If items of the current page were already taken with
    /// [`next_item`](Drainer::next_item), the rest of that page is returned
    /// first.
    pub async fn next_page(&mut self) -> Option<Result<Page<T>, Error>> {
        if !self.buffer.is_empty() {
            let rest: Vec<T> = self.buffer.drain(..).collect();
            return Some(Ok(Page::new(rest, self.next_token.clone())));
        }
        self.fetch_next().await
    }

    /// Drains the whole listing into memory.
    ///
    /// On failure the items obtained so far are returned together with the
    /// error in a [`PartialDrain`].
    pub async fn collect_all(mut self) -> Result<Drained<T>, PartialDrain<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await {
            match item {
                Ok(v) => items.push(v),
                Err(error) => return Err(PartialDrain { items, error }),
            }
        }
        Ok(Drained {
            items,
            pages: self.pages_fetched,
            truncated: self.truncated,
            resume_token: self.resume_token().cloned(),
        })
    }

    /// Converts the drainer into a stream of items.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, Error>> + Send {
        futures_util::stream::unfold(self, |mut this| async move {
            this.next_item().await.map(|item| (item, this))
        })
    }

    async fn fetch_next(&mut self) -> Option<Result<Page<T>, Error>> {
        if self.is_done {
            return None;
        }
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            log::debug!("drain cancelled after {} pages", self.pages_fetched);
            self.is_done = true;
            return Some(Err(Error::Cancelled { last: None }));
        }

        let page_number = self.pages_fetched + 1;
        match self.fetcher.fetch_page(self.next_token.clone()).await {
            Ok(page) => {
                self.pages_fetched = page_number;
                self.next_token = page.continuation_token().cloned();
                log::debug!(
                    "fetched page {page_number} with {} items, more pages: {}",
                    page.len(),
                    page.has_more()
                );
                if self.next_token.is_none() {
                    self.is_done = true;
                } else if self.max_pages.is_some_and(|max| page_number >= max) {
                    log::debug!("stopping after {page_number} pages, listing is truncated");
                    self.is_done = true;
                    self.truncated = true;
                }
                Some(Ok(page))
            }
            Err(source) => {
                self.is_done = true;
                Some(Err(Error::Fetch {
                    page: page_number,
                    source,
                }))
            }
        }
    }
}

impl<T, F> Drainer<T, F> {
    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Returns `true` once no more pages will be fetched.
    pub fn is_done(&self) -> bool {
        self.is_done
    }

    /// Returns `true` if the drain stopped at the page cap while the last
    /// page still carried a continuation token.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Token addressing the first page not yet fetched, if the backend
    /// reported one. Feed it to [`DrainConfigBuilder::start_token`] to
    /// continue a truncated drain later.
    pub fn resume_token(&self) -> Option<&ContinuationToken> {
        self.next_token.as_ref()
    }
}

#[async_trait]
impl<T, F> ToStream for Drainer<T, F>
where
    T: Send + 'static,
    F: PageFetcher<T> + 'static,
{
    type Item = T;

    async fn to_stream(self) -> Box<dyn Stream<Item = Result<T, Error>> + Unpin + Send> {
        Box::new(Box::pin(self.into_stream()))
    }
}

/// A fully drained listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Drained<T> {
    pub items: Vec<T>,
    /// Number of pages fetched.
    pub pages: u32,
    /// The page cap was reached while more pages existed.
    pub truncated: bool,
    /// Set when `truncated` is; continues the listing.
    pub resume_token: Option<ContinuationToken>,
}

/// Items obtained before a drain failed, and the failure.
#[derive(Debug)]
pub struct PartialDrain<T> {
    pub items: Vec<T>,
    pub error: Error,
}

impl<T> fmt::Display for PartialDrain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partial results obtained ({} items), then error: {}",
            self.items.len(),
            self.error
        )
    }
}

impl<T: fmt::Debug> std::error::Error for PartialDrain<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
