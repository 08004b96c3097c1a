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

//! Traits at the boundary between this crate and service-specific clients.

use std::future::Future;

use async_trait::async_trait;
use futures_util::Stream;

use super::job_state::PollResult;
use super::page::{ContinuationToken, Page};
use crate::error::{Error, FetchError};

/// Fetches one page of a paginated listing.
///
/// This is usually a thin wrapper around a single listing call of a
/// service-specific client: the token is mapped onto the request's
/// `marker` / `nextToken` / `continuationToken` parameter and the response's
/// truncation signal is mapped back into a [`Page`].
///
/// Any `FnMut(Option<ContinuationToken>) -> impl Future` closure returning
/// `Result<Page<T>, FetchError>` implements this trait, so most callers never
/// implement it by hand:
///
/// ```no_run
/// use remote_ops::error::FetchError;
/// use remote_ops::types::{ContinuationToken, Page};
///
/// let fetcher = |token: Option<ContinuationToken>| async move {
///     let items = vec![token.map(|t| t.into_inner()).unwrap_or_default()];
///     Ok::<_, FetchError>(Page::last(items))
/// };
/// # let _ = fetcher;
/// ```
#[async_trait]
pub trait PageFetcher<T: Send>: Send {
    /// Fetches the page addressed by `token`; `None` asks for the first page.
    async fn fetch_page(
        &mut self,
        token: Option<ContinuationToken>,
    ) -> Result<Page<T>, FetchError>;
}

#[async_trait]
impl<T, F, Fut> PageFetcher<T> for F
where
    T: Send + 'static,
    F: FnMut(Option<ContinuationToken>) -> Fut + Send,
    Fut: Future<Output = Result<Page<T>, FetchError>> + Send + 'static,
{
    async fn fetch_page(
        &mut self,
        token: Option<ContinuationToken>,
    ) -> Result<Page<T>, FetchError> {
        (self)(token).await
    }
}

/// Fetches the current status of a long-running job.
///
/// Implementations map the provider's status string with
/// [`PollResult::from_provider_status`] or build the [`PollResult`] directly.
/// Closures `FnMut() -> impl Future<Output = Result<PollResult, FetchError>>`
/// implement this trait.
#[async_trait]
pub trait StatusFetcher: Send {
    async fn fetch_status(&mut self) -> Result<PollResult, FetchError>;
}

#[async_trait]
impl<F, Fut> StatusFetcher for F
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<PollResult, FetchError>> + Send + 'static,
{
    async fn fetch_status(&mut self) -> Result<PollResult, FetchError> {
        (self)().await
    }
}

#[async_trait]
/// Trait for types that can be converted to a stream of items.
pub trait ToStream: Sized {
    type Item;
    async fn to_stream(self) -> Box<dyn Stream<Item = Result<Self::Item, Error>> + Unpin + Send>;
}
