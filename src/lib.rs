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

//! # remote-ops
//!
//! Two reusable loops that cloud SDK callers otherwise write by hand over and
//! over again:
//!
//! * [`drain`] - follow continuation tokens (`marker`, `nextToken`,
//!   `continuationToken`, ...) until a listing is exhausted, yielding every
//!   item in order.
//! * [`poll_until_terminal`] - poll the status of a long-running job until it
//!   succeeds, fails or is cancelled, with a timeout, capped exponential
//!   backoff and transport retries.
//!
//! Neither knows anything about a particular service. The caller plugs in a
//! [`PageFetcher`](types::PageFetcher) or [`StatusFetcher`](types::StatusFetcher),
//! usually a closure around one client call.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use remote_ops::drain::DrainConfig;
//! use remote_ops::error::FetchError;
//! use remote_ops::poll::PollConfig;
//! use remote_ops::types::{ContinuationToken, Page, PollResult};
//! use remote_ops::{drain, poll_until_terminal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let list = |token: Option<ContinuationToken>| async move {
//!         Ok::<_, FetchError>(match token {
//!             None => Page::new(vec![1, 2], Some("next")),
//!             Some(_) => Page::last(vec![3]),
//!         })
//!     };
//!     let all = drain(DrainConfig::builder().fetcher(list).build())?
//!         .collect_all()
//!         .await?;
//!     assert_eq!(all.items, vec![1, 2, 3]);
//!
//!     let status = || async { Ok::<_, FetchError>(PollResult::succeeded()) };
//!     let result = poll_until_terminal(
//!         PollConfig::builder()
//!             .fetcher(status)
//!             .interval(Duration::from_secs(1))
//!             .timeout(Duration::from_secs(60))
//!             .build(),
//!     )
//!     .await?;
//!     assert!(result.is_terminal());
//!     Ok(())
//! }
//! ```
//!
//! ## Design
//! - Configuration structs are built with `typed_builder` builders, or loaded
//!   from JSON through [`settings`]
//! - Invalid configuration is rejected before the first remote call
//! - A job that ends in a failed state is a result, not an error
//! - Cancellation uses `tokio_util`'s [`CancellationToken`](tokio_util::sync::CancellationToken)
//!   and is observed between remote calls, never during one

#![allow(clippy::result_large_err)]

pub mod backoff;
pub mod drain;
pub mod error;
pub mod poll;
pub mod settings;
pub mod types;

pub use drain::drain;
pub use error::Error;
pub use poll::poll_until_terminal;

#[cfg(test)]
#[macro_use]
extern crate quickcheck;
