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

//! Error definitions for drain and poll operations.
//!
//! Errors fall into three families:
//!
//! * [`ValidationErr`] - the supplied configuration (or a value handed to a
//!   constructor) is invalid. These are raised synchronously, before any
//!   fetcher is invoked.
//! * [`Error::Fetch`] / [`Error::Transport`] - the caller-supplied fetcher
//!   failed.
//! * [`Error::Timeout`] / [`Error::Cancelled`] - the operation stopped before
//!   reaching a terminal state.
//!
//! A job that finished in a failed or cancelled state is *not* an error; it
//! is reported as a [`PollResult`](crate::types::PollResult).

use std::time::Duration;

use thiserror::Error;

use crate::types::PollResult;

/// Error type returned by caller-supplied fetchers.
pub type FetchError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Configuration and input validation errors.
#[derive(Error, Debug)]
pub enum ValidationErr {
    #[error("max pages must be at least 1, got {0}")]
    InvalidMaxPages(i64),

    #[error("poll interval must be positive, got {millis}ms")]
    InvalidInterval { millis: i64 },

    #[error("poll timeout must be positive, got {millis}ms")]
    InvalidTimeout { millis: i64 },

    #[error("backoff multiplier must be a finite number >= 1.0, got {0}")]
    InvalidBackoffMultiplier(f64),

    #[error("backoff cap must be a finite factor >= 1.0, got {0}")]
    InvalidBackoffCap(f64),

    #[error("listing is truncated but no continuation token was returned")]
    MissingContinuationToken,

    #[error("unknown job state '{0}'")]
    UnknownJobState(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
}

/// Errors raised by [`drain`](crate::drain::drain) and
/// [`poll_until_terminal`](crate::poll::poll_until_terminal).
#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErr),

    /// The page fetcher failed while fetching page `page` (1-based).
    #[error("failed to fetch page {page}: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: FetchError,
    },

    /// The status fetcher kept failing after all retries were used.
    #[error("status fetch failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("operation still in state {} after {:.1} seconds", .last.state, .elapsed.as_secs_f64())]
    Timeout { last: PollResult, elapsed: Duration },

    #[error("operation cancelled{}", .last.as_ref().map(|r| format!(" while in state {}", r.state)).unwrap_or_default())]
    Cancelled { last: Option<PollResult> },
}

impl Error {
    /// Returns `true` if this error was raised before any remote call was
    /// made because the configuration was rejected.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Returns the last status observed before the error, if there is one.
    pub fn last_result(&self) -> Option<&PollResult> {
        match self {
            Error::Timeout { last, .. } => Some(last),
            Error::Cancelled { last } => last.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobState;

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout {
            last: PollResult::new(JobState::Running),
            elapsed: Duration::from_millis(2500),
        };
        assert_eq!(
            err.to_string(),
            "operation still in state Running after 2.5 seconds"
        );
        assert_eq!(err.last_result().map(|r| r.state), Some(JobState::Running));
    }

    #[test]
    fn test_cancelled_display() {
        let err = Error::Cancelled { last: None };
        assert_eq!(err.to_string(), "operation cancelled");

        let err = Error::Cancelled {
            last: Some(PollResult::new(JobState::Pending)),
        };
        assert_eq!(err.to_string(), "operation cancelled while in state Pending");
    }

    #[test]
    fn test_validation_wrapping() {
        let err: Error = ValidationErr::InvalidMaxPages(0).into();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "validation error: max pages must be at least 1, got 0"
        );
    }

    #[test]
    fn test_fetch_error_keeps_source() {
        let err = Error::Fetch {
            page: 3,
            source: "connection reset".into(),
        };
        assert_eq!(err.to_string(), "failed to fetch page 3: connection reset");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("connection reset"));
    }
}
