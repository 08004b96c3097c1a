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

//! Waiting for a long-running remote job to reach a terminal state.
//!
//! [`poll_until_terminal`] covers the usual case. [`Poller`] exposes the
//! individual steps for callers that drive the loop themselves.
//!
//! ```no_run
//! use std::time::Duration;
//! use remote_ops::error::FetchError;
//! use remote_ops::poll::{PollConfig, poll_until_terminal};
//! use remote_ops::types::PollResult;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let fetcher = || async {
//!         // ask the service for the job status here
//!         Ok::<_, FetchError>(PollResult::from_provider_status("SUCCEEDED")?)
//!     };
//!     let result = poll_until_terminal(
//!         PollConfig::builder()
//!             .fetcher(fetcher)
//!             .interval(Duration::from_secs(2))
//!             .timeout(Duration::from_secs(600))
//!             .backoff_multiplier(1.5)
//!             .build(),
//!     )
//!     .await?;
//!     println!("job finished: {result}");
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use typed_builder::TypedBuilder;

use crate::backoff::{
    DEFAULT_MAX_BACKOFF_FACTOR, DEFAULT_MAX_RETRIES, ExponentialBackoff, sleep_unless_cancelled,
};
use crate::error::{Error, ValidationErr};
use crate::types::{PollResult, StatusFetcher};

/// Callback invoked with every non-terminal status observed.
pub type ProgressFn = Box<dyn FnMut(&PollResult) + Send>;

/// Configuration of a single poll loop.
#[derive(TypedBuilder)]
pub struct PollConfig<F> {
    /// Fetches the current job status.
    pub(crate) fetcher: F,
    /// Delay between the first and second status check; later delays grow
    /// from here when a multiplier is set.
    pub(crate) interval: Duration,
    /// Total time budget, measured from the first status check.
    pub(crate) timeout: Duration,
    /// Growth factor of the delay per attempt. Fixed interval when unset.
    #[builder(default, setter(strip_option))]
    pub(crate) backoff_multiplier: Option<f64>,
    /// Cap on the delay, as a multiple of `interval`.
    #[builder(default = DEFAULT_MAX_BACKOFF_FACTOR)]
    pub(crate) max_backoff_factor: f64,
    /// Consecutive failed status checks tolerated before giving up.
    #[builder(default = DEFAULT_MAX_RETRIES)]
    pub(crate) max_transport_retries: u32,
    #[builder(default)]
    pub(crate) jitter: bool,
    #[builder(default, setter(strip_option))]
    pub(crate) cancel: Option<CancellationToken>,
    #[builder(default, setter(strip_option))]
    pub(crate) on_progress: Option<ProgressFn>,
}

impl<F> PollConfig<F> {
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}

/// Polls the job status until it is terminal and returns that status.
///
/// A job that ends `Failed` or `Cancelled` is a successful return; the
/// caller inspects the state. Errors are reserved for invalid configuration,
/// timeouts, repeated fetch failures and cancellation.
pub async fn poll_until_terminal<F: StatusFetcher>(
    config: PollConfig<F>,
) -> Result<PollResult, Error> {
    Poller::new(config)?.run().await
}

/// Step-wise poll loop.
pub struct Poller<F> {
    fetcher: F,
    backoff: ExponentialBackoff,
    timeout: Duration,
    max_transport_retries: u32,
    cancel: Option<CancellationToken>,
    on_progress: Option<ProgressFn>,
    started: Option<Instant>,
    attempts: u32,
    delays: u32,
    consecutive_failures: u32,
    last: Option<PollResult>,
}

impl<F: StatusFetcher> Poller<F> {
    /// Validates `config`. No status is fetched here.
    pub fn new(config: PollConfig<F>) -> Result<Self, Error> {
        if config.interval.is_zero() {
            return Err(ValidationErr::InvalidInterval { millis: 0 }.into());
        }
        if config.timeout.is_zero() {
            return Err(ValidationErr::InvalidTimeout { millis: 0 }.into());
        }
        let backoff = ExponentialBackoff::new(config.interval)
            .with_multiplier(config.backoff_multiplier.unwrap_or(1.0))?
            .with_max_factor(config.max_backoff_factor)?
            .with_jitter(config.jitter);

        Ok(Self {
            fetcher: config.fetcher,
            backoff,
            timeout: config.timeout,
            max_transport_retries: config.max_transport_retries,
            cancel: config.cancel,
            on_progress: config.on_progress,
            started: None,
            attempts: 0,
            delays: 0,
            consecutive_failures: 0,
            last: None,
        })
    }

    /// Fetches the status once.
    ///
    /// A failed fetch is returned as [`Error::Transport`] whose `attempts`
    /// counts the consecutive failures so far.
    pub async fn poll_once(&mut self) -> Result<PollResult, Error> {
        if self.is_cancelled() {
            return Err(Error::Cancelled {
                last: self.last.clone(),
            });
        }
        self.started.get_or_insert_with(Instant::now);
        self.attempts += 1;

        match self.fetcher.fetch_status().await {
            Ok(result) => {
                self.consecutive_failures = 0;
                log::debug!("status check {}: {result}", self.attempts);
                if !result.is_terminal() {
                    if let Some(on_progress) = self.on_progress.as_mut() {
                        on_progress(&result);
                    }
                }
                self.last = Some(result.clone());
                Ok(result)
            }
            Err(source) => {
                self.consecutive_failures += 1;
                Err(Error::Transport {
                    attempts: self.consecutive_failures,
                    source,
                })
            }
        }
    }

    /// Runs the loop until a terminal status, the timeout, cancellation or
    /// too many consecutive fetch failures.
    ///
    /// Every sleep, including the ones between failed fetches, ends by the
    /// deadline. A fetch that fails at the deadline ends the loop with
    /// [`Error::Timeout`] if a status was observed before, or with the
    /// transport error otherwise.
    pub async fn run(mut self) -> Result<PollResult, Error> {
        let start = *self.started.get_or_insert_with(Instant::now);
        loop {
            let delay = match self.poll_once().await {
                Ok(result) if result.is_terminal() => return Ok(result),
                Ok(result) => {
                    let elapsed = start.elapsed();
                    if elapsed >= self.timeout {
                        return Err(Error::Timeout {
                            last: result,
                            elapsed,
                        });
                    }
                    self.backoff
                        .next_delay(self.delays)
                        .min(self.timeout - elapsed)
                }
                Err(Error::Transport { attempts, source })
                    if attempts <= self.max_transport_retries =>
                {
                    let remaining = self.timeout.saturating_sub(start.elapsed());
                    if remaining.is_zero() {
                        return Err(match self.last.take() {
                            Some(last) => Error::Timeout {
                                last,
                                elapsed: start.elapsed(),
                            },
                            None => Error::Transport { attempts, source },
                        });
                    }
                    let delay = self.backoff.next_delay(self.delays).min(remaining);
                    log::warn!(
                        "status check failed ({attempts}/{}): {source}; retrying in {delay:?}",
                        self.max_transport_retries
                    );
                    delay
                }
                Err(e) => return Err(e),
            };

            self.delays += 1;
            if !sleep_unless_cancelled(delay, self.cancel.as_ref()).await {
                return Err(Error::Cancelled { last: self.last });
            }
        }
    }

    /// Number of status fetches made so far, failed ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The most recent successfully fetched status.
    pub fn last(&self) -> Option<&PollResult> {
        self.last.as_ref()
    }

    /// Time since the first status check, zero before it.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::types::JobState;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Script = Vec<Result<PollResult, &'static str>>;

    fn scripted(script: Script) -> impl StatusFetcher {
        let mut script = VecDeque::from(script);
        move || {
            let next = script
                .pop_front()
                .unwrap_or(Ok(PollResult::running()))
                .map_err(FetchError::from);
            async move { next }
        }
    }

    fn config<F>(fetcher: F) -> PollConfig<F> {
        PollConfig::builder()
            .fetcher(fetcher)
            .interval(Duration::from_millis(100))
            .timeout(Duration::from_secs(10))
            .build()
    }

    #[test]
    fn test_invalid_configuration() {
        let err = Poller::new(
            PollConfig::builder()
                .fetcher(scripted(vec![]))
                .interval(Duration::ZERO)
                .timeout(Duration::from_secs(1))
                .build(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            Error::Validation(ValidationErr::InvalidInterval { .. })
        ));

        let err = Poller::new(
            PollConfig::builder()
                .fetcher(scripted(vec![]))
                .interval(Duration::from_secs(1))
                .timeout(Duration::ZERO)
                .build(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            Error::Validation(ValidationErr::InvalidTimeout { .. })
        ));

        let err = Poller::new(
            PollConfig::builder()
                .fetcher(scripted(vec![]))
                .interval(Duration::from_secs(1))
                .timeout(Duration::from_secs(1))
                .backoff_multiplier(0.5)
                .build(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            Error::Validation(ValidationErr::InvalidBackoffMultiplier(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_once_counts_attempts() {
        let mut poller = Poller::new(config(scripted(vec![
            Ok(PollResult::pending()),
            Err("throttled"),
        ])))
        .unwrap();

        assert_eq!(poller.elapsed(), Duration::ZERO);
        assert_eq!(poller.poll_once().await.unwrap(), PollResult::pending());
        let err = poller.poll_once().await.unwrap_err();
        assert!(matches!(err, Error::Transport { attempts: 1, .. }));
        assert_eq!(poller.attempts(), 2);
        assert_eq!(poller.last(), Some(&PollResult::pending()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_is_a_result() {
        let result = poll_until_terminal(config(scripted(vec![
            Ok(PollResult::running()),
            Ok(PollResult::failed("disk full")),
        ])))
        .await
        .unwrap();
        assert_eq!(result.state, JobState::Failed);
        assert_eq!(result.detail.as_deref(), Some("disk full"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_sees_non_terminal_states() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let cfg = config(scripted(vec![
            Ok(PollResult::pending()),
            Ok(PollResult::running()),
            Ok(PollResult::succeeded()),
        ]))
        .with_progress(Box::new(move |r: &PollResult| {
            recorder.lock().unwrap().push(r.state)
        }));

        let result = poll_until_terminal(cfg).await.unwrap();
        assert_eq!(result.state, JobState::Succeeded);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![JobState::Pending, JobState::Running]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_count_resets_after_success() {
        // Three failures in a row are tolerated; a success in between resets
        // the count, so five failures in total do not exhaust the retries.
        let result = poll_until_terminal(config(scripted(vec![
            Err("e1"),
            Err("e2"),
            Err("e3"),
            Ok(PollResult::running()),
            Err("e4"),
            Err("e5"),
            Ok(PollResult::succeeded()),
        ])))
        .await
        .unwrap();
        assert!(result.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_not_a_timeout() {
        let err = poll_until_terminal(config(scripted(vec![
            Err("e1"),
            Err("e2"),
            Err("e3"),
            Err("e4"),
        ])))
        .await
        .unwrap_err();
        match err {
            Error::Transport { attempts, source } => {
                assert_eq!(attempts, 4);
                assert_eq!(source.to_string(), "e4");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_is_clamped_to_deadline() {
        let start = Instant::now();
        let err = poll_until_terminal(
            PollConfig::builder()
                .fetcher(scripted(vec![]))
                .interval(Duration::from_secs(10))
                .timeout(Duration::from_secs(3))
                .build(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(3100), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            trigger.cancel();
        });

        let err = poll_until_terminal(config(scripted(vec![])).with_cancel(cancel))
            .await
            .unwrap_err();
        match err {
            Error::Cancelled { last } => assert_eq!(last, Some(PollResult::running())),
            other => panic!("expected cancellation, got {other:?}"),
        }
    }
}
