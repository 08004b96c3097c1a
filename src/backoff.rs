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

//! Exponential backoff with a hard cap, and a retry helper built on it.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, FetchError, ValidationErr};

/// Default cap on the delay, as a multiple of the base interval.
pub const DEFAULT_MAX_BACKOFF_FACTOR: f64 = 5.0;

/// Default number of retries after a failed remote call.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay schedule `base * multiplier^attempt`, never above
/// `base * max_factor`.
///
/// A multiplier of `1.0` gives a fixed interval.
#[derive(Clone, Debug, PartialEq)]
pub struct ExponentialBackoff {
    base: Duration,
    multiplier: f64,
    max_factor: f64,
    jitter: bool,
}

impl ExponentialBackoff {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            multiplier: 1.0,
            max_factor: DEFAULT_MAX_BACKOFF_FACTOR,
            jitter: false,
        }
    }

    /// Sets the growth factor applied per attempt.
    pub fn with_multiplier(mut self, multiplier: f64) -> Result<Self, ValidationErr> {
        if !is_growth_factor(multiplier) {
            return Err(ValidationErr::InvalidBackoffMultiplier(multiplier));
        }
        self.multiplier = multiplier;
        Ok(self)
    }

    /// Sets the cap, as a multiple of the base interval.
    pub fn with_max_factor(mut self, max_factor: f64) -> Result<Self, ValidationErr> {
        if !is_growth_factor(max_factor) {
            return Err(ValidationErr::InvalidBackoffCap(max_factor));
        }
        self.max_factor = max_factor;
        Ok(self)
    }

    /// Randomizes each delay within `[delay / 2, delay]`.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// The largest delay this schedule will ever produce.
    pub fn max_delay(&self) -> Duration {
        scale(self.base, self.max_factor)
    }

    /// Delay before retry number `attempt` (0-based), without jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent).min(self.max_factor);
        scale(self.base, factor)
    }

    /// Delay before retry number `attempt`, with jitter applied if enabled.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.jittered(self.delay(attempt))
    }

    /// Successive delays starting from attempt 0.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..=u32::MAX).map(move |attempt| self.delay(attempt))
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let half = delay / 2;
        let spread = u64::try_from((delay - half).as_nanos()).unwrap_or(u64::MAX);
        half + Duration::from_nanos(rand::rng().random_range(0..=spread))
    }
}

/// Checks a multiplier and a cap without building a schedule.
///
/// An unset multiplier means a fixed interval and is always valid.
pub fn validate(multiplier: Option<f64>, max_factor: f64) -> Result<(), ValidationErr> {
    if let Some(m) = multiplier {
        if !is_growth_factor(m) {
            return Err(ValidationErr::InvalidBackoffMultiplier(m));
        }
    }
    if !is_growth_factor(max_factor) {
        return Err(ValidationErr::InvalidBackoffCap(max_factor));
    }
    Ok(())
}

fn is_growth_factor(f: f64) -> bool {
    f.is_finite() && f >= 1.0
}

// Float-to-int `as` saturates, so oversized products clamp to u64::MAX nanos.
fn scale(base: Duration, factor: f64) -> Duration {
    let nanos = (base.as_nanos() as f64 * factor).round();
    Duration::from_nanos(nanos as u64)
}

/// Sleeps for `delay`. Returns `false` if `cancel` fired first.
pub(crate) async fn sleep_unless_cancelled(
    delay: Duration,
    cancel: Option<&CancellationToken>,
) -> bool {
    match cancel {
        Some(token) => token
            .run_until_cancelled(tokio::time::sleep(delay))
            .await
            .is_some(),
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}

/// Runs `op` until it succeeds, sleeping `backoff.next_delay(n)` between
/// attempts and giving up after `max_retries` retries.
///
/// This is the building block for retrying individual remote calls, such
/// as a single page fetch of a drain. Exhausted retries fail with
/// [`Error::Transport`] carrying the last failure; a fired `cancel` fails
/// with [`Error::Cancelled`].
pub async fn retry<T, F, Fut>(
    backoff: &ExponentialBackoff,
    max_retries: u32,
    cancel: Option<&CancellationToken>,
    mut op: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt: u32 = 0;
    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled { last: None });
        }
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt >= max_retries => {
                return Err(Error::Transport {
                    attempts: attempt + 1,
                    source: e,
                });
            }
            Err(e) => {
                let delay = backoff.next_delay(attempt);
                log::warn!("attempt {} failed: {e}; retrying in {delay:?}", attempt + 1);
                attempt += 1;
                if !sleep_unless_cancelled(delay, cancel).await {
                    return Err(Error::Cancelled { last: None });
                }
            }
        }
    }
}
