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

//! Waits for a simulated batch job to finish. Press Ctrl-C to stop waiting.
//!
//! ```text
//! RUST_LOG=debug cargo run --example wait_for_job -- --run-for-ms 4000 --backoff 1.5
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};
use rand::Rng;
use remote_ops::error::{Error, FetchError};
use remote_ops::poll::poll_until_terminal;
use remote_ops::settings::PollSettings;
use remote_ops::types::{JobState, PollResult};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Poll a simulated job until it finishes.
#[derive(Parser)]
struct Cli {
    /// How long the job stays queued.
    #[arg(long, default_value_t = 1000)]
    queued_for_ms: u64,
    /// How long the job runs once started.
    #[arg(long, default_value_t = 3000)]
    run_for_ms: u64,
    /// Let the job end in FAILED.
    #[arg(long)]
    fail: bool,
    /// Fraction of status calls that fail with a transport error.
    #[arg(long, default_value_t = 0.1)]
    flaky: f64,
    #[arg(long, default_value_t = 250, allow_negative_numbers = true)]
    interval_ms: i64,
    #[arg(long, default_value_t = 30_000, allow_negative_numbers = true)]
    timeout_ms: i64,
    /// Backoff multiplier; fixed interval when omitted.
    #[arg(long)]
    backoff: Option<f64>,
    /// Randomize each delay between half and all of its nominal value.
    #[arg(long)]
    jitter: bool,
}

/// Job whose provider status depends only on the time since submission.
struct SimulatedJob {
    submitted: Instant,
    queued_for: Duration,
    run_for: Duration,
    fail: bool,
    flaky: f64,
}

impl SimulatedJob {
    fn describe(&self) -> Result<&'static str, FetchError> {
        if rand::rng().random_bool(self.flaky.clamp(0.0, 1.0)) {
            return Err("503 Service Unavailable".into());
        }
        let age = self.submitted.elapsed();
        Ok(if age < self.queued_for {
            "RUNNABLE"
        } else if age < self.queued_for + self.run_for {
            "IN_PROGRESS"
        } else if self.fail {
            "FAILED"
        } else {
            "SUCCEEDED"
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();
    let args = Cli::parse();

    let job = Arc::new(SimulatedJob {
        submitted: Instant::now(),
        queued_for: Duration::from_millis(args.queued_for_ms),
        run_for: Duration::from_millis(args.run_for_ms),
        fail: args.fail,
        flaky: args.flaky,
    });
    let fetcher = move || {
        let job = Arc::clone(&job);
        async move {
            let status = job.describe()?;
            Ok::<_, FetchError>(PollResult::from_provider_status(status)?)
        }
    };

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let settings = PollSettings {
        interval_ms: args.interval_ms,
        timeout_ms: args.timeout_ms,
        backoff_multiplier: args.backoff,
        max_backoff_factor: None,
        max_transport_retries: None,
        jitter: Some(args.jitter),
    };
    let config = settings
        .into_config(fetcher)?
        .with_cancel(cancel)
        .with_progress(Box::new(|r: &PollResult| info!("job is {r}")));

    match poll_until_terminal(config).await {
        Ok(result) if result.state == JobState::Succeeded => info!("job finished: {result}"),
        Ok(result) => warn!("job ended unsuccessfully: {result}"),
        Err(e @ Error::Timeout { .. }) | Err(e @ Error::Cancelled { .. }) => {
            warn!("stopped waiting: {e}");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
