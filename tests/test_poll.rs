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

use remote_ops::error::{Error, ValidationErr};
use remote_ops::poll::{PollConfig, poll_until_terminal};
use remote_ops::settings::PollSettings;
use remote_ops::types::{JobState, PollResult};
use remote_ops_common::ScriptedStatuses;
use std::time::Duration;
use tokio::time::Instant;

fn config(statuses: &ScriptedStatuses, interval_ms: u64, timeout_ms: u64) -> PollConfig<ScriptedStatuses> {
    PollConfig::builder()
        .fetcher(statuses.clone())
        .interval(Duration::from_millis(interval_ms))
        .timeout(Duration::from_millis(timeout_ms))
        .build()
}

fn gaps(times: &[Instant]) -> Vec<Duration> {
    times.windows(2).map(|w| w[1] - w[0]).collect()
}

#[tokio::test(start_paused = true)]
async fn poll_returns_first_terminal_state() {
    let statuses = ScriptedStatuses::new([
        Ok(PollResult::pending()),
        Ok(PollResult::pending()),
        Ok(PollResult::succeeded()),
    ]);
    let result = poll_until_terminal(config(&statuses, 100, 10_000))
        .await
        .unwrap();

    assert_eq!(result.state, JobState::Succeeded);
    assert_eq!(statuses.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn poll_reports_failed_and_cancelled_jobs_as_results() {
    for terminal in [PollResult::failed("exit code 1"), PollResult::cancelled()] {
        let statuses = ScriptedStatuses::new([Ok(PollResult::running()), Ok(terminal.clone())]);
        let result = poll_until_terminal(config(&statuses, 100, 10_000))
            .await
            .unwrap();
        assert_eq!(result, terminal);
    }
}

#[tokio::test(start_paused = true)]
async fn poll_times_out() {
    let statuses = ScriptedStatuses::always(PollResult::running());
    let start = Instant::now();
    let err = poll_until_terminal(config(&statuses, 100, 500))
        .await
        .unwrap_err();
    let waited = start.elapsed();

    match err {
        Error::Timeout { last, elapsed } => {
            assert_eq!(last.state, JobState::Running);
            assert!(elapsed >= Duration::from_millis(500), "{elapsed:?}");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(waited >= Duration::from_millis(500), "{waited:?}");
    assert!(waited <= Duration::from_millis(700), "{waited:?}");
}

#[tokio::test(start_paused = true)]
async fn poll_backoff_is_capped() {
    let statuses = ScriptedStatuses::always(PollResult::running());
    let err = poll_until_terminal(
        PollConfig::builder()
            .fetcher(statuses.clone())
            .interval(Duration::from_millis(100))
            .timeout(Duration::from_secs(10))
            .backoff_multiplier(2.0)
            .build(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));

    let gaps = gaps(&statuses.call_times());
    assert!(gaps.len() > 5);
    // 100, 200, 400, then capped at 500ms (+1ms timer granularity).
    assert!(gaps[2] >= Duration::from_millis(400));
    for gap in &gaps {
        assert!(*gap <= Duration::from_millis(501), "{gap:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn poll_jitter_never_exceeds_cap() {
    let statuses = ScriptedStatuses::always(PollResult::running());
    let _ = poll_until_terminal(
        PollConfig::builder()
            .fetcher(statuses.clone())
            .interval(Duration::from_millis(100))
            .timeout(Duration::from_secs(5))
            .backoff_multiplier(3.0)
            .max_backoff_factor(4.0)
            .jitter(true)
            .build(),
    )
    .await;

    for gap in gaps(&statuses.call_times()) {
        assert!(gap <= Duration::from_millis(401), "{gap:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn poll_gives_up_after_transport_retries() {
    let statuses = ScriptedStatuses::always_failing("connection refused");
    let err = poll_until_terminal(config(&statuses, 100, 60_000))
        .await
        .unwrap_err();

    match err {
        Error::Transport { attempts, source } => {
            assert_eq!(attempts, 4);
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    // one initial call and three retries
    assert_eq!(statuses.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn poll_recovers_from_transient_failures() {
    let statuses = ScriptedStatuses::new([
        Err("503".to_string()),
        Err("503".to_string()),
        Ok(PollResult::running()),
        Ok(PollResult::succeeded()),
    ]);
    let result = poll_until_terminal(
        PollConfig::builder()
            .fetcher(statuses.clone())
            .interval(Duration::from_millis(100))
            .timeout(Duration::from_secs(10))
            .max_transport_retries(2)
            .build(),
    )
    .await
    .unwrap();

    assert!(result.is_terminal());
    assert_eq!(statuses.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn poll_rejects_invalid_settings_before_fetching() {
    let statuses = ScriptedStatuses::always(PollResult::succeeded());

    let settings = PollSettings::from_json_str(r#"{"intervalMs": -1, "timeoutMs": 1000}"#).unwrap();
    let err = settings.into_config(statuses.clone()).err().unwrap();
    assert!(matches!(
        err,
        Error::Validation(ValidationErr::InvalidInterval { millis: -1 })
    ));

    let err = poll_until_terminal(config(&statuses, 0, 1000))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = poll_until_terminal(config(&statuses, 100, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationErr::InvalidTimeout { .. })
    ));

    assert_eq!(statuses.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn poll_from_settings() {
    let statuses = ScriptedStatuses::new([
        Ok(PollResult::from_provider_status("IN_PROGRESS").unwrap()),
        Ok(PollResult::from_provider_status("COMPLETED").unwrap()),
    ]);
    let settings = PollSettings::from_json_str(
        r#"{"interval_ms": 1000, "timeout_ms": 5000, "backoff_multiplier": 1.5}"#,
    )
    .unwrap();
    let result = poll_until_terminal(settings.into_config(statuses.clone()).unwrap())
        .await
        .unwrap();

    assert_eq!(result.state, JobState::Succeeded);
    assert_eq!(result.detail.as_deref(), Some("COMPLETED"));
}

#[tokio::test(start_paused = true)]
async fn poll_transport_retries_stop_at_deadline() {
    let statuses = ScriptedStatuses::always_failing("connection refused");
    let start = Instant::now();
    let err = poll_until_terminal(config(&statuses, 10_000, 1_000))
        .await
        .unwrap_err();
    let waited = start.elapsed();

    // nothing was ever observed, so the fetch failure is what gets reported
    assert!(matches!(err, Error::Transport { attempts: 2, .. }), "{err:?}");
    assert!(waited >= Duration::from_secs(1), "{waited:?}");
    assert!(waited <= Duration::from_secs(2), "{waited:?}");
    assert_eq!(statuses.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn poll_times_out_while_status_calls_fail() {
    let statuses = ScriptedStatuses::new([
        Ok(PollResult::running()),
        Err("connection refused".to_string()),
    ]);
    let start = Instant::now();
    let err = poll_until_terminal(config(&statuses, 10_000, 1_000))
        .await
        .unwrap_err();

    match err {
        Error::Timeout { last, .. } => assert_eq!(last.state, JobState::Running),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(start.elapsed() <= Duration::from_secs(2));
}
