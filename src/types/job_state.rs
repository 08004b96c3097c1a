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

//! Long-running job states and the outcome of a single status check.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationErr;

/// Job execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    /// Accepted but not started
    Pending,
    /// Currently executing
    Running,
    /// Successfully completed (terminal state)
    Succeeded,
    /// Finished unsuccessfully (terminal state)
    Failed,
    /// Canceled, will not execute further (terminal state)
    Cancelled,
}

impl JobState {
    /// Returns `true` if no further transition can happen from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }

    /// Maps a provider-specific status string onto a [`JobState`].
    ///
    /// Matching ignores case as well as `_`, `-` and spaces, so `IN_PROGRESS`,
    /// `InProgress` and `in-progress` are the same status.
    pub fn from_provider_status(status: &str) -> Result<Self, ValidationErr> {
        let normalized: String = status
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        let state = match normalized.as_str() {
            "pending" | "submitted" | "queued" | "scheduled" | "runnable" | "starting"
            | "waiting" | "delayed" | "creating" | "sleeping" | "suspended" => JobState::Pending,
            "running" | "inprogress" | "active" | "executing" | "processing" | "cancelling"
            | "canceling" | "deleting" | "modifying" | "updating" | "errored" => {
                JobState::Running
            }
            "succeeded" | "success" | "successful" | "completed" | "complete" | "done"
            | "available" | "finished" => JobState::Succeeded,
            "failed" | "failure" | "error" | "timedout" | "aborted" | "rejected" => {
                JobState::Failed
            }
            "cancelled" | "canceled" | "stopped" | "terminated" => JobState::Cancelled,
            _ => return Err(ValidationErr::UnknownJobState(status.to_string())),
        };
        Ok(state)
    }
}

impl FromStr for JobState {
    type Err = ValidationErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobState::from_provider_status(s)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Pending => write!(f, "Pending"),
            JobState::Running => write!(f, "Running"),
            JobState::Succeeded => write!(f, "Succeeded"),
            JobState::Failed => write!(f, "Failed"),
            JobState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// The outcome of one status check of a long-running job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PollResult {
    pub fn new(state: JobState) -> Self {
        Self {
            state,
            detail: None,
        }
    }

    /// Attaches a free-form diagnostic, typically the provider's raw status
    /// reason.
    pub fn with_detail<S: Into<String>>(mut self, detail: S) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Builds a result from a provider status string, keeping the raw status
    /// as the detail.
    pub fn from_provider_status(status: &str) -> Result<Self, ValidationErr> {
        Ok(Self::new(JobState::from_provider_status(status)?).with_detail(status))
    }

    pub fn pending() -> Self {
        Self::new(JobState::Pending)
    }

    pub fn running() -> Self {
        Self::new(JobState::Running)
    }

    pub fn succeeded() -> Self {
        Self::new(JobState::Succeeded)
    }

    pub fn failed<S: Into<String>>(detail: S) -> Self {
        Self::new(JobState::Failed).with_detail(detail)
    }

    pub fn cancelled() -> Self {
        Self::new(JobState::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl std::fmt::Display for PollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.state),
            None => write!(f, "{}", self.state),
        }
    }
}
