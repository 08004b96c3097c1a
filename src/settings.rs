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

//! Drain and poll settings as they appear in configuration files.
//!
//! Values are kept as loaded, signed and in milliseconds, and are checked
//! when converted into a typed config with `into_config`.
//!
//! ```
//! use remote_ops::settings::PollSettings;
//!
//! let settings = PollSettings::from_json_str(
//!     r#"{"intervalMs": 2000, "timeoutMs": 600000, "backoffMultiplier": 1.5}"#,
//! )
//! .unwrap();
//! assert_eq!(settings.interval_ms, 2000);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::{self, DEFAULT_MAX_BACKOFF_FACTOR, DEFAULT_MAX_RETRIES};
use crate::drain::DrainConfig;
use crate::error::{Error, ValidationErr};
use crate::poll::PollConfig;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainSettings {
    #[serde(default, alias = "max_pages", skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<i64>,
}

impl DrainSettings {
    pub fn from_json_str(s: &str) -> Result<Self, ValidationErr> {
        Ok(serde_json::from_str(s)?)
    }

    /// Checks the settings and pairs them with `fetcher`.
    pub fn into_config<F>(self, fetcher: F) -> Result<DrainConfig<F>, Error> {
        let max_pages = match self.max_pages {
            Some(n) if n < 1 => return Err(ValidationErr::InvalidMaxPages(n).into()),
            Some(n) => Some(u32::try_from(n).unwrap_or(u32::MAX)),
            None => None,
        };
        Ok(DrainConfig {
            fetcher,
            max_pages,
            start_token: None,
            cancel: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSettings {
    #[serde(alias = "interval_ms")]
    pub interval_ms: i64,
    #[serde(alias = "timeout_ms")]
    pub timeout_ms: i64,
    #[serde(default, alias = "backoff_multiplier", skip_serializing_if = "Option::is_none")]
    pub backoff_multiplier: Option<f64>,
    #[serde(default, alias = "max_backoff_factor", skip_serializing_if = "Option::is_none")]
    pub max_backoff_factor: Option<f64>,
    #[serde(default, alias = "max_transport_retries", skip_serializing_if = "Option::is_none")]
    pub max_transport_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<bool>,
}

impl PollSettings {
    pub fn from_json_str(s: &str) -> Result<Self, ValidationErr> {
        Ok(serde_json::from_str(s)?)
    }

    /// Checks the settings and pairs them with `fetcher`.
    ///
    /// Applies the same checks as [`Poller::new`](crate::poll::Poller::new),
    /// so a config obtained this way is known to be valid.
    pub fn into_config<F>(self, fetcher: F) -> Result<PollConfig<F>, Error> {
        if self.interval_ms <= 0 {
            return Err(ValidationErr::InvalidInterval {
                millis: self.interval_ms,
            }
            .into());
        }
        if self.timeout_ms <= 0 {
            return Err(ValidationErr::InvalidTimeout {
                millis: self.timeout_ms,
            }
            .into());
        }
        let interval = Duration::from_millis(self.interval_ms.unsigned_abs());
        let timeout = Duration::from_millis(self.timeout_ms.unsigned_abs());
        let max_backoff_factor = self.max_backoff_factor.unwrap_or(DEFAULT_MAX_BACKOFF_FACTOR);

        backoff::validate(self.backoff_multiplier, max_backoff_factor)?;

        Ok(PollConfig {
            fetcher,
            interval,
            timeout,
            backoff_multiplier: self.backoff_multiplier,
            max_backoff_factor,
            max_transport_retries: self.max_transport_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            jitter: self.jitter.unwrap_or(false),
            cancel: None,
            on_progress: None,
        })
    }
}
