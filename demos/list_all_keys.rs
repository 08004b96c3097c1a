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

//! Lists every key of a simulated bucket whose listing API returns at most
//! `--page-size` keys per call, together with an `IsTruncated` flag and a
//! `NextMarker`.
//!
//! ```text
//! RUST_LOG=debug cargo run --example list_all_keys -- --keys 25 --page-size 10
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use remote_ops::drain::drain;
use remote_ops::error::FetchError;
use remote_ops::settings::DrainSettings;
use remote_ops::types::{ContinuationToken, Page};

/// Drain a paginated listing of a simulated bucket.
#[derive(Parser)]
struct Cli {
    /// Number of keys in the bucket.
    #[arg(long, default_value_t = 42)]
    keys: usize,
    /// Keys returned per listing call.
    #[arg(long, default_value_t = 10)]
    page_size: usize,
    /// Stop after this many pages.
    #[arg(long)]
    max_pages: Option<i64>,
    /// JSON file with drain settings, e.g. `{"maxPages": 3}`.
    #[arg(long)]
    settings: Option<PathBuf>,
}

/// One `ListObjects`-style response.
struct ListResponse {
    keys: Vec<String>,
    is_truncated: bool,
    next_marker: Option<String>,
}

/// Sorted key space of the simulated bucket.
struct Bucket {
    keys: Vec<String>,
}

impl Bucket {
    fn new(count: usize) -> Self {
        Self {
            keys: (0..count).map(|i| format!("logs/2025/{i:05}.json")).collect(),
        }
    }

    /// Returns up to `max_keys` keys strictly after `marker`.
    async fn list(&self, marker: Option<&str>, max_keys: usize) -> ListResponse {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let start = match marker {
            Some(m) => self.keys.partition_point(|k| k.as_str() <= m),
            None => 0,
        };
        let end = (start + max_keys).min(self.keys.len());
        let keys = self.keys[start..end].to_vec();
        let is_truncated = end < self.keys.len();
        ListResponse {
            next_marker: keys.last().filter(|_| is_truncated).cloned(),
            keys,
            is_truncated,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();
    let args = Cli::parse();

    let mut settings = match &args.settings {
        Some(path) => DrainSettings::from_json_str(&std::fs::read_to_string(path)?)?,
        None => DrainSettings::default(),
    };
    if args.max_pages.is_some() {
        settings.max_pages = args.max_pages;
    }

    let bucket = Arc::new(Bucket::new(args.keys));
    let page_size = args.page_size.max(1);
    let fetcher = move |token: Option<ContinuationToken>| {
        let bucket = Arc::clone(&bucket);
        async move {
            let resp = bucket
                .list(token.as_ref().map(ContinuationToken::as_str), page_size)
                .await;
            Ok::<_, FetchError>(Page::from_truncation(
                resp.keys,
                resp.is_truncated,
                resp.next_marker,
            )?)
        }
    };

    let mut drainer = drain(settings.into_config(fetcher)?)?;
    let mut count = 0;
    while let Some(key) = drainer.next_item().await {
        println!("{}", key?);
        count += 1;
    }

    info!(
        "listed {count} keys in {} pages",
        drainer.pages_fetched()
    );
    if drainer.is_truncated() {
        info!(
            "listing truncated; resume from marker {:?}",
            drainer.resume_token().map(ContinuationToken::as_str)
        );
    }
    Ok(())
}
