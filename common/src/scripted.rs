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

use async_trait::async_trait;
use remote_ops::error::FetchError;
use remote_ops::types::{ContinuationToken, Page, PageFetcher, PollResult, StatusFetcher};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Page fetcher replaying a fixed list of responses.
///
/// Clones share the script and the call log, so a test can hand one clone to
/// the drainer and inspect the other afterwards.
pub struct ScriptedPages<T> {
    script: Arc<Mutex<VecDeque<Result<Page<T>, String>>>>,
    calls: Arc<AtomicUsize>,
    tokens: Arc<Mutex<Vec<Option<ContinuationToken>>>>,
}

impl<T> Clone for ScriptedPages<T> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            calls: Arc::clone(&self.calls),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<T> ScriptedPages<T> {
    pub fn new(pages: impl IntoIterator<Item = Page<T>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(pages.into_iter().map(Ok).collect())),
            calls: Arc::new(AtomicUsize::new(0)),
            tokens: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Links `chunks` into a listing with tokens `page-2`, `page-3`, ...;
    /// the last chunk carries no token.
    pub fn chained(chunks: Vec<Vec<T>>) -> Self {
        let count = chunks.len();
        let pages = chunks.into_iter().enumerate().map(|(i, items)| {
            if i + 1 == count {
                Page::last(items)
            } else {
                Page::new(items, Some(format!("page-{}", i + 2)))
            }
        });
        Self::new(pages)
    }

    /// Appends a failing response after the scripted pages.
    pub fn then_fail(self, message: &str) -> Self {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    /// Number of `fetch_page` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Tokens passed to each call, in call order.
    pub fn tokens_seen(&self) -> Vec<Option<ContinuationToken>> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: Send + 'static> PageFetcher<T> for ScriptedPages<T> {
    async fn fetch_page(&mut self, token: Option<ContinuationToken>) -> Result<Page<T>, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        log::trace!("scripted page call {call} with token {token:?}");
        self.tokens.lock().unwrap().push(token);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(message.into()),
            None => Err(format!("script exhausted after {} calls", call - 1).into()),
        }
    }
}

/// Page fetcher whose listing never ends: every page holds `page_size`
/// consecutive numbers and a token.
#[derive(Clone)]
pub struct EndlessPages {
    page_size: u32,
    calls: Arc<AtomicUsize>,
}

impl EndlessPages {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher<u64> for EndlessPages {
    async fn fetch_page(&mut self, _token: Option<ContinuationToken>) -> Result<Page<u64>, FetchError> {
        let page = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
        let size = u64::from(self.page_size);
        let items = (page * size)..((page + 1) * size);
        Ok(Page::new(items, Some(format!("page-{}", page + 2))))
    }
}

/// Status fetcher replaying a fixed list of responses. Once the script is
/// down to its last entry, that entry is repeated forever.
#[derive(Clone)]
pub struct ScriptedStatuses {
    script: Arc<Mutex<VecDeque<Result<PollResult, String>>>>,
    call_times: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedStatuses {
    pub fn new(script: impl IntoIterator<Item = Result<PollResult, String>>) -> Self {
        let script: VecDeque<_> = script.into_iter().collect();
        assert!(!script.is_empty(), "a status script needs at least one entry");
        Self {
            script: Arc::new(Mutex::new(script)),
            call_times: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reports `result` on every call.
    pub fn always(result: PollResult) -> Self {
        Self::new([Ok(result)])
    }

    /// Fails every call with `message`.
    pub fn always_failing(message: &str) -> Self {
        Self::new([Err(message.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.call_times.lock().unwrap().len()
    }

    /// Time of each call, on the tokio clock.
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusFetcher for ScriptedStatuses {
    async fn fetch_status(&mut self) -> Result<PollResult, FetchError> {
        self.call_times.lock().unwrap().push(Instant::now());
        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };
        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(message.into()),
            None => Err("empty status script".into()),
        }
    }
}
