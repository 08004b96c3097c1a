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

use rand::prelude::SmallRng;
use rand::{Rng, SeedableRng};

/// Splits `0..total` into consecutive chunks of at most `max_page` items.
/// Roughly one chunk in five is empty.
pub fn random_split(total: u32, max_page: u32, seed: u64) -> Vec<Vec<u32>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut chunks = Vec::new();
    let mut next = 0;
    while next < total {
        let size = if rng.random_bool(0.2) {
            0
        } else {
            rng.random_range(1..=max_page.max(1))
        };
        let end = (next + size).min(total);
        chunks.push((next..end).collect());
        next = end;
    }
    if chunks.is_empty() {
        chunks.push(Vec::new());
    }
    chunks
}

/// Splits `0..total` into chunks of exactly `page_size` items.
pub fn even_split(total: u32, page_size: u32) -> Vec<Vec<u32>> {
    let page_size = page_size.max(1);
    let mut chunks: Vec<Vec<u32>> = (0..total)
        .collect::<Vec<_>>()
        .chunks(page_size as usize)
        .map(<[u32]>::to_vec)
        .collect();
    if chunks.is_empty() {
        chunks.push(Vec::new());
    }
    chunks
}
