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

//! Pages of a paginated listing and their continuation tokens.

use crate::error::ValidationErr;

/// Marker that addresses the next page of a listing.
///
/// Its content is meaningful only to the backend that issued it and is passed
/// back verbatim. `marker`, `nextToken`, `continuationToken` and
/// `nextPageToken` values all map onto this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Gives back the raw value, e.g. to put it into a request parameter.
    pub fn into_inner(self) -> String {
        self.0
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ContinuationToken {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ContinuationToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One batch of results from a collection-listing call.
///
/// A page carries its items in the order the backend returned them and an
/// optional continuation token. A present token means more pages exist; it
/// is never empty. Constructors turn an empty token into "no token", since
/// some backends send `""` on the last page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    items: Vec<T>,
    continuation_token: Option<ContinuationToken>,
}

impl<T> Page<T> {
    /// Creates a page from items and the token the backend returned with
    /// them.
    pub fn new<I, S>(items: I, continuation_token: Option<S>) -> Self
    where
        I: IntoIterator<Item = T>,
        S: Into<ContinuationToken>,
    {
        Self {
            items: items.into_iter().collect(),
            continuation_token: continuation_token
                .map(Into::into)
                .filter(|t: &ContinuationToken| !t.is_empty()),
        }
    }

    /// Creates the final page of a listing.
    pub fn last<I: IntoIterator<Item = T>>(items: I) -> Self {
        Self {
            items: items.into_iter().collect(),
            continuation_token: None,
        }
    }

    /// Creates a page from backends that report an `IsTruncated` flag
    /// alongside the next marker.
    ///
    /// When `is_truncated` is false the marker is ignored. When it is true a
    /// non-empty marker is required; the next page cannot be addressed
    /// otherwise.
    pub fn from_truncation<I, S>(
        items: I,
        is_truncated: bool,
        next_token: Option<S>,
    ) -> Result<Self, ValidationErr>
    where
        I: IntoIterator<Item = T>,
        S: Into<ContinuationToken>,
    {
        if !is_truncated {
            return Ok(Self::last(items));
        }
        let page = Self::new(items, next_token);
        if page.continuation_token.is_none() {
            return Err(ValidationErr::MissingContinuationToken);
        }
        Ok(page)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn continuation_token(&self) -> Option<&ContinuationToken> {
        self.continuation_token.as_ref()
    }

    /// Returns `true` if the backend reported more pages after this one.
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<ContinuationToken>) {
        (self.items, self.continuation_token)
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_means_last_page() {
        let page = Page::new(vec![1, 2], Some(""));
        assert!(!page.has_more());
        assert_eq!(page.items(), &[1, 2]);

        let page = Page::new(vec![1, 2], Some(String::new()));
        assert_eq!(page.continuation_token(), None);
    }

    #[test]
    fn test_token_is_kept() {
        let page = Page::new(Vec::<u8>::new(), Some("abc"));
        assert!(page.has_more());
        assert!(page.is_empty());
        assert_eq!(page.continuation_token().map(|t| t.as_str()), Some("abc"));
    }

    #[test]
    fn test_from_truncation() {
        let page = Page::from_truncation(vec!["a"], false, Some("ignored")).unwrap();
        assert!(!page.has_more());

        let page = Page::from_truncation(vec!["a"], true, Some("k1")).unwrap();
        assert_eq!(page.continuation_token(), Some(&ContinuationToken::new("k1")));

        let err = Page::from_truncation(vec!["a"], true, None::<&str>).unwrap_err();
        assert!(matches!(err, ValidationErr::MissingContinuationToken));

        let err = Page::from_truncation(vec!["a"], true, Some("")).unwrap_err();
        assert!(matches!(err, ValidationErr::MissingContinuationToken));
    }

    #[test]
    fn test_into_parts() {
        let (items, token) = Page::new(vec![3, 4], Some("next")).into_parts();
        assert_eq!(items, vec![3, 4]);
        assert_eq!(token.map(ContinuationToken::into_inner), Some("next".to_string()));
    }
}
