//! Shared types and streaming infrastructure for the resource clients.

use crate::error::{Error, Result, require};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio_stream::Stream;

/// Largest page size the list endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 50;

type OneFuturePage<'a, F, T> =
    Pin<Box<dyn Future<Output = Result<(F, (VecDeque<T>, Option<String>))>> + 'a + Send>>;

/// A paginated stream that automatically fetches subsequent pages from a YouTube API list endpoint.
///
/// Yields items one by one. The next page is only requested once the current page is drained
/// *and* the consumer polls again, so dropping the stream after a match never issues another
/// request. Only forward pagination is supported.
pub struct PagedStream<'a, T, F> {
    /// Current batch of items from the most recent API response
    current_items: VecDeque<T>,
    /// Future representing the currently pending API request, if any
    pending_request: Option<OneFuturePage<'a, F, T>>,
    /// Whether we've reached the end of all available data
    is_done: bool,
}

impl<'a, T, F> PagedStream<'a, T, F> {
    /// Create a new PagedStream whose first poll fetches the first page.
    pub fn new<Fut>(fetcher: F) -> Self
    where
        F: Fn(Option<String>) -> Fut,
        F: Send + 'a,
        Fut: Future<Output = Result<(VecDeque<T>, Option<String>)>> + Send + 'a,
    {
        let first_page = async move {
            let results = fetcher(None).await?;
            Ok((fetcher, results))
        };
        Self {
            pending_request: Some(Box::pin(first_page)),
            current_items: VecDeque::new(),
            is_done: false,
        }
    }
}

impl<'a, T: Unpin, F> Unpin for PagedStream<'a, T, F> {}

impl<'a, T: Unpin, F, Fut> Stream for PagedStream<'a, T, F>
where
    F: Fn(Option<String>) -> Fut,
    F: Send + 'a,
    Fut: Future<Output = Result<(VecDeque<T>, Option<String>)>> + Send + 'a,
{
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.current_items.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            if self.is_done {
                return Poll::Ready(None);
            }

            if let Some(pending) = self.pending_request.as_mut() {
                match pending.as_mut().poll(cx) {
                    Poll::Ready(Ok((fetcher, (items, next_token)))) => {
                        self.current_items.extend(items);

                        // An empty token is what some endpoints send on the last page.
                        match next_token.filter(|t| !t.is_empty()) {
                            Some(next_token) => {
                                // set up the next page, but don't poll it yet
                                self.pending_request = Some(Box::pin(async move {
                                    let results = fetcher(Some(next_token)).await?;
                                    Ok((fetcher, results))
                                }));
                            }
                            None => {
                                self.is_done = true;
                                self.pending_request = None;
                            }
                        }

                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        self.pending_request = None;
                        self.is_done = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => {
                        return Poll::Pending;
                    }
                }
            } else {
                self.is_done = true;
                return Poll::Ready(None);
            }
        }
    }
}

/// Paging details for lists of resources.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    /// The total number of results in the result set.
    #[serde(rename = "totalResults", default)]
    pub total_results: u32,
    /// The number of results included in the API response.
    #[serde(rename = "resultsPerPage", default)]
    pub results_per_page: u32,
}

/// One page of a `*.list` response.
///
/// Every list endpoint answers with this envelope; `T` is the resource record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// Identifies the API resource's type, e.g. `youtube#channelListResponse`.
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// The records on this page, in server order.
    #[serde(default = "VecDeque::new")]
    pub items: VecDeque<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    /// Token for the `pageToken` parameter to retrieve the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page_token: Option<String>,
}

impl<T> ListResponse<T> {
    pub(crate) fn into_page(self) -> (VecDeque<T>, Option<String>) {
        (self.items, self.next_page_token)
    }

    pub(crate) fn total_results(&self) -> u32 {
        self.page_info.as_ref().map_or(0, |p| p.total_results)
    }
}

/// Which page of a list to fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// `maxResults`; the API default (usually 5) applies when unset.
    pub max_results: Option<u32>,
    /// `pageToken` from a previous [`ListResponse::next_page_token`].
    pub page_token: Option<String>,
}

impl PageRequest {
    pub fn first(max_results: u32) -> Self {
        Self {
            max_results: Some(max_results),
            page_token: None,
        }
    }

    pub fn next(max_results: u32, page_token: impl Into<String>) -> Self {
        Self {
            max_results: Some(max_results),
            page_token: Some(page_token.into()),
        }
    }

    pub(crate) fn from_token(page_token: Option<String>) -> Self {
        Self {
            max_results: Some(MAX_PAGE_SIZE),
            page_token,
        }
    }
}

/// Query parameters of one request, in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub(crate) struct Query(Vec<(&'static str, String)>);

impl Query {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Starts a query with the `part` selector, which must not be empty.
    pub(crate) fn with_parts(parts: &str) -> Result<Self> {
        let parts = require("part", parts)?;
        Ok(Self::new().set("part", parts))
    }

    pub(crate) fn set(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.push((key, value.into()));
        self
    }

    pub(crate) fn set_opt(self, key: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Sets `key` to the comma-joined `ids`, which must not be empty.
    pub(crate) fn set_ids(self, key: &'static str, ids: &[String]) -> Result<Self> {
        let joined = ids.join(",");
        require(key, &joined)?;
        Ok(self.set(key, joined))
    }

    pub(crate) fn page(self, page: &PageRequest) -> Self {
        self.set_opt("maxResults", page.max_results.map(|n| n.to_string()))
            .set_opt("pageToken", page.page_token.clone())
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Joins a caller's part selector list into the `part` parameter value.
pub(crate) fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// A media body for upload endpoints.
#[derive(Debug, Clone)]
pub struct Media {
    /// MIME type, e.g. `video/mp4` or `image/png`.
    pub content_type: String,
    pub data: Bytes,
}

impl Media {
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Reads a whole file into memory.
    pub async fn from_file(path: impl AsRef<Path>, content_type: impl Into<String>) -> Result<Self> {
        let data = tokio::fs::read(path).await.map_err(Error::Io)?;
        Ok(Self::new(content_type, data))
    }
}

/// A single thumbnail image.
///
/// See: <https://developers.google.com/youtube/v3/docs/thumbnails>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Thumbnails keyed by size name (`default`, `medium`, `high`, `standard`, `maxres`).
pub type Thumbnails = BTreeMap<String, Thumbnail>;

/// Fields of a record that this crate does not model, passed through verbatim.
pub type OtherFields = Map<String, Value>;
