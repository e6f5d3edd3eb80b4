//! YouTube Search API types and functionality.

use crate::error::Result;
use crate::resolve::{Named, RecordId};
use crate::session::Session;
use crate::youtube_api::types::{
    ListResponse, OtherFields, PageRequest, PagedStream, Query, Thumbnails, join_parts,
};
use http::Method;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::instrument;

/// A search result points at a channel, playlist or video that matched the query.
///
/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Which resource matched. Usually the object form naming the resource kind.
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<SearchResultSnippet>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/search#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultSnippet {
    /// The title of the matching channel, playlist or video.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The channel that published the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
    /// `upcoming`, `live` or `none`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_broadcast_content: Option<String>,
    #[serde(flatten)]
    pub other: OtherFields,
}

impl Named for SearchResult {
    fn display_name(&self) -> Option<&str> {
        self.snippet.as_ref().map(|s| s.title.as_str())
    }

    fn resource_id(&self) -> Option<&str> {
        self.id.as_str()
    }
}

/// Parameters for `search.list`.
///
/// Everything is optional. Values are passed to the API as given; it is the API that
/// rejects invalid enumerations or combinations (for instance `video*` filters without
/// `type=video`).
///
/// ```rust
/// use youtube_api_tools::youtube_api::SearchQuery;
///
/// let query = SearchQuery::new()
///     .q("rust async")
///     .resource_type("video")
///     .order("date")
///     .video_duration("long");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    q: Option<String>,
    resource_type: Option<String>,
    channel_id: Option<String>,
    channel_type: Option<String>,
    order: Option<String>,
    published_after: Option<Timestamp>,
    published_before: Option<Timestamp>,
    region_code: Option<String>,
    relevance_language: Option<String>,
    safe_search: Option<String>,
    topic_id: Option<String>,
    event_type: Option<String>,
    location: Option<String>,
    location_radius: Option<String>,
    video_caption: Option<String>,
    video_category_id: Option<String>,
    video_definition: Option<String>,
    video_dimension: Option<String>,
    video_duration: Option<String>,
    video_embeddable: Option<bool>,
    video_license: Option<String>,
    video_syndicated: Option<bool>,
    video_type: Option<String>,
    for_mine: bool,
}

macro_rules! string_setters {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.$name = Some(value.into());
                self
            }
        )*
    };
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    string_setters! {
        /// Free-text query. `-` excludes a term and `|` ORs terms.
        q,
        /// `channel`, `playlist` or `video`, or a comma-separated combination.
        resource_type,
        /// Only resources created by this channel.
        channel_id,
        /// `any` or `show`.
        channel_type,
        /// `date`, `rating`, `relevance` (default), `title`, `videoCount` or `viewCount`.
        order,
        /// ISO 3166-1 alpha-2 country code.
        region_code,
        /// ISO 639-1 language code.
        relevance_language,
        /// `moderate` (default), `none` or `strict`.
        safe_search,
        topic_id,
        /// `completed`, `live` or `upcoming`. Requires `type=video`.
        event_type,
        /// e.g. `5km` or `10mi`. Requires [`SearchQuery::location`].
        location_radius,
        /// `any`, `closedCaption` or `none`.
        video_caption,
        video_category_id,
        /// `any`, `high` or `standard`.
        video_definition,
        /// `2d`, `3d` or `any`.
        video_dimension,
        /// `any`, `long` (over 20 minutes), `medium` or `short` (under 4 minutes).
        video_duration,
        /// `any` or `creativeCommon`.
        video_license,
        /// `any`, `episode` or `movie`.
        video_type,
    }

    /// Only resources published at or after this instant.
    pub fn published_after(mut self, at: Timestamp) -> Self {
        self.published_after = Some(at);
        self
    }

    /// Only resources published before this instant.
    pub fn published_before(mut self, at: Timestamp) -> Self {
        self.published_before = Some(at);
        self
    }

    /// Center of a circular area to search videos in.
    pub fn location(mut self, latitude: f64, longitude: f64) -> Self {
        // kept as text so the query stays `Eq`
        self.location = Some(format!("{latitude},{longitude}"));
        self
    }

    /// Only videos that can be embedded into a webpage.
    pub fn video_embeddable(mut self, embeddable: bool) -> Self {
        self.video_embeddable = Some(embeddable);
        self
    }

    /// Only videos that can be played outside youtube.com.
    pub fn video_syndicated(mut self, syndicated: bool) -> Self {
        self.video_syndicated = Some(syndicated);
        self
    }

    /// Only the authenticated user's videos. Requires `type=video`.
    pub fn for_mine(mut self) -> Self {
        self.for_mine = true;
        self
    }

    fn apply(&self, query: Query) -> Query {
        let mut query = query
            .set_opt("q", self.q.clone())
            .set_opt("type", self.resource_type.clone())
            .set_opt("channelId", self.channel_id.clone())
            .set_opt("channelType", self.channel_type.clone())
            .set_opt("order", self.order.clone())
            .set_opt("publishedAfter", self.published_after.map(|t| t.to_string()))
            .set_opt("publishedBefore", self.published_before.map(|t| t.to_string()))
            .set_opt("regionCode", self.region_code.clone())
            .set_opt("relevanceLanguage", self.relevance_language.clone())
            .set_opt("safeSearch", self.safe_search.clone())
            .set_opt("topicId", self.topic_id.clone())
            .set_opt("eventType", self.event_type.clone())
            .set_opt("location", self.location.clone())
            .set_opt("locationRadius", self.location_radius.clone())
            .set_opt("videoCaption", self.video_caption.clone())
            .set_opt("videoCategoryId", self.video_category_id.clone())
            .set_opt("videoDefinition", self.video_definition.clone())
            .set_opt("videoDimension", self.video_dimension.clone())
            .set_opt("videoDuration", self.video_duration.clone())
            .set_opt("videoEmbeddable", self.video_embeddable.map(|b| b.to_string()))
            .set_opt("videoLicense", self.video_license.clone())
            .set_opt("videoSyndicated", self.video_syndicated.map(|b| b.to_string()))
            .set_opt("videoType", self.video_type.clone());
        if self.for_mine {
            query = query.set("forMine", "true");
        }
        query
    }
}

/// Client for `search.list`.
#[derive(Debug, Clone, Copy)]
pub struct Search<'s> {
    session: &'s Session,
}

impl<'s> Search<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of search results.
    ///
    /// Each call costs 100 quota units.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/search/list>
    pub async fn list(
        &self,
        parts: &[&str],
        query: &SearchQuery,
        page: &PageRequest,
    ) -> Result<ListResponse<SearchResult>> {
        self.fetch(&join_parts(parts), query, page).await
    }

    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch(
        &self,
        parts: &str,
        search: &SearchQuery,
        page: &PageRequest,
    ) -> Result<ListResponse<SearchResult>> {
        let query = search.apply(Query::with_parts(parts)?).page(page);
        let results: ListResponse<SearchResult> = self
            .session
            .call(Method::GET, "search", &query, None::<&()>)
            .await?;

        tracing::debug!(
            total_results = results.total_results(),
            returned_items = results.items.len(),
            has_next_page = results.next_page_token.is_some(),
            "fetched search results"
        );

        Ok(results)
    }

    /// Returns a paginated stream over every search result, 50 per page.
    ///
    /// The API stops paginating after a few hundred results regardless of `totalResults`.
    pub fn list_all(
        self,
        parts: &[&str],
        query: SearchQuery,
    ) -> impl Stream<Item = Result<SearchResult>> + use<'s> {
        let parts = join_parts(parts);
        PagedStream::new(move |page_token| {
            let parts = parts.clone();
            let query = query.clone();
            async move {
                let response = self
                    .fetch(&parts, &query, &PageRequest::from_token(page_token))
                    .await?;
                Ok(response.into_page())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use serde_json::json;
    use tokio_stream::StreamExt;

    #[test]
    fn query_maps_to_api_parameters() {
        let query = SearchQuery::new()
            .q("rust")
            .resource_type("video")
            .order("viewCount")
            .published_after("2024-01-01T00:00:00Z".parse().unwrap())
            .video_embeddable(true)
            .location(59.91, 10.75)
            .location_radius("10km")
            .for_mine()
            .apply(Query::new());

        assert_eq!(query.get("q"), Some("rust"));
        assert_eq!(query.get("type"), Some("video"));
        assert_eq!(query.get("order"), Some("viewCount"));
        assert_eq!(query.get("publishedAfter"), Some("2024-01-01T00:00:00Z"));
        assert_eq!(query.get("videoEmbeddable"), Some("true"));
        assert_eq!(query.get("location"), Some("59.91,10.75"));
        assert_eq!(query.get("locationRadius"), Some("10km"));
        assert_eq!(query.get("forMine"), Some("true"));
        assert_eq!(query.get("channelId"), None);
    }

    #[tokio::test]
    async fn list_parses_typed_ids() {
        let api = MockApi::start(|_| {
            (
                200,
                json!({
                    "kind": "youtube#searchListResponse",
                    "regionCode": "NO",
                    "pageInfo": {"totalResults": 1000000, "resultsPerPage": 2},
                    "items": [
                        {"kind": "youtube#searchResult", "id": {"kind": "youtube#video", "videoId": "v1"},
                         "snippet": {"title": "A video", "channelId": "UC1", "liveBroadcastContent": "none"}},
                        {"kind": "youtube#searchResult", "id": {"kind": "youtube#channel", "channelId": "UC2"},
                         "snippet": {"title": "A channel"}}
                    ]
                }),
            )
        })
        .await;
        let session = api.session();
        let page = Search::new(&session)
            .list(&["snippet"], &SearchQuery::new().q("a"), &PageRequest::first(2))
            .await
            .unwrap();

        assert_eq!(page.total_results(), 1_000_000);
        let ids: Vec<_> = page.items.iter().map(|r| r.resource_id()).collect();
        assert_eq!(ids, vec![Some("v1"), Some("UC2")]);
        assert_eq!(
            page.items[0].snippet.as_ref().unwrap().live_broadcast_content.as_deref(),
            Some("none")
        );
        assert_eq!(api.requests()[0].query("maxResults"), Some("2"));
    }

    #[tokio::test]
    async fn list_all_stops_on_empty_page_token() {
        let api = MockApi::start(|request| match request.query("pageToken") {
            None => (200, json!({"items": [{"id": "a", "snippet": {"title": "A"}}], "nextPageToken": "n"})),
            _ => (200, json!({"items": [{"id": "b", "snippet": {"title": "B"}}], "nextPageToken": ""})),
        })
        .await;
        let session = api.session();
        let results: Vec<_> = Search::new(&session)
            .list_all(&["snippet"], SearchQuery::new())
            .collect::<Result<Vec<_>>>()
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(api.requests().len(), 2);
    }
}
