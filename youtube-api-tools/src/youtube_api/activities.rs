//! YouTube Activities API types and functionality.

use crate::error::{Result, require};
use crate::session::Session;
use crate::youtube_api::types::{
    ListResponse, OtherFields, PageRequest, PagedStream, Query, Thumbnails, join_parts,
};
use http::Method;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::instrument;

/// An `activity` is an action a channel or user took: an upload, a like, a playlist
/// addition, and so on.
///
/// See: <https://developers.google.com/youtube/v3/docs/activities#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<ActivitySnippet>,
    /// Details that depend on the activity type; passed through as returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<serde_json::Value>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnippet {
    #[serde(default)]
    pub title: String,
    /// `upload`, `like`, `playlistItem`, `subscription`, ...
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// Whose activities to list. The API requires exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityFilter {
    ChannelId(String),
    /// The authenticated user's own activities.
    Mine,
}

/// Optional narrowing of an activity listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityOptions {
    pub published_after: Option<Timestamp>,
    pub published_before: Option<Timestamp>,
    pub region_code: Option<String>,
}

fn activity_query(
    parts: &str,
    filter: &ActivityFilter,
    options: &ActivityOptions,
    page: &PageRequest,
) -> Result<Query> {
    let query = Query::with_parts(parts)?;
    let query = match filter {
        ActivityFilter::ChannelId(channel) => query.set("channelId", require("channelId", channel)?),
        ActivityFilter::Mine => query.set("mine", "true"),
    };
    Ok(query
        .set_opt("publishedAfter", options.published_after.map(|t| t.to_string()))
        .set_opt("publishedBefore", options.published_before.map(|t| t.to_string()))
        .set_opt("regionCode", options.region_code.clone())
        .page(page))
}

/// Client for the `activities` resource.
#[derive(Debug, Clone, Copy)]
pub struct Activities<'s> {
    session: &'s Session,
}

impl<'s> Activities<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of activities.
    ///
    /// <https://developers.google.com/youtube/v3/docs/activities/list>
    pub async fn list(
        &self,
        parts: &[&str],
        filter: &ActivityFilter,
        options: &ActivityOptions,
        page: &PageRequest,
    ) -> Result<ListResponse<Activity>> {
        self.fetch(&join_parts(parts), filter, options, page).await
    }

    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch(
        &self,
        parts: &str,
        filter: &ActivityFilter,
        options: &ActivityOptions,
        page: &PageRequest,
    ) -> Result<ListResponse<Activity>> {
        let query = activity_query(parts, filter, options, page)?;
        let activities: ListResponse<Activity> = self
            .session
            .call(Method::GET, "activities", &query, None::<&()>)
            .await?;

        tracing::debug!(
            total_results = activities.total_results(),
            returned_items = activities.items.len(),
            "fetched activities"
        );

        Ok(activities)
    }

    /// Returns a paginated stream over every matching activity, newest first.
    pub fn list_all(
        self,
        parts: &[&str],
        filter: ActivityFilter,
        options: ActivityOptions,
    ) -> impl Stream<Item = Result<Activity>> + use<'s> {
        let parts = join_parts(parts);
        PagedStream::new(move |page_token| {
            let parts = parts.clone();
            let filter = filter.clone();
            let options = options.clone();
            async move {
                let response = self
                    .fetch(&parts, &filter, &options, &PageRequest::from_token(page_token))
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

    #[tokio::test]
    async fn list_with_date_window() {
        let api = MockApi::start(|_| {
            (
                200,
                json!({"items": [{"id": "a1", "snippet": {"title": "Uploaded", "type": "upload"},
                    "contentDetails": {"upload": {"videoId": "v1"}}}]}),
            )
        })
        .await;
        let session = api.session();
        let options = ActivityOptions {
            published_after: Some("2024-03-01T00:00:00Z".parse().unwrap()),
            ..Default::default()
        };
        let page = Activities::new(&session)
            .list(&["snippet", "contentDetails"], &ActivityFilter::Mine, &options, &PageRequest::first(25))
            .await
            .unwrap();

        let request = &api.requests()[0];
        assert_eq!(request.path, "/youtube/v3/activities");
        assert_eq!(request.query("mine"), Some("true"));
        assert_eq!(request.query("publishedAfter"), Some("2024-03-01T00:00:00Z"));
        assert_eq!(request.query("publishedBefore"), None);

        let activity = &page.items[0];
        assert_eq!(activity.snippet.as_ref().unwrap().activity_type.as_deref(), Some("upload"));
        assert_eq!(activity.content_details.as_ref().unwrap()["upload"]["videoId"], "v1");
    }

    #[tokio::test]
    async fn list_all_for_channel() {
        let api = MockApi::start(|request| match request.query("pageToken") {
            None => (200, json!({"items": [{"id": "a"}], "nextPageToken": "2"})),
            _ => (200, json!({"items": [{"id": "b"}]})),
        })
        .await;
        let session = api.session();
        let ids: Vec<_> = Activities::new(&session)
            .list_all(&["id"], ActivityFilter::ChannelId("UC1".into()), ActivityOptions::default())
            .map(|a| a.unwrap().id)
            .collect()
            .await;
        assert_eq!(ids, vec!["a", "b"]);
        assert!(api.requests().iter().all(|r| r.query("channelId") == Some("UC1")));
    }
}
