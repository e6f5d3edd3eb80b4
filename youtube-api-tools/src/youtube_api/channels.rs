//! YouTube Channels API types and functionality.

use crate::error::{Error, Result, require};
use crate::resolve::{Named, ResourceFamily};
use crate::session::Session;
use crate::youtube_api::types::{
    ListResponse, OtherFields, PageRequest, PagedStream, Query, Thumbnails, join_parts,
};
use http::Method;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::instrument;

/// A `channel` resource contains information about a YouTube channel.
///
/// Only the fields this crate reasons about are typed; every other part the API returns
/// (`statistics`, `brandingSettings`, ...) is kept in [`Channel::other`] and sent back
/// unchanged on update.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// The ID that YouTube uses to uniquely identify the channel.
    pub id: String,
    /// Basic details about the channel: title, description, thumbnails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<ChannelSnippet>,
    #[serde(
        rename = "contentDetails",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_details: Option<ChannelContentDetails>,
    #[serde(flatten)]
    pub other: OtherFields,
}

impl Named for Channel {
    fn display_name(&self) -> Option<&str> {
        self.snippet.as_ref().map(|s| s.title.as_str())
    }

    fn resource_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// The snippet object contains basic details about the channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSnippet {
    /// The channel's title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The channel's custom URL, usually its `@handle`.
    #[serde(rename = "customUrl", default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    /// The date and time that the channel was created.
    #[serde(rename = "publishedAt", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/channels#contentDetails>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists", default)]
    pub related_playlists: RelatedPlaylists,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// Playlists YouTube maintains for every channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedPlaylists {
    /// The playlist of videos the channel owner liked. Only visible to the owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<String>,
    /// The playlist of the channel's uploaded videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploads: Option<String>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// Which channels `channels.list` should return. The API requires exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelFilter {
    /// Channels with these IDs.
    Id(Vec<String>),
    /// The authenticated user's channels.
    Mine,
    /// The channel with this `@handle` (with or without the `@`).
    ForHandle(String),
    /// The channel of this legacy YouTube username.
    ForUsername(String),
    /// Channels managed by the authenticated content owner.
    ManagedByMe,
}

impl ChannelFilter {
    fn apply(&self, query: Query) -> Result<Query> {
        Ok(match self {
            Self::Id(ids) => query.set_ids("id", ids)?,
            Self::Mine => query.set("mine", "true"),
            Self::ForHandle(handle) => query.set("forHandle", require("forHandle", handle)?),
            Self::ForUsername(name) => query.set("forUsername", require("forUsername", name)?),
            Self::ManagedByMe => query.set("managedByMe", "true"),
        })
    }
}

/// Client for the `channels` resource.
#[derive(Debug, Clone, Copy)]
pub struct Channels<'s> {
    session: &'s Session,
}

impl<'s> Channels<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of channels matching `filter`.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.readonly` (or broader) for [`ChannelFilter::Mine`]
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    pub async fn list(
        &self,
        parts: &[&str],
        filter: &ChannelFilter,
        page: &PageRequest,
    ) -> Result<ListResponse<Channel>> {
        self.fetch(&join_parts(parts), filter, page).await
    }

    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch(
        &self,
        parts: &str,
        filter: &ChannelFilter,
        page: &PageRequest,
    ) -> Result<ListResponse<Channel>> {
        let query = filter.apply(Query::with_parts(parts)?)?.page(page);
        let channels: ListResponse<Channel> = self
            .session
            .call(Method::GET, "channels", &query, None::<&()>)
            .await?;

        tracing::debug!(
            total_results = channels.total_results(),
            returned_items = channels.items.len(),
            "fetched channels"
        );

        Ok(channels)
    }

    /// Returns a paginated stream of every channel matching `filter`.
    ///
    /// Pages are requested lazily, 50 channels at a time.
    pub fn list_all(
        self,
        parts: &[&str],
        filter: ChannelFilter,
    ) -> impl Stream<Item = Result<Channel>> + use<'s> {
        let parts = join_parts(parts);
        PagedStream::new(move |page_token| {
            let parts = parts.clone();
            let filter = filter.clone();
            async move {
                let response = self
                    .fetch(&parts, &filter, &PageRequest::from_token(page_token))
                    .await?;
                Ok(response.into_page())
            }
        })
    }

    /// Gets a single channel by ID.
    ///
    /// Fails with [`Error::NotFound`] if the API returns no such channel.
    pub async fn get(&self, parts: &[&str], channel_id: &str) -> Result<Channel> {
        let filter = ChannelFilter::Id(vec![require("id", channel_id)?.to_string()]);
        let response = self.list(parts, &filter, &PageRequest::default()).await?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                family: ResourceFamily::Channel,
                name: channel_id.to_string(),
            })
    }

    /// Updates a channel's `brandingSettings` or `localizations`.
    ///
    /// `parts` names the parts of `channel` being written; parts not named keep their
    /// current value on the server.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/update>
    #[instrument(skip(self, channel), fields(channel_id = %channel.id))]
    pub async fn update(&self, parts: &[&str], channel: &Channel) -> Result<Channel> {
        require("id", &channel.id)?;
        let query = Query::with_parts(&join_parts(parts))?;
        let updated: Channel = self
            .session
            .call(Method::PUT, "channels", &query, Some(channel))
            .await?;
        tracing::debug!(channel_id = updated.id, "updated channel");
        Ok(updated)
    }

    /// Returns the ID of the authenticated user's "liked videos" playlist.
    pub async fn liked_videos_playlist(&self) -> Result<String> {
        let response = self
            .list(&["contentDetails"], &ChannelFilter::Mine, &PageRequest::default())
            .await?;
        response
            .items
            .into_iter()
            .find_map(|c| c.content_details.and_then(|d| d.related_playlists.likes))
            .ok_or_else(|| Error::NotFound {
                family: ResourceFamily::Playlist,
                name: "likes".to_string(),
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
    async fn list_mine_sends_filter_and_parts() {
        let api = MockApi::start(|_| {
            (
                200,
                json!({
                    "kind": "youtube#channelListResponse",
                    "pageInfo": {"totalResults": 1, "resultsPerPage": 5},
                    "items": [{
                        "kind": "youtube#channel",
                        "id": "UC1",
                        "snippet": {"title": "Mine", "publishedAt": "2006-05-12T03:19:56Z", "country": "NO"},
                        "statistics": {"viewCount": "10"}
                    }]
                }),
            )
        })
        .await;
        let session = api.session();
        let page = Channels::new(&session)
            .list(&["id", "snippet", "statistics"], &ChannelFilter::Mine, &PageRequest::first(5))
            .await
            .unwrap();

        let request = &api.requests()[0];
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/youtube/v3/channels");
        assert_eq!(request.query("part"), Some("id,snippet,statistics"));
        assert_eq!(request.query("mine"), Some("true"));
        assert_eq!(request.query("maxResults"), Some("5"));

        let channel = &page.items[0];
        assert_eq!(channel.id, "UC1");
        let snippet = channel.snippet.as_ref().unwrap();
        assert_eq!(snippet.title, "Mine");
        assert_eq!(snippet.other["country"], "NO");
        assert_eq!(channel.other["statistics"]["viewCount"], "10");
    }

    #[tokio::test]
    async fn list_all_walks_every_page() {
        let api = MockApi::start(|request| match request.query("pageToken") {
            None => (200, json!({"items": [{"id": "a"}, {"id": "b"}], "nextPageToken": "p2"})),
            Some("p2") => (200, json!({"items": [{"id": "c"}]})),
            Some(other) => panic!("unexpected page token {other}"),
        })
        .await;
        let session = api.session();
        let ids: Vec<String> = Channels::new(&session)
            .list_all(&["id"], ChannelFilter::ManagedByMe)
            .map(|c| c.unwrap().id)
            .collect()
            .await;
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(api.requests().len(), 2);
        assert_eq!(api.requests()[1].query("maxResults"), Some("50"));
    }

    #[tokio::test]
    async fn get_missing_channel_is_not_found() {
        let api = MockApi::start(|_| (200, json!({"kind": "youtube#channelListResponse"}))).await;
        let session = api.session();
        let err = Channels::new(&session)
            .get(&["snippet"], "UCnope")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound { family: ResourceFamily::Channel, ref name } if name == "UCnope"
        ));
    }

    #[tokio::test]
    async fn empty_arguments_fail_before_any_request() {
        let api = MockApi::start(|_| (200, json!({}))).await;
        let session = api.session();
        let channels = Channels::new(&session);

        let err = channels
            .list(&[], &ChannelFilter::Mine, &PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "part" }));

        let err = channels.get(&["id"], "").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "id" }));

        let err = channels
            .list(&["id"], &ChannelFilter::Id(vec![]), &PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "id" }));

        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn update_round_trips_unknown_parts() {
        let api = MockApi::start(|request| (200, request.json_body())).await;
        let session = api.session();
        let channel: Channel = serde_json::from_value(json!({
            "id": "UC1",
            "brandingSettings": {"channel": {"keywords": "rust"}}
        }))
        .unwrap();

        let updated = Channels::new(&session)
            .update(&["brandingSettings"], &channel)
            .await
            .unwrap();

        let request = &api.requests()[0];
        assert_eq!(request.method, "PUT");
        assert_eq!(request.query("part"), Some("brandingSettings"));
        assert_eq!(
            request.json_body(),
            json!({"id": "UC1", "brandingSettings": {"channel": {"keywords": "rust"}}})
        );
        assert_eq!(updated.other["brandingSettings"]["channel"]["keywords"], "rust");
    }

    #[tokio::test]
    async fn liked_videos_playlist() {
        let api = MockApi::start(|_| {
            (
                200,
                json!({"items": [{"id": "UC1", "contentDetails": {"relatedPlaylists": {"likes": "LL", "uploads": "UU1"}}}]}),
            )
        })
        .await;
        let session = api.session();
        let likes = Channels::new(&session).liked_videos_playlist().await.unwrap();
        assert_eq!(likes, "LL");
        assert_eq!(api.requests()[0].query("part"), Some("contentDetails"));
    }
}
