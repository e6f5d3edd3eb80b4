//! YouTube PlaylistItems API types and functionality.

use crate::error::{Error, Result, require};
use crate::resolve::ResourceFamily;
use crate::session::Session;
use crate::youtube_api::types::{
    ListResponse, OtherFields, PageRequest, PagedStream, Query, Thumbnails, join_parts,
};
use http::Method;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::pin::pin;
use tokio_stream::{Stream, StreamExt};
use tracing::instrument;

/// A `playlistItem` identifies a resource, usually a video, included in a playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#resource>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Empty until the item has been inserted.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PlaylistItemSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<PlaylistItemContentDetails>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#snippet>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub playlist_id: String,
    /// Zero-based position of the item in the playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// The resource (video) this item points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#snippet.resourceId>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    /// e.g. `youtube#video`
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl ResourceId {
    pub fn video(video_id: &str) -> Self {
        Self {
            kind: "youtube#video".to_string(),
            video_id: Some(video_id.to_string()),
        }
    }
}

/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#contentDetails>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    /// A user-generated note for this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_published_at: Option<Timestamp>,
    #[serde(flatten)]
    pub other: OtherFields,
}

impl PlaylistItem {
    /// An item that appends `video_id` to `playlist_id`, or places it at `position`.
    pub fn for_video(playlist_id: &str, video_id: &str, position: Option<u32>) -> Self {
        Self {
            snippet: Some(PlaylistItemSnippet {
                playlist_id: playlist_id.to_string(),
                position,
                resource_id: Some(ResourceId::video(video_id)),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// The ID of the video this item points at.
    pub fn video_id(&self) -> Option<&str> {
        self.snippet
            .as_ref()
            .and_then(|s| s.resource_id.as_ref())
            .and_then(|r| r.video_id.as_deref())
            .or_else(|| {
                self.content_details
                    .as_ref()
                    .and_then(|d| d.video_id.as_deref())
            })
    }
}

/// Which items `playlistItems.list` should return. The API requires exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistItemFilter {
    /// Every item of this playlist.
    PlaylistId(String),
    Id(Vec<String>),
    /// Only the items of `playlist_id` that point at `video_id`.
    VideoInPlaylist { playlist_id: String, video_id: String },
}

impl PlaylistItemFilter {
    fn apply(&self, query: Query) -> Result<Query> {
        Ok(match self {
            Self::PlaylistId(playlist) => query.set("playlistId", require("playlistId", playlist)?),
            Self::Id(ids) => query.set_ids("id", ids)?,
            Self::VideoInPlaylist {
                playlist_id,
                video_id,
            } => query
                .set("playlistId", require("playlistId", playlist_id)?)
                .set("videoId", require("videoId", video_id)?),
        })
    }
}

/// Client for the `playlistItems` resource.
#[derive(Debug, Clone, Copy)]
pub struct PlaylistItems<'s> {
    session: &'s Session,
}

impl<'s> PlaylistItems<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of playlist items.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/list>
    pub async fn list(
        &self,
        parts: &[&str],
        filter: &PlaylistItemFilter,
        page: &PageRequest,
    ) -> Result<ListResponse<PlaylistItem>> {
        self.fetch(&join_parts(parts), filter, page).await
    }

    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch(
        &self,
        parts: &str,
        filter: &PlaylistItemFilter,
        page: &PageRequest,
    ) -> Result<ListResponse<PlaylistItem>> {
        let query = filter.apply(Query::with_parts(parts)?)?.page(page);
        let items: ListResponse<PlaylistItem> = self
            .session
            .call(Method::GET, "playlistItems", &query, None::<&()>)
            .await?;

        tracing::debug!(
            total_results = items.total_results(),
            returned_items = items.items.len(),
            "fetched playlist items"
        );

        Ok(items)
    }

    /// Returns a paginated stream over every matching item, in playlist order.
    pub fn list_all(
        self,
        parts: &[&str],
        filter: PlaylistItemFilter,
    ) -> impl Stream<Item = Result<PlaylistItem>> + use<'s> {
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

    /// Adds an item to a playlist.
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/insert>
    #[instrument(skip(self, item))]
    pub async fn insert(&self, parts: &[&str], item: &PlaylistItem) -> Result<PlaylistItem> {
        let query = Query::with_parts(&join_parts(parts))?;
        self.session
            .call(Method::POST, "playlistItems", &query, Some(item))
            .await
    }

    /// Appends `video_id` to `playlist_id`, or inserts it at `position`.
    pub async fn add_video(
        &self,
        playlist_id: &str,
        video_id: &str,
        position: Option<u32>,
    ) -> Result<PlaylistItem> {
        require("playlistId", playlist_id)?;
        require("videoId", video_id)?;
        self.insert(
            &["snippet"],
            &PlaylistItem::for_video(playlist_id, video_id, position),
        )
        .await
    }

    /// Replaces the named `parts` of an item, e.g. to move it or change its note.
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/update>
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn update(&self, parts: &[&str], item: &PlaylistItem) -> Result<PlaylistItem> {
        require("id", &item.id)?;
        let query = Query::with_parts(&join_parts(parts))?;
        self.session
            .call(Method::PUT, "playlistItems", &query, Some(item))
            .await
    }

    /// Removes an item from its playlist. This takes the item ID, not the video ID.
    #[instrument(skip(self))]
    pub async fn delete(&self, playlist_item_id: &str) -> Result<()> {
        let query = Query::new().set("id", require("id", playlist_item_id)?);
        self.session
            .call_empty(Method::DELETE, "playlistItems", &query, None::<&()>)
            .await
    }

    /// Appends every video of `source_playlist_id` to `destination_playlist_id`, in order.
    ///
    /// Returns how many items were copied. Items that do not point at a video are skipped.
    /// A failure stops the copy; items inserted before it stay in the destination.
    #[instrument(skip(self))]
    pub async fn copy_playlist(
        &self,
        source_playlist_id: &str,
        destination_playlist_id: &str,
    ) -> Result<usize> {
        require("destination", destination_playlist_id)?;
        let source = PlaylistItemFilter::PlaylistId(require("source", source_playlist_id)?.to_string());

        // Drain the source first: inserts into an overlapping destination show up on later pages.
        let mut video_ids = Vec::new();
        let mut items = pin!(self.list_all(&["snippet"], source));
        while let Some(item) = items.next().await {
            let item = item?;
            match item.video_id() {
                Some(video_id) => video_ids.push(video_id.to_string()),
                None => tracing::debug!(item_id = item.id, "skipping item without a video"),
            }
        }

        let mut copied = 0;
        for video_id in &video_ids {
            self.add_video(destination_playlist_id, video_id, None)
                .await?;
            copied += 1;
        }

        tracing::info!(copied, "copied playlist");
        Ok(copied)
    }

    /// Moves each video in `video_ids` to the position equal to its index in the slice.
    ///
    /// Every video must already be in the playlist; otherwise nothing is moved and
    /// [`Error::NotFound`] names the first missing video. A video listed twice is
    /// rejected with [`Error::InvalidArgument`] before anything is fetched.
    #[instrument(skip(self, video_ids), fields(videos = video_ids.len()))]
    pub async fn reorder(&self, playlist_id: &str, video_ids: &[&str]) -> Result<()> {
        let filter = PlaylistItemFilter::PlaylistId(require("playlistId", playlist_id)?.to_string());
        let mut seen = HashSet::with_capacity(video_ids.len());
        if !video_ids.iter().all(|id| seen.insert(*id)) {
            return Err(Error::InvalidArgument { name: "video_ids" });
        }
        let mut by_video = HashMap::new();
        let mut items = pin!(self.list_all(&["snippet"], filter));
        while let Some(item) = items.next().await {
            let item = item?;
            if let Some(video_id) = item.video_id() {
                by_video.entry(video_id.to_string()).or_insert(item);
            }
        }

        let mut moves = Vec::with_capacity(video_ids.len());
        for (position, video_id) in video_ids.iter().enumerate() {
            let Some(mut item) = by_video.remove(*video_id) else {
                return Err(Error::NotFound {
                    family: ResourceFamily::PlaylistItem,
                    name: video_id.to_string(),
                });
            };
            if let Some(snippet) = item.snippet.as_mut() {
                snippet.position = Some(position as u32);
            }
            moves.push(item);
        }

        for item in &moves {
            self.update(&["snippet"], item).await?;
        }
        Ok(())
    }
}
