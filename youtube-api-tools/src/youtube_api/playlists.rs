//! YouTube Playlists API types and functionality.

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

/// A `playlist` resource represents a YouTube playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Empty until the playlist has been created.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PlaylistSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlaylistStatus>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlists#snippet>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnippet {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The channel that owns the playlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlists#status>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStatus {
    /// `private`, `public` or `unlisted`.
    pub privacy_status: String,
    #[serde(flatten)]
    pub other: OtherFields,
}

impl Playlist {
    /// A playlist ready for [`Playlists::insert`] with the `snippet` and `status` parts.
    pub fn draft(title: &str, description: &str, privacy_status: &str) -> Self {
        Self {
            snippet: Some(PlaylistSnippet {
                title: title.to_string(),
                description: Some(description.to_string()),
                ..Default::default()
            }),
            status: Some(PlaylistStatus {
                privacy_status: privacy_status.to_string(),
                other: OtherFields::new(),
            }),
            ..Default::default()
        }
    }
}

impl Named for Playlist {
    fn display_name(&self) -> Option<&str> {
        self.snippet.as_ref().map(|s| s.title.as_str())
    }

    fn resource_id(&self) -> Option<&str> {
        Some(&self.id).filter(|id| !id.is_empty()).map(String::as_str)
    }
}

/// Which playlists `playlists.list` should return. The API requires exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistFilter {
    /// Playlists owned by this channel.
    ChannelId(String),
    Id(Vec<String>),
    /// The authenticated user's playlists.
    Mine,
}

impl PlaylistFilter {
    fn apply(&self, query: Query) -> Result<Query> {
        Ok(match self {
            Self::ChannelId(channel) => query.set("channelId", require("channelId", channel)?),
            Self::Id(ids) => query.set_ids("id", ids)?,
            Self::Mine => query.set("mine", "true"),
        })
    }
}

/// Client for the `playlists` resource.
#[derive(Debug, Clone, Copy)]
pub struct Playlists<'s> {
    session: &'s Session,
}

impl<'s> Playlists<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of playlists matching `filter`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/list>
    pub async fn list(
        &self,
        parts: &[&str],
        filter: &PlaylistFilter,
        page: &PageRequest,
    ) -> Result<ListResponse<Playlist>> {
        self.fetch(&join_parts(parts), filter, page).await
    }

    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch(
        &self,
        parts: &str,
        filter: &PlaylistFilter,
        page: &PageRequest,
    ) -> Result<ListResponse<Playlist>> {
        let query = filter.apply(Query::with_parts(parts)?)?.page(page);
        let playlists: ListResponse<Playlist> = self
            .session
            .call(Method::GET, "playlists", &query, None::<&()>)
            .await?;

        tracing::debug!(
            total_results = playlists.total_results(),
            returned_items = playlists.items.len(),
            "fetched playlists"
        );

        Ok(playlists)
    }

    /// Returns a paginated stream of every playlist matching `filter`.
    pub fn list_all(
        self,
        parts: &[&str],
        filter: PlaylistFilter,
    ) -> impl Stream<Item = Result<Playlist>> + use<'s> {
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

    /// Gets a single playlist by ID, or [`Error::NotFound`].
    pub async fn get(&self, parts: &[&str], playlist_id: &str) -> Result<Playlist> {
        let filter = PlaylistFilter::Id(vec![require("id", playlist_id)?.to_string()]);
        let response = self.list(parts, &filter, &PageRequest::default()).await?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                family: ResourceFamily::Playlist,
                name: playlist_id.to_string(),
            })
    }

    /// Creates a playlist.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/insert>
    #[instrument(skip(self, playlist))]
    pub async fn insert(&self, parts: &[&str], playlist: &Playlist) -> Result<Playlist> {
        let query = Query::with_parts(&join_parts(parts))?;
        let created: Playlist = self
            .session
            .call(Method::POST, "playlists", &query, Some(playlist))
            .await?;
        tracing::info!(playlist_id = created.id, "created playlist");
        Ok(created)
    }

    /// Creates a playlist with the given title, description and privacy status.
    pub async fn create(
        &self,
        title: &str,
        description: &str,
        privacy_status: &str,
    ) -> Result<Playlist> {
        require("title", title)?;
        self.insert(
            &["snippet", "status"],
            &Playlist::draft(title, description, privacy_status),
        )
        .await
    }

    /// Replaces the named `parts` of an existing playlist.
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/update>
    #[instrument(skip(self, playlist), fields(playlist_id = %playlist.id))]
    pub async fn update(&self, parts: &[&str], playlist: &Playlist) -> Result<Playlist> {
        require("id", &playlist.id)?;
        let query = Query::with_parts(&join_parts(parts))?;
        self.session
            .call(Method::PUT, "playlists", &query, Some(playlist))
            .await
    }

    /// Deletes a playlist.
    #[instrument(skip(self))]
    pub async fn delete(&self, playlist_id: &str) -> Result<()> {
        let query = Query::new().set("id", require("id", playlist_id)?);
        self.session
            .call_empty(Method::DELETE, "playlists", &query, None::<&()>)
            .await?;
        tracing::info!(playlist_id, "deleted playlist");
        Ok(())
    }

    /// Changes a playlist's title and/or description, keeping the rest of its snippet.
    ///
    /// At least one of `title` and `description` must be given.
    #[instrument(skip(self))]
    pub async fn update_details(
        &self,
        playlist_id: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Playlist> {
        if title.is_none() && description.is_none() {
            return Err(Error::InvalidArgument {
                name: "title or description",
            });
        }

        let mut playlist = self.get(&["snippet"], playlist_id).await?;
        let snippet = playlist.snippet.get_or_insert_with(Default::default);
        if let Some(title) = title {
            snippet.title = require("title", title)?.to_string();
        }
        if let Some(description) = description {
            snippet.description = Some(description.to_string());
        }
        self.update(&["snippet"], &playlist).await
    }

    /// Sets a playlist's privacy status (`private`, `public` or `unlisted`).
    #[instrument(skip(self))]
    pub async fn set_privacy_status(
        &self,
        playlist_id: &str,
        privacy_status: &str,
    ) -> Result<Playlist> {
        let privacy_status = require("privacyStatus", privacy_status)?;
        let mut playlist = self.get(&["status"], playlist_id).await?;
        playlist
            .status
            .get_or_insert_with(Default::default)
            .privacy_status = privacy_status.to_string();
        self.update(&["status"], &playlist).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockApi, MockResponse};
    use serde_json::json;

    #[tokio::test]
    async fn create_sends_snippet_and_status() {
        let api = MockApi::start(|request| {
            let mut created = request.json_body();
            created["id"] = json!("PL1");
            (200, created)
        })
        .await;
        let session = api.session();

        let playlist = Playlists::new(&session)
            .create("Mix", "Songs", "unlisted")
            .await
            .unwrap();

        assert_eq!(playlist.id, "PL1");
        let request = &api.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/youtube/v3/playlists");
        assert_eq!(request.query("part"), Some("snippet,status"));
        assert_eq!(
            request.json_body(),
            json!({"snippet": {"title": "Mix", "description": "Songs"}, "status": {"privacyStatus": "unlisted"}})
        );
    }

    #[tokio::test]
    async fn update_details_merges_into_current_snippet() {
        let api = MockApi::start(|request| match request.method.as_str() {
            "GET" => (
                200,
                json!({"items": [{
                    "id": "PL1",
                    "snippet": {"title": "Old", "description": "Keep me", "defaultLanguage": "en"}
                }]}),
            ),
            _ => (200, request.json_body()),
        })
        .await;
        let session = api.session();

        let updated = Playlists::new(&session)
            .update_details("PL1", Some("New"), None)
            .await
            .unwrap();

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query("id"), Some("PL1"));
        assert_eq!(requests[1].method, "PUT");
        assert_eq!(requests[1].query("part"), Some("snippet"));
        assert_eq!(
            requests[1].json_body(),
            json!({"id": "PL1", "snippet": {"title": "New", "description": "Keep me", "defaultLanguage": "en"}})
        );
        assert_eq!(updated.snippet.unwrap().title, "New");
    }

    #[tokio::test]
    async fn update_details_requires_a_change() {
        let api = MockApi::start(|_| (200, json!({}))).await;
        let session = api.session();
        let err = Playlists::new(&session)
            .update_details("PL1", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn set_privacy_status_updates_status_part() {
        let api = MockApi::start(|request| match request.method.as_str() {
            "GET" => (200, json!({"items": [{"id": "PL1", "status": {"privacyStatus": "public"}}]})),
            _ => (200, request.json_body()),
        })
        .await;
        let session = api.session();

        let updated = Playlists::new(&session)
            .set_privacy_status("PL1", "private")
            .await
            .unwrap();

        assert_eq!(updated.status.unwrap().privacy_status, "private");
        let put = &api.requests()[1];
        assert_eq!(put.query("part"), Some("status"));
        assert_eq!(put.json_body()["status"]["privacyStatus"], "private");
    }

    #[tokio::test]
    async fn delete_sends_id() {
        let api = MockApi::start(|_| MockResponse::empty(204)).await;
        let session = api.session();
        Playlists::new(&session).delete("PL1").await.unwrap();
        let request = &api.requests()[0];
        assert_eq!(request.method, "DELETE");
        assert_eq!(request.query("id"), Some("PL1"));
    }

    #[tokio::test]
    async fn list_by_channel() {
        let api = MockApi::start(|_| {
            (200, json!({"items": [{"id": "PL1", "snippet": {"title": "A"}}, {"id": "PL2", "snippet": {"title": "B"}}]}))
        })
        .await;
        let session = api.session();
        let page = Playlists::new(&session)
            .list(
                &["snippet"],
                &PlaylistFilter::ChannelId("UC1".into()),
                &PageRequest::first(10),
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(api.requests()[0].query("channelId"), Some("UC1"));
        assert_eq!(page.items[1].display_name(), Some("B"));
    }
}
