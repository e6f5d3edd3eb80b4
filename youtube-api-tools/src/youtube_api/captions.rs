//! YouTube Captions API types and functionality.

use crate::error::{Error, Result, require};
use crate::session::Session;
use crate::youtube_api::types::{ListResponse, Media, OtherFields, Query, join_parts};
use bytes::Bytes;
use http::Method;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::instrument;

/// A `caption` resource represents a caption track of a video.
///
/// See: <https://developers.google.com/youtube/v3/docs/captions#resource>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Caption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<CaptionSnippet>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/captions#snippet>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSnippet {
    pub video_id: String,
    /// BCP-47 language tag, e.g. `en` or `pt-BR`.
    pub language: String,
    /// The track's name, shown to viewers.
    #[serde(default)]
    pub name: String,
    /// `standard`, `ASR` (automatic) or `forced`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
    /// `serving`, `syncing` or `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub other: OtherFields,
}

impl Caption {
    /// Metadata for a new track of `video_id`, for [`Captions::insert`].
    pub fn draft(video_id: &str, language: &str, name: &str) -> Self {
        Self {
            snippet: Some(CaptionSnippet {
                video_id: video_id.to_string(),
                language: language.to_string(),
                name: name.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Client for the `captions` resource.
#[derive(Debug, Clone, Copy)]
pub struct Captions<'s> {
    session: &'s Session,
}

impl<'s> Captions<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Lists the caption tracks of a video, optionally only those in `ids`.
    ///
    /// This endpoint is not paginated.
    ///
    /// <https://developers.google.com/youtube/v3/docs/captions/list>
    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    pub async fn list(
        &self,
        parts: &[&str],
        video_id: &str,
        ids: &[String],
    ) -> Result<ListResponse<Caption>> {
        let mut query =
            Query::with_parts(&join_parts(parts))?.set("videoId", require("videoId", video_id)?);
        if !ids.is_empty() {
            query = query.set_ids("id", ids)?;
        }
        self.session
            .call(Method::GET, "captions", &query, None::<&()>)
            .await
    }

    /// Uploads a caption track.
    ///
    /// With `sync`, YouTube ignores the file's timing and aligns the text to the audio.
    ///
    /// <https://developers.google.com/youtube/v3/docs/captions/insert>
    #[instrument(skip(self, caption, media))]
    pub async fn insert(
        &self,
        parts: &[&str],
        caption: &Caption,
        media: &Media,
        sync: bool,
    ) -> Result<Caption> {
        let query = Query::with_parts(&join_parts(parts))?.set("sync", sync.to_string());
        let created: Caption = self
            .session
            .upload_resumable(Method::POST, "captions", query, caption, media)
            .await?;
        tracing::info!(caption_id = created.id, "uploaded caption track");
        Ok(created)
    }

    /// Updates a track's draft status, and replaces its file when `media` is given.
    ///
    /// <https://developers.google.com/youtube/v3/docs/captions/update>
    #[instrument(skip(self, caption, media), fields(caption_id = %caption.id))]
    pub async fn update(
        &self,
        parts: &[&str],
        caption: &Caption,
        media: Option<&Media>,
    ) -> Result<Caption> {
        require("id", &caption.id)?;
        let query = Query::with_parts(&join_parts(parts))?;
        match media {
            Some(media) => {
                self.session
                    .upload_resumable(Method::PUT, "captions", query, caption, media)
                    .await
            }
            None => {
                self.session
                    .call(Method::PUT, "captions", &query, Some(caption))
                    .await
            }
        }
    }

    /// Downloads a caption track.
    ///
    /// `format` converts the track (`sbv`, `scc`, `srt`, `ttml` or `vtt`) and `language`
    /// machine-translates it; both default to the track as uploaded.
    ///
    /// <https://developers.google.com/youtube/v3/docs/captions/download>
    #[instrument(skip(self))]
    pub async fn download(
        &self,
        caption_id: &str,
        format: Option<&str>,
        language: Option<&str>,
    ) -> Result<Bytes> {
        let path = format!("captions/{}", require("id", caption_id)?);
        let query = Query::new()
            .set_opt("tfmt", format)
            .set_opt("tlang", language);
        let body = self.session.download(&path, &query).await?;
        tracing::debug!(bytes = body.len(), "downloaded caption track");
        Ok(body)
    }

    /// Downloads a caption track into `path`, replacing the file if it exists.
    pub async fn download_to_file(
        &self,
        caption_id: &str,
        path: impl AsRef<Path>,
        format: Option<&str>,
    ) -> Result<()> {
        let body = self.download(caption_id, format, None).await?;
        tokio::fs::write(path, &body).await.map_err(Error::Io)
    }

    /// Deletes a caption track.
    #[instrument(skip(self))]
    pub async fn delete(&self, caption_id: &str) -> Result<()> {
        let query = Query::new().set("id", require("id", caption_id)?);
        self.session
            .call_empty(Method::DELETE, "captions", &query, None::<&()>)
            .await
    }
}
