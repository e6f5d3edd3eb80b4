//! YouTube Videos API types and functionality.

use crate::error::{Error, Result, require};
use crate::resolve::{Named, ResourceFamily};
use crate::session::Session;
use crate::youtube_api::types::{
    ListResponse, Media, OtherFields, PageRequest, PagedStream, Query, Thumbnails, join_parts,
};
use http::Method;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_stream::Stream;
use tracing::instrument;

/// A `video` resource represents a YouTube video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// The ID that YouTube uses to uniquely identify the video. Empty before upload.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VideoStatus>,
    /// Contains statistics about the video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<VideoStatistics>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Required by `videos.update` whenever the snippet is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
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

/// See: <https://developers.google.com/youtube/v3/docs/videos#status>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    /// `private`, `public` or `unlisted`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_status: Option<String>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// Statistics about the video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#statistics>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    /// The number of times the video has been viewed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<String>,
    /// The number of users who have indicated that they liked the video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<String>,
    /// The number of users who have indicated that they disliked the video.
    /// Note: This is only visible to the video owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislike_count: Option<String>,
    /// Note: This property is deprecated and always returns 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<String>,
    #[serde(flatten)]
    pub other: OtherFields,
}

impl Video {
    /// Metadata for [`Videos::insert`] with the `snippet` and `status` parts.
    pub fn draft(title: &str, description: &str, privacy_status: &str) -> Self {
        Self {
            snippet: Some(VideoSnippet {
                title: title.to_string(),
                description: Some(description.to_string()),
                ..Default::default()
            }),
            status: Some(VideoStatus {
                privacy_status: Some(privacy_status.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

impl Named for Video {
    fn display_name(&self) -> Option<&str> {
        self.snippet.as_ref().map(|s| s.title.as_str())
    }

    fn resource_id(&self) -> Option<&str> {
        Some(self.id.as_str()).filter(|id| !id.is_empty())
    }
}

/// Which videos `videos.list` should return. The API requires exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoFilter {
    Id(Vec<String>),
    /// The most popular videos, optionally for a region and/or category.
    MostPopular {
        region_code: Option<String>,
        video_category_id: Option<String>,
    },
    /// Videos the authenticated user rated `like` or `dislike`.
    MyRating(Rating),
}

impl VideoFilter {
    fn apply(&self, query: Query) -> Result<Query> {
        Ok(match self {
            Self::Id(ids) => query.set_ids("id", ids)?,
            Self::MostPopular {
                region_code,
                video_category_id,
            } => query
                .set("chart", "mostPopular")
                .set_opt("regionCode", region_code.clone())
                .set_opt("videoCategoryId", video_category_id.clone()),
            Self::MyRating(rating) => query.set("myRating", rating.to_string()),
        })
    }
}

/// A viewer's rating of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rating {
    Like,
    Dislike,
    /// Removes a previous rating.
    None,
    /// Only returned by `getRating`, for videos the user has not rated.
    Unspecified,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
            Self::None => "none",
            Self::Unspecified => "unspecified",
        })
    }
}

/// One entry of a `videos.getRating` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRating {
    pub video_id: String,
    pub rating: Rating,
}

#[derive(Deserialize)]
struct RatingResponse {
    #[serde(default)]
    items: Vec<VideoRating>,
}

/// The body of a `videos.reportAbuse` request.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/reportAbuse>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseReport {
    pub video_id: String,
    /// An ID from [`crate::youtube_api::VideoAbuseReportReasons::list`].
    pub reason_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_reason_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Client for the `videos` resource.
#[derive(Debug, Clone, Copy)]
pub struct Videos<'s> {
    session: &'s Session,
}

impl<'s> Videos<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of videos matching `filter`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/list>
    pub async fn list(
        &self,
        parts: &[&str],
        filter: &VideoFilter,
        page: &PageRequest,
    ) -> Result<ListResponse<Video>> {
        self.fetch(&join_parts(parts), filter, page).await
    }

    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch(
        &self,
        parts: &str,
        filter: &VideoFilter,
        page: &PageRequest,
    ) -> Result<ListResponse<Video>> {
        let query = filter.apply(Query::with_parts(parts)?)?.page(page);
        let videos: ListResponse<Video> = self
            .session
            .call(Method::GET, "videos", &query, None::<&()>)
            .await?;

        tracing::debug!(
            total_results = videos.total_results(),
            returned_items = videos.items.len(),
            "fetched videos"
        );

        Ok(videos)
    }

    /// Returns a paginated stream over every video matching `filter`.
    ///
    /// Pagination is only supported for [`VideoFilter::MostPopular`] and
    /// [`VideoFilter::MyRating`]; an ID list is answered in one page.
    pub fn list_all(
        self,
        parts: &[&str],
        filter: VideoFilter,
    ) -> impl Stream<Item = Result<Video>> + use<'s> {
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

    /// Gets a single video by ID, or [`Error::NotFound`].
    pub async fn get(&self, parts: &[&str], video_id: &str) -> Result<Video> {
        let filter = VideoFilter::Id(vec![require("id", video_id)?.to_string()]);
        let response = self.list(parts, &filter, &PageRequest::default()).await?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                family: ResourceFamily::Video,
                name: video_id.to_string(),
            })
    }

    /// Uploads a video with the resumable upload protocol.
    ///
    /// `parts` names the parts of `metadata` being set, usually `snippet` and `status`.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.upload` (or broader)
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/insert>
    #[instrument(skip(self, metadata, media))]
    pub async fn insert(
        &self,
        parts: &[&str],
        metadata: &Video,
        media: &Media,
        notify_subscribers: bool,
    ) -> Result<Video> {
        let query = Query::with_parts(&join_parts(parts))?
            .set("notifySubscribers", notify_subscribers.to_string());
        let video: Video = self
            .session
            .upload_resumable(Method::POST, "videos", query, metadata, media)
            .await?;
        tracing::info!(video_id = video.id, "uploaded video");
        Ok(video)
    }

    /// Replaces the named `parts` of a video.
    ///
    /// Writing `snippet` replaces all of it, so `title` and `categoryId` must be set.
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/update>
    #[instrument(skip(self, video), fields(video_id = %video.id))]
    pub async fn update(&self, parts: &[&str], video: &Video) -> Result<Video> {
        require("id", &video.id)?;
        let query = Query::with_parts(&join_parts(parts))?;
        self.session
            .call(Method::PUT, "videos", &query, Some(video))
            .await
    }

    /// Deletes a video.
    #[instrument(skip(self))]
    pub async fn delete(&self, video_id: &str) -> Result<()> {
        let query = Query::new().set("id", require("id", video_id)?);
        self.session
            .call_empty(Method::DELETE, "videos", &query, None::<&()>)
            .await?;
        tracing::info!(video_id, "deleted video");
        Ok(())
    }

    /// Rates a video on behalf of the authenticated user.
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/rate>
    #[instrument(skip(self))]
    pub async fn rate(&self, video_id: &str, rating: Rating) -> Result<()> {
        if rating == Rating::Unspecified {
            return Err(Error::InvalidArgument { name: "rating" });
        }
        let query = Query::new()
            .set("id", require("id", video_id)?)
            .set("rating", rating.to_string());
        self.session
            .call_empty(Method::POST, "videos/rate", &query, None::<&()>)
            .await
    }

    pub async fn like(&self, video_id: &str) -> Result<()> {
        self.rate(video_id, Rating::Like).await
    }

    pub async fn dislike(&self, video_id: &str) -> Result<()> {
        self.rate(video_id, Rating::Dislike).await
    }

    /// Removes the authenticated user's rating.
    pub async fn clear_rating(&self, video_id: &str) -> Result<()> {
        self.rate(video_id, Rating::None).await
    }

    /// Returns the authenticated user's ratings of the given videos.
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/getRating>
    #[instrument(skip(self))]
    pub async fn get_rating(&self, video_ids: &[String]) -> Result<Vec<VideoRating>> {
        let query = Query::new().set_ids("id", video_ids)?;
        let response: RatingResponse = self
            .session
            .call(Method::GET, "videos/getRating", &query, None::<&()>)
            .await?;
        Ok(response.items)
    }

    /// Reports a video for abusive content.
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/reportAbuse>
    #[instrument(skip(self, report), fields(video_id = %report.video_id))]
    pub async fn report_abuse(&self, report: &AbuseReport) -> Result<()> {
        require("videoId", &report.video_id)?;
        require("reasonId", &report.reason_id)?;
        self.session
            .call_empty(Method::POST, "videos/reportAbuse", &Query::new(), Some(report))
            .await
    }

    /// Changes a video's title, description and/or tags, keeping the rest of its snippet.
    #[instrument(skip(self, tags))]
    pub async fn update_details(
        &self,
        video_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        tags: Option<&[&str]>,
    ) -> Result<Video> {
        if title.is_none() && description.is_none() && tags.is_none() {
            return Err(Error::InvalidArgument {
                name: "title, description or tags",
            });
        }

        let mut video = self.get(&["snippet"], video_id).await?;
        let snippet = video.snippet.get_or_insert_with(Default::default);
        if let Some(title) = title {
            snippet.title = require("title", title)?.to_string();
        }
        if let Some(description) = description {
            snippet.description = Some(description.to_string());
        }
        if let Some(tags) = tags {
            snippet.tags = Some(tags.iter().map(|t| t.to_string()).collect());
        }

        // statistics and other read-only parts would be rejected by update
        video.statistics = None;
        self.update(&["snippet"], &video).await
    }
}
