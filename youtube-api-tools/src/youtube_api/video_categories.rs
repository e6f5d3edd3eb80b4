//! Reference data for videos: categories and abuse report reasons.

use crate::error::{Result, require};
use crate::session::Session;
use crate::youtube_api::types::{ListResponse, OtherFields, Query, join_parts};
use http::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A category that can be associated with uploaded videos.
///
/// See: <https://developers.google.com/youtube/v3/docs/videoCategories#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoCategorySnippet>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCategorySnippet {
    pub title: String,
    /// Whether videos can be assigned to this category.
    #[serde(default)]
    pub assignable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// Which categories `videoCategories.list` should return. The API requires exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoCategoryFilter {
    Id(Vec<String>),
    /// Categories available in this ISO 3166-1 alpha-2 region.
    RegionCode(String),
}

/// A reason that can be given in [`crate::youtube_api::AbuseReport`].
///
/// See: <https://developers.google.com/youtube/v3/docs/videoAbuseReportReasons#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAbuseReportReason {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<AbuseReasonSnippet>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseReasonSnippet {
    pub label: String,
    #[serde(default)]
    pub secondary_reasons: Vec<SecondaryReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryReason {
    pub id: String,
    pub label: String,
}

/// Client for the `videoCategories` resource.
#[derive(Debug, Clone, Copy)]
pub struct VideoCategories<'s> {
    session: &'s Session,
}

impl<'s> VideoCategories<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Lists video categories. `hl` selects the language of the titles.
    ///
    /// <https://developers.google.com/youtube/v3/docs/videoCategories/list>
    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    pub async fn list(
        &self,
        parts: &[&str],
        filter: &VideoCategoryFilter,
        hl: Option<&str>,
    ) -> Result<ListResponse<VideoCategory>> {
        let query = Query::with_parts(&join_parts(parts))?;
        let query = match filter {
            VideoCategoryFilter::Id(ids) => query.set_ids("id", ids)?,
            VideoCategoryFilter::RegionCode(region) => {
                query.set("regionCode", require("regionCode", region)?)
            }
        };
        self.session
            .call(Method::GET, "videoCategories", &query.set_opt("hl", hl), None::<&()>)
            .await
    }
}

/// Client for the `videoAbuseReportReasons` resource.
#[derive(Debug, Clone, Copy)]
pub struct VideoAbuseReportReasons<'s> {
    session: &'s Session,
}

impl<'s> VideoAbuseReportReasons<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Lists the reasons a video can be reported for. `hl` selects the label language.
    ///
    /// <https://developers.google.com/youtube/v3/docs/videoAbuseReportReasons/list>
    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    pub async fn list(
        &self,
        parts: &[&str],
        hl: Option<&str>,
    ) -> Result<ListResponse<VideoAbuseReportReason>> {
        let query = Query::with_parts(&join_parts(parts))?.set_opt("hl", hl);
        self.session
            .call(Method::GET, "videoAbuseReportReasons", &query, None::<&()>)
            .await
    }
}
