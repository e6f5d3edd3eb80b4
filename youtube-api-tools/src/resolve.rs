//! Resolving human-readable names to canonical resource IDs.
//!
//! Resolution searches for the name and scans the results page by page, in the order
//! the API returns them. The first record whose title matches wins and no further page
//! is requested. When several records share the matching title, which one comes first
//! is decided by the API's ordering, which this crate does not control. Treat such
//! ties as non-deterministic.

use crate::error::{Error, Result, require};
use crate::session::Session;
use crate::youtube_api::search::{Search, SearchQuery};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::pin;
use tokio_stream::{Stream, StreamExt};
use tracing::instrument;

/// One category of remote entity with its own fixed field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    Activity,
    Caption,
    Channel,
    Comment,
    CommentThread,
    Member,
    MembershipsLevel,
    Playlist,
    PlaylistItem,
    SearchResult,
    Subscription,
    Thumbnail,
    Video,
    VideoAbuseReportReason,
    VideoCategory,
    Watermark,
}

impl ResourceFamily {
    /// The `type` value `search.list` accepts for this family, if it is searchable.
    pub fn search_type(self) -> Option<&'static str> {
        match self {
            Self::Channel => Some("channel"),
            Self::Playlist => Some("playlist"),
            Self::Video => Some("video"),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Activity => "activity",
            Self::Caption => "caption",
            Self::Channel => "channel",
            Self::Comment => "comment",
            Self::CommentThread => "comment thread",
            Self::Member => "member",
            Self::MembershipsLevel => "membership level",
            Self::Playlist => "playlist",
            Self::PlaylistItem => "playlist item",
            Self::SearchResult => "search result",
            Self::Subscription => "subscription",
            Self::Thumbnail => "thumbnail",
            Self::Video => "video",
            Self::VideoAbuseReportReason => "abuse report reason",
            Self::VideoCategory => "video category",
            Self::Watermark => "watermark",
        })
    }
}

/// The `id` of a record: a plain string on most resources, an object on search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Plain(String),
    Typed(TypedId),
}

/// A search result's `id` object, naming which kind of resource matched.
///
/// See: <https://developers.google.com/youtube/v3/docs/search#id>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedId {
    /// e.g. `youtube#channel`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl RecordId {
    /// The canonical ID, whichever shape it came in.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Plain(id) => Some(id),
            Self::Typed(typed) => typed
                .channel_id
                .as_deref()
                .or(typed.playlist_id.as_deref())
                .or(typed.video_id.as_deref()),
        }
    }
}

/// A record that has a display name and a canonical ID.
pub trait Named {
    fn display_name(&self) -> Option<&str>;
    fn resource_id(&self) -> Option<&str>;
}

fn matches(candidate: &str, target: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        candidate.to_lowercase() == target.to_lowercase()
    } else {
        candidate == target
    }
}

/// Returns the ID of the first record in `records` whose display name matches `target_name`.
///
/// `records` is consumed lazily and dropped on the first match, so a paged stream never
/// fetches past the page holding the match. Records without an ID are skipped.
pub async fn resolve_in_pages<S, T>(
    records: S,
    family: ResourceFamily,
    target_name: &str,
    case_insensitive: bool,
) -> Result<String>
where
    S: Stream<Item = Result<T>>,
    T: Named,
{
    let mut records = pin!(records);
    let mut scanned = 0usize;
    while let Some(record) = records.next().await {
        let record = record?;
        scanned += 1;
        let Some(name) = record.display_name() else {
            continue;
        };
        if !matches(name, target_name, case_insensitive) {
            continue;
        }
        if let Some(id) = record.resource_id() {
            tracing::debug!(scanned, id, "resolved name");
            return Ok(id.to_string());
        }
    }

    tracing::debug!(scanned, "no record matched");
    Err(Error::NotFound {
        family,
        name: target_name.to_string(),
    })
}

/// Resolves a channel, playlist or video name to its canonical ID by searching for it.
///
/// Results are scanned in server order, 50 per page; the first title that matches
/// (exactly, or ignoring case when `case_insensitive`) wins. Fails with
/// [`Error::NotFound`] when every page has been scanned without a match, and with
/// [`Error::InvalidArgument`] for families `search.list` cannot return.
#[instrument(skip(session))]
pub async fn resolve_by_name(
    session: &Session,
    family: ResourceFamily,
    target_name: &str,
    case_insensitive: bool,
) -> Result<String> {
    let search_type = family
        .search_type()
        .ok_or(Error::InvalidArgument { name: "family" })?;
    let target_name = require("target_name", target_name)?;

    let query = SearchQuery::new().q(target_name).resource_type(search_type);
    let results = Search::new(session).list_all(&["snippet"], query);
    resolve_in_pages(results, family, target_name, case_insensitive).await
}
