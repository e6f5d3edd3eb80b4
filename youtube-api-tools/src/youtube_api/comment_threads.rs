//! YouTube CommentThreads API types and functionality.

use crate::error::{Result, require};
use crate::session::Session;
use crate::youtube_api::comments::{Comment, CommentSnippet};
use crate::youtube_api::types::{
    ListResponse, OtherFields, PageRequest, PagedStream, Query, join_parts,
};
use http::Method;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::instrument;

/// A `commentThread` is a top-level comment plus, optionally, some of its replies.
///
/// See: <https://developers.google.com/youtube/v3/docs/commentThreads#resource>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentThread {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<CommentThreadSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<CommentThreadReplies>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub top_level_comment: Comment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_reply_count: Option<u64>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentThreadReplies {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Which threads `commentThreads.list` should return. The API requires exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentThreadFilter {
    /// Threads on this video.
    VideoId(String),
    /// Threads on this channel and on any of its videos.
    AllThreadsRelatedToChannelId(String),
    Id(Vec<String>),
}

/// Optional ordering and narrowing of a thread listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentThreadOptions {
    /// `time` (default) or `relevance`.
    pub order: Option<String>,
    /// Only threads containing these terms.
    pub search_terms: Option<String>,
    /// `html` (default) or `plainText`.
    pub text_format: Option<String>,
    /// `heldForReview`, `likelySpam` or `published` (default). Owner only.
    pub moderation_status: Option<String>,
}

impl CommentThreadFilter {
    fn apply(&self, query: Query) -> Result<Query> {
        Ok(match self {
            Self::VideoId(video) => query.set("videoId", require("videoId", video)?),
            Self::AllThreadsRelatedToChannelId(channel) => query.set(
                "allThreadsRelatedToChannelId",
                require("allThreadsRelatedToChannelId", channel)?,
            ),
            Self::Id(ids) => query.set_ids("id", ids)?,
        })
    }
}

/// Client for the `commentThreads` resource.
#[derive(Debug, Clone, Copy)]
pub struct CommentThreads<'s> {
    session: &'s Session,
}

impl<'s> CommentThreads<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of comment threads.
    ///
    /// <https://developers.google.com/youtube/v3/docs/commentThreads/list>
    pub async fn list(
        &self,
        parts: &[&str],
        filter: &CommentThreadFilter,
        options: &CommentThreadOptions,
        page: &PageRequest,
    ) -> Result<ListResponse<CommentThread>> {
        self.fetch(&join_parts(parts), filter, options, page).await
    }

    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch(
        &self,
        parts: &str,
        filter: &CommentThreadFilter,
        options: &CommentThreadOptions,
        page: &PageRequest,
    ) -> Result<ListResponse<CommentThread>> {
        let query = filter
            .apply(Query::with_parts(parts)?)?
            .set_opt("order", options.order.clone())
            .set_opt("searchTerms", options.search_terms.clone())
            .set_opt("textFormat", options.text_format.clone())
            .set_opt("moderationStatus", options.moderation_status.clone())
            .page(page);
        let threads: ListResponse<CommentThread> = self
            .session
            .call(Method::GET, "commentThreads", &query, None::<&()>)
            .await?;
        tracing::debug!(returned_items = threads.items.len(), "fetched comment threads");
        Ok(threads)
    }

    /// Returns a paginated stream over every matching thread.
    pub fn list_all(
        self,
        parts: &[&str],
        filter: CommentThreadFilter,
        options: CommentThreadOptions,
    ) -> impl Stream<Item = Result<CommentThread>> + use<'s> {
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

    /// Posts a new top-level comment on a video.
    ///
    /// <https://developers.google.com/youtube/v3/docs/commentThreads/insert>
    #[instrument(skip(self, text))]
    pub async fn insert(&self, video_id: &str, text: &str) -> Result<CommentThread> {
        let thread = CommentThread {
            snippet: Some(CommentThreadSnippet {
                video_id: Some(require("videoId", video_id)?.to_string()),
                top_level_comment: Comment {
                    snippet: Some(CommentSnippet {
                        text_original: Some(require("textOriginal", text)?.to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        let query = Query::with_parts("snippet")?;
        let created: CommentThread = self
            .session
            .call(Method::POST, "commentThreads", &query, Some(&thread))
            .await?;
        tracing::info!(thread_id = created.id, "posted comment");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use serde_json::json;

    #[tokio::test]
    async fn insert_wraps_text_in_top_level_comment() {
        let api = MockApi::start(|request| {
            let mut body = request.json_body();
            body["id"] = json!("t1");
            (200, body)
        })
        .await;
        let session = api.session();
        let thread = CommentThreads::new(&session).insert("v1", "First!").await.unwrap();

        assert_eq!(thread.id, "t1");
        assert_eq!(
            api.requests()[0].json_body(),
            json!({"snippet": {"videoId": "v1", "topLevelComment": {"snippet": {"textOriginal": "First!"}}}})
        );
    }

    #[tokio::test]
    async fn list_for_channel_with_options() {
        let api = MockApi::start(|_| {
            (
                200,
                json!({"items": [{
                    "id": "t1",
                    "snippet": {"videoId": "v1", "totalReplyCount": 1,
                        "topLevelComment": {"id": "c1", "snippet": {"textDisplay": "top"}}},
                    "replies": {"comments": [{"id": "c2", "snippet": {"parentId": "c1"}}]}
                }]}),
            )
        })
        .await;
        let session = api.session();
        let options = CommentThreadOptions {
            order: Some("relevance".into()),
            search_terms: Some("rust".into()),
            ..Default::default()
        };
        let page = CommentThreads::new(&session)
            .list(
                &["snippet", "replies"],
                &CommentThreadFilter::AllThreadsRelatedToChannelId("UC1".into()),
                &options,
                &PageRequest::default(),
            )
            .await
            .unwrap();

        let request = &api.requests()[0];
        assert_eq!(request.query("allThreadsRelatedToChannelId"), Some("UC1"));
        assert_eq!(request.query("order"), Some("relevance"));
        assert_eq!(request.query("searchTerms"), Some("rust"));
        assert_eq!(request.query("textFormat"), None);

        let thread = &page.items[0];
        let snippet = thread.snippet.as_ref().unwrap();
        assert_eq!(snippet.top_level_comment.id, "c1");
        assert_eq!(snippet.total_reply_count, Some(1));
        assert_eq!(thread.replies.as_ref().unwrap().comments[0].id, "c2");
    }
}
