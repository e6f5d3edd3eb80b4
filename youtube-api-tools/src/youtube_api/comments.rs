//! YouTube Comments API types and functionality.

use crate::error::{Result, require};
use crate::session::Session;
use crate::youtube_api::types::{
    ListResponse, OtherFields, PageRequest, PagedStream, Query, join_parts,
};
use http::Method;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::instrument;

/// A `comment` resource contains information about a single YouTube comment.
///
/// See: <https://developers.google.com/youtube/v3/docs/comments#resource>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<CommentSnippet>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// See: <https://developers.google.com/youtube/v3/docs/comments#snippet>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    /// The comment text as the author wrote it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_original: Option<String>,
    /// The comment text as displayed, HTML or plain depending on `textFormat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_display: Option<String>,
    /// Set on replies: the comment being replied to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderation_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// Which comments `comments.list` should return. The API requires exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentFilter {
    Id(Vec<String>),
    /// Replies to this top-level comment.
    ParentId(String),
}

impl CommentFilter {
    fn apply(&self, query: Query) -> Result<Query> {
        Ok(match self {
            Self::Id(ids) => query.set_ids("id", ids)?,
            Self::ParentId(parent) => query.set("parentId", require("parentId", parent)?),
        })
    }
}

/// Client for the `comments` resource.
#[derive(Debug, Clone, Copy)]
pub struct Comments<'s> {
    session: &'s Session,
}

impl<'s> Comments<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of comments.
    ///
    /// `text_format` is `html` (the API default) or `plainText`.
    ///
    /// <https://developers.google.com/youtube/v3/docs/comments/list>
    pub async fn list(
        &self,
        parts: &[&str],
        filter: &CommentFilter,
        text_format: Option<&str>,
        page: &PageRequest,
    ) -> Result<ListResponse<Comment>> {
        self.fetch(&join_parts(parts), filter, text_format, page)
            .await
    }

    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch(
        &self,
        parts: &str,
        filter: &CommentFilter,
        text_format: Option<&str>,
        page: &PageRequest,
    ) -> Result<ListResponse<Comment>> {
        let query = filter
            .apply(Query::with_parts(parts)?)?
            .set_opt("textFormat", text_format)
            .page(page);
        let comments: ListResponse<Comment> = self
            .session
            .call(Method::GET, "comments", &query, None::<&()>)
            .await?;
        tracing::debug!(returned_items = comments.items.len(), "fetched comments");
        Ok(comments)
    }

    /// Returns a paginated stream over every matching comment.
    pub fn list_all(
        self,
        parts: &[&str],
        filter: CommentFilter,
        text_format: Option<String>,
    ) -> impl Stream<Item = Result<Comment>> + use<'s> {
        let parts = join_parts(parts);
        PagedStream::new(move |page_token| {
            let parts = parts.clone();
            let filter = filter.clone();
            let text_format = text_format.clone();
            async move {
                let response = self
                    .fetch(
                        &parts,
                        &filter,
                        text_format.as_deref(),
                        &PageRequest::from_token(page_token),
                    )
                    .await?;
                Ok(response.into_page())
            }
        })
    }

    /// Replies to a top-level comment.
    ///
    /// To start a new thread, use [`crate::youtube_api::CommentThreads::insert`].
    ///
    /// <https://developers.google.com/youtube/v3/docs/comments/insert>
    #[instrument(skip(self, text))]
    pub async fn reply(&self, parent_id: &str, text: &str) -> Result<Comment> {
        let comment = Comment {
            snippet: Some(CommentSnippet {
                parent_id: Some(require("parentId", parent_id)?.to_string()),
                text_original: Some(require("textOriginal", text)?.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let query = Query::with_parts("snippet")?;
        self.session
            .call(Method::POST, "comments", &query, Some(&comment))
            .await
    }

    /// Replaces the text of a comment the authenticated user wrote.
    ///
    /// <https://developers.google.com/youtube/v3/docs/comments/update>
    #[instrument(skip(self, text))]
    pub async fn update(&self, comment_id: &str, text: &str) -> Result<Comment> {
        let comment = Comment {
            id: require("id", comment_id)?.to_string(),
            snippet: Some(CommentSnippet {
                text_original: Some(require("textOriginal", text)?.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let query = Query::with_parts("snippet")?;
        self.session
            .call(Method::PUT, "comments", &query, Some(&comment))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, comment_id: &str) -> Result<()> {
        let query = Query::new().set("id", require("id", comment_id)?);
        self.session
            .call_empty(Method::DELETE, "comments", &query, None::<&()>)
            .await
    }

    /// Sets the moderation status of comments on the authenticated user's channel.
    ///
    /// `status` is `heldForReview`, `published` or `rejected`. `ban_author` only applies
    /// together with `rejected`.
    ///
    /// <https://developers.google.com/youtube/v3/docs/comments/setModerationStatus>
    #[instrument(skip(self))]
    pub async fn set_moderation_status(
        &self,
        comment_ids: &[String],
        status: &str,
        ban_author: bool,
    ) -> Result<()> {
        let mut query = Query::new()
            .set_ids("id", comment_ids)?
            .set("moderationStatus", require("moderationStatus", status)?);
        if ban_author {
            query = query.set("banAuthor", "true");
        }
        self.session
            .call_empty(Method::POST, "comments/setModerationStatus", &query, None::<&()>)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{MockApi, MockResponse};
    use serde_json::json;

    #[tokio::test]
    async fn reply_posts_parent_and_text() {
        let api = MockApi::start(|request| {
            let mut body = request.json_body();
            body["id"] = json!("reply-1");
            (200, body)
        })
        .await;
        let session = api.session();

        let reply = Comments::new(&session).reply("top-1", "Agreed").await.unwrap();

        assert_eq!(reply.id, "reply-1");
        let request = &api.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.query("part"), Some("snippet"));
        assert_eq!(
            request.json_body(),
            json!({"snippet": {"parentId": "top-1", "textOriginal": "Agreed"}})
        );
    }

    #[tokio::test]
    async fn update_sends_id_and_text() {
        let api = MockApi::start(|request| (200, request.json_body())).await;
        let session = api.session();
        Comments::new(&session).update("c1", "Edited").await.unwrap();
        assert_eq!(
            api.requests()[0].json_body(),
            json!({"id": "c1", "snippet": {"textOriginal": "Edited"}})
        );
    }

    #[tokio::test]
    async fn moderation_joins_ids_and_bans_only_when_asked() {
        let api = MockApi::start(|_| MockResponse::empty(204)).await;
        let session = api.session();
        let comments = Comments::new(&session);

        comments
            .set_moderation_status(&["a".to_string(), "b".to_string()], "rejected", true)
            .await
            .unwrap();
        comments
            .set_moderation_status(&["c".to_string()], "published", false)
            .await
            .unwrap();

        let requests = api.requests();
        assert_eq!(requests[0].path, "/youtube/v3/comments/setModerationStatus");
        assert_eq!(requests[0].query("id"), Some("a,b"));
        assert_eq!(requests[0].query("banAuthor"), Some("true"));
        assert_eq!(requests[1].query("moderationStatus"), Some("published"));
        assert_eq!(requests[1].query("banAuthor"), None);
    }

    #[tokio::test]
    async fn list_replies_as_plain_text() {
        let api = MockApi::start(|_| {
            (200, json!({"items": [{"id": "r1", "snippet": {"textDisplay": "hi", "parentId": "top", "likeCount": 4}}]}))
        })
        .await;
        let session = api.session();
        let page = Comments::new(&session)
            .list(
                &["snippet"],
                &CommentFilter::ParentId("top".into()),
                Some("plainText"),
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(api.requests()[0].query("parentId"), Some("top"));
        assert_eq!(api.requests()[0].query("textFormat"), Some("plainText"));
        assert_eq!(page.items[0].snippet.as_ref().unwrap().like_count, Some(4));
    }

    #[tokio::test]
    async fn blank_reply_fails_locally() {
        let api = MockApi::start(|_| (200, json!({}))).await;
        let session = api.session();
        let err = Comments::new(&session).reply("top", "   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "textOriginal" }));
        assert!(api.requests().is_empty());
    }
}
