//! YouTube Members and MembershipsLevels API types and functionality.
//!
//! Both endpoints are only available to channel owners with memberships enabled, and
//! require the `youtube.channel-memberships.creator` scope.

use crate::error::Result;
use crate::session::Session;
use crate::youtube_api::types::{
    ListResponse, OtherFields, PageRequest, PagedStream, Query, join_parts,
};
use http::Method;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::instrument;

/// A channel member: someone who pays recurring support to the channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/members#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<MemberSnippet>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSnippet {
    /// The channel being supported.
    #[serde(default)]
    pub creator_channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_details: Option<MemberDetails>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetails {
    pub channel_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// Optional narrowing of a member listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberOptions {
    /// `all_current` (default) or `updates` (only members who joined or upgraded since the
    /// previous `updates` listing).
    pub mode: Option<String>,
    /// Only members with access to this membership level.
    pub has_access_to_level: Option<String>,
    /// Only these member channels.
    pub filter_by_member_channel_id: Vec<String>,
}

/// A pricing level of a channel's memberships.
///
/// See: <https://developers.google.com/youtube/v3/docs/membershipsLevels#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipsLevel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub id: String,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// Client for the `members` resource.
#[derive(Debug, Clone, Copy)]
pub struct Members<'s> {
    session: &'s Session,
}

impl<'s> Members<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of members of the authenticated user's channel.
    ///
    /// <https://developers.google.com/youtube/v3/docs/members/list>
    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    pub async fn list(
        &self,
        parts: &[&str],
        options: &MemberOptions,
        page: &PageRequest,
    ) -> Result<ListResponse<Member>> {
        let mut query = Query::with_parts(&join_parts(parts))?
            .set_opt("mode", options.mode.clone())
            .set_opt("hasAccessToLevel", options.has_access_to_level.clone());
        if !options.filter_by_member_channel_id.is_empty() {
            query = query.set_ids(
                "filterByMemberChannelId",
                &options.filter_by_member_channel_id,
            )?;
        }
        let query = query.page(page);
        self.session
            .call(Method::GET, "members", &query, None::<&()>)
            .await
    }

    /// Returns a paginated stream over every member.
    pub fn list_all(
        self,
        parts: &[&str],
        options: MemberOptions,
    ) -> impl Stream<Item = Result<Member>> + use<'s> {
        let parts = join_parts(parts);
        PagedStream::new(move |page_token| {
            let parts = parts.clone();
            let options = options.clone();
            async move {
                let response = self
                    .list(&[parts.as_str()], &options, &PageRequest::from_token(page_token))
                    .await?;
                Ok(response.into_page())
            }
        })
    }
}

/// Client for the `membershipsLevels` resource.
#[derive(Debug, Clone, Copy)]
pub struct MembershipsLevels<'s> {
    session: &'s Session,
}

impl<'s> MembershipsLevels<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Lists the membership levels of the authenticated user's channel.
    ///
    /// <https://developers.google.com/youtube/v3/docs/membershipsLevels/list>
    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    pub async fn list(&self, parts: &[&str]) -> Result<ListResponse<MembershipsLevel>> {
        let query = Query::with_parts(&join_parts(parts))?;
        self.session
            .call(Method::GET, "membershipsLevels", &query, None::<&()>)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use serde_json::json;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn list_all_members_with_filters() {
        let api = MockApi::start(|request| match request.query("pageToken") {
            None => (
                200,
                json!({"items": [{"snippet": {"creatorChannelId": "UCme",
                    "memberDetails": {"channelId": "UCfan", "displayName": "Fan"}}}],
                    "nextPageToken": "2"}),
            ),
            _ => (200, json!({"items": []})),
        })
        .await;
        let session = api.session();
        let options = MemberOptions {
            mode: Some("updates".into()),
            filter_by_member_channel_id: vec!["UCfan".into(), "UCother".into()],
            ..Default::default()
        };
        let members: Vec<Member> = Members::new(&session)
            .list_all(&["snippet"], options)
            .collect::<Result<_>>()
            .await
            .unwrap();

        assert_eq!(members.len(), 1);
        let details = members[0].snippet.as_ref().unwrap().member_details.as_ref().unwrap();
        assert_eq!(details.display_name, "Fan");

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/youtube/v3/members");
        assert_eq!(requests[0].query("mode"), Some("updates"));
        assert_eq!(requests[0].query("filterByMemberChannelId"), Some("UCfan,UCother"));
        assert_eq!(requests[1].query("part"), Some("snippet"));
    }

    #[tokio::test]
    async fn list_levels() {
        let api = MockApi::start(|_| {
            (200, json!({"items": [{"id": "lvl1", "snippet": {"levelDetails": {"displayName": "Gold"}}}]}))
        })
        .await;
        let session = api.session();
        let levels = MembershipsLevels::new(&session).list(&["id", "snippet"]).await.unwrap();
        assert_eq!(levels.items[0].id, "lvl1");
        assert_eq!(levels.items[0].other["snippet"]["levelDetails"]["displayName"], "Gold");
        assert_eq!(api.requests()[0].path, "/youtube/v3/membershipsLevels");
    }
}
