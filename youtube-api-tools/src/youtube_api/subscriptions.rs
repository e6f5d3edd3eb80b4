//! YouTube Subscriptions API types and functionality.

use crate::error::{Result, require};
use crate::session::Session;
use crate::youtube_api::types::{
    ListResponse, OtherFields, PageRequest, PagedStream, Query, Thumbnails, join_parts,
};
use http::Method;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::instrument;

/// A `subscription` links a subscriber to a channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/subscriptions#resource>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<SubscriptionSnippet>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnippet {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// The subscriber's channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// The channel subscribed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<SubscribedChannel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannel {
    /// `youtube#channel`
    pub kind: String,
    pub channel_id: String,
}

/// Which subscriptions `subscriptions.list` should return. The API requires exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionFilter {
    /// Public subscriptions of this channel.
    ChannelId(String),
    Id(Vec<String>),
    /// The authenticated user's subscriptions.
    Mine,
    /// The authenticated user's newest subscribers, newest first.
    MyRecentSubscribers,
    /// The authenticated user's subscribers, in no particular order.
    MySubscribers,
}

impl SubscriptionFilter {
    fn apply(&self, query: Query) -> Result<Query> {
        Ok(match self {
            Self::ChannelId(channel) => query.set("channelId", require("channelId", channel)?),
            Self::Id(ids) => query.set_ids("id", ids)?,
            Self::Mine => query.set("mine", "true"),
            Self::MyRecentSubscribers => query.set("myRecentSubscribers", "true"),
            Self::MySubscribers => query.set("mySubscribers", "true"),
        })
    }
}

/// Optional narrowing of a subscription listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Only subscriptions to these channels.
    pub for_channel_id: Vec<String>,
    /// `alphabetical`, `relevance` (default) or `unread`.
    pub order: Option<String>,
}

/// Client for the `subscriptions` resource.
#[derive(Debug, Clone, Copy)]
pub struct Subscriptions<'s> {
    session: &'s Session,
}

impl<'s> Subscriptions<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Fetches one page of subscriptions.
    ///
    /// <https://developers.google.com/youtube/v3/docs/subscriptions/list>
    pub async fn list(
        &self,
        parts: &[&str],
        filter: &SubscriptionFilter,
        options: &SubscriptionOptions,
        page: &PageRequest,
    ) -> Result<ListResponse<Subscription>> {
        self.fetch(&join_parts(parts), filter, options, page).await
    }

    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch(
        &self,
        parts: &str,
        filter: &SubscriptionFilter,
        options: &SubscriptionOptions,
        page: &PageRequest,
    ) -> Result<ListResponse<Subscription>> {
        let mut query = filter
            .apply(Query::with_parts(parts)?)?
            .set_opt("order", options.order.clone());
        if !options.for_channel_id.is_empty() {
            query = query.set_ids("forChannelId", &options.for_channel_id)?;
        }
        let subscriptions: ListResponse<Subscription> = self
            .session
            .call(Method::GET, "subscriptions", &query.page(page), None::<&()>)
            .await?;
        tracing::debug!(
            total_results = subscriptions.total_results(),
            returned_items = subscriptions.items.len(),
            "fetched subscriptions"
        );
        Ok(subscriptions)
    }

    /// Returns a paginated stream over every matching subscription.
    pub fn list_all(
        self,
        parts: &[&str],
        filter: SubscriptionFilter,
        options: SubscriptionOptions,
    ) -> impl Stream<Item = Result<Subscription>> + use<'s> {
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

    /// Subscribes the authenticated user to a channel.
    ///
    /// <https://developers.google.com/youtube/v3/docs/subscriptions/insert>
    #[instrument(skip(self))]
    pub async fn insert(&self, channel_id: &str) -> Result<Subscription> {
        let subscription = Subscription {
            snippet: Some(SubscriptionSnippet {
                resource_id: Some(SubscribedChannel {
                    kind: "youtube#channel".to_string(),
                    channel_id: require("channelId", channel_id)?.to_string(),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let query = Query::with_parts("snippet")?;
        let created: Subscription = self
            .session
            .call(Method::POST, "subscriptions", &query, Some(&subscription))
            .await?;
        tracing::info!(subscription_id = created.id, "subscribed");
        Ok(created)
    }

    /// Deletes a subscription. This takes the subscription ID, not the channel ID.
    #[instrument(skip(self))]
    pub async fn delete(&self, subscription_id: &str) -> Result<()> {
        let query = Query::new().set("id", require("id", subscription_id)?);
        self.session
            .call_empty(Method::DELETE, "subscriptions", &query, None::<&()>)
            .await
    }

    /// Whether the authenticated user is subscribed to `channel_id`.
    pub async fn is_subscribed(&self, channel_id: &str) -> Result<bool> {
        let options = SubscriptionOptions {
            for_channel_id: vec![require("forChannelId", channel_id)?.to_string()],
            order: None,
        };
        let response = self
            .list(&["id"], &SubscriptionFilter::Mine, &options, &PageRequest::first(1))
            .await?;
        Ok(!response.items.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockApi, MockResponse};
    use serde_json::json;

    #[tokio::test]
    async fn is_subscribed_checks_for_channel() {
        let api = MockApi::start(|request| match request.query("forChannelId") {
            Some("UCyes") => (200, json!({"items": [{"id": "sub1"}]})),
            _ => (200, json!({"items": []})),
        })
        .await;
        let session = api.session();
        let subscriptions = Subscriptions::new(&session);

        assert!(subscriptions.is_subscribed("UCyes").await.unwrap());
        assert!(!subscriptions.is_subscribed("UCno").await.unwrap());

        let request = &api.requests()[0];
        assert_eq!(request.query("mine"), Some("true"));
        assert_eq!(request.query("maxResults"), Some("1"));
    }

    #[tokio::test]
    async fn insert_and_delete() {
        let api = MockApi::start(|request| match request.method.as_str() {
            "POST" => {
                let mut body = request.json_body();
                body["id"] = json!("sub1");
                MockResponse::from((200, body))
            }
            _ => MockResponse::empty(204),
        })
        .await;
        let session = api.session();
        let subscriptions = Subscriptions::new(&session);

        let created = subscriptions.insert("UC1").await.unwrap();
        subscriptions.delete(&created.id).await.unwrap();

        let requests = api.requests();
        assert_eq!(
            requests[0].json_body(),
            json!({"snippet": {"resourceId": {"kind": "youtube#channel", "channelId": "UC1"}}})
        );
        assert_eq!(requests[1].method, "DELETE");
        assert_eq!(requests[1].query("id"), Some("sub1"));
    }

    #[tokio::test]
    async fn recent_subscribers_filter() {
        let api = MockApi::start(|_| (200, json!({"items": []}))).await;
        let session = api.session();
        Subscriptions::new(&session)
            .list(
                &["subscriberSnippet"],
                &SubscriptionFilter::MyRecentSubscribers,
                &SubscriptionOptions { order: Some("alphabetical".into()), ..Default::default() },
                &PageRequest::default(),
            )
            .await
            .unwrap();
        let request = &api.requests()[0];
        assert_eq!(request.query("myRecentSubscribers"), Some("true"));
        assert_eq!(request.query("order"), Some("alphabetical"));
        assert_eq!(request.query("forChannelId"), None);
    }
}
