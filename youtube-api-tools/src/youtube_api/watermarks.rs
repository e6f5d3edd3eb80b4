//! Channel watermarks: the branding image shown over every video of a channel.

use crate::error::{Result, require};
use crate::session::Session;
use crate::youtube_api::types::{Media, OtherFields, Query};
use http::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// When and where the watermark is shown.
///
/// See: <https://developers.google.com/youtube/v3/docs/watermarks#resource>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvideoBranding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<InvideoTiming>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_channel_id: Option<String>,
    #[serde(flatten)]
    pub other: OtherFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvideoTiming {
    /// `offsetFromStart` or `offsetFromEnd`.
    #[serde(rename = "type")]
    pub timing_type: String,
    /// Milliseconds, as a string.
    pub offset_ms: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<String>,
}

/// Client for the `watermarks` resource.
#[derive(Debug, Clone, Copy)]
pub struct Watermarks<'s> {
    session: &'s Session,
}

impl<'s> Watermarks<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Uploads `image` as the watermark of `channel_id`.
    ///
    /// <https://developers.google.com/youtube/v3/docs/watermarks/set>
    #[instrument(skip(self, branding, image))]
    pub async fn set(
        &self,
        channel_id: &str,
        branding: &InvideoBranding,
        image: &Media,
    ) -> Result<()> {
        let query = Query::new().set("channelId", require("channelId", channel_id)?);
        self.session
            .upload_resumable_empty(Method::POST, "watermarks/set", query, branding, image)
            .await
    }

    /// Removes the watermark of `channel_id`.
    #[instrument(skip(self))]
    pub async fn unset(&self, channel_id: &str) -> Result<()> {
        let query = Query::new().set("channelId", require("channelId", channel_id)?);
        self.session
            .call_empty(Method::POST, "watermarks/unset", &query, None::<&()>)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockApi, MockResponse};

    #[tokio::test]
    async fn unset_posts_channel() {
        let api = MockApi::start(|_| MockResponse::empty(204)).await;
        let session = api.session();
        Watermarks::new(&session).unset("UC1").await.unwrap();
        let request = &api.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/youtube/v3/watermarks/unset");
        assert_eq!(request.query("channelId"), Some("UC1"));
    }

    #[tokio::test]
    async fn set_sends_branding_then_image() {
        let api = MockApi::start(|request| {
            if request.path.starts_with("/upload/") {
                let host = request.header("host").unwrap_or_default().to_string();
                MockResponse::empty(200).with_header("location", &format!("http://{host}/up"))
            } else {
                MockResponse::empty(204)
            }
        })
        .await;
        let session = api.session();
        let branding = InvideoBranding {
            timing: Some(InvideoTiming {
                timing_type: "offsetFromEnd".into(),
                offset_ms: "15000".into(),
                duration_ms: None,
            }),
            ..Default::default()
        };

        Watermarks::new(&session)
            .set("UC1", &branding, &Media::new("image/png", &b"png"[..]))
            .await
            .unwrap();

        let requests = api.requests();
        assert_eq!(requests[0].path, "/upload/youtube/v3/watermarks/set");
        assert_eq!(requests[0].json_body()["timing"]["type"], "offsetFromEnd");
        assert_eq!(requests[0].json_body()["timing"]["offsetMs"], "15000");
        assert_eq!(&requests[1].body[..], b"png");
    }
}
