//! Custom video thumbnails.

use crate::error::{Result, require};
use crate::session::Session;
use crate::youtube_api::types::{Media, OtherFields, Query, Thumbnails as ThumbnailSizes};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// The response of `thumbnails.set`: the new thumbnail in every generated size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailSetResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub items: Vec<ThumbnailSizes>,
    #[serde(flatten)]
    pub other: OtherFields,
}

/// Client for the `thumbnails` resource.
#[derive(Debug, Clone, Copy)]
pub struct Thumbnails<'s> {
    session: &'s Session,
}

impl<'s> Thumbnails<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Uploads `image` (JPEG or PNG, at most 2 MB) as the thumbnail of `video_id`.
    ///
    /// The channel must be verified to set custom thumbnails.
    ///
    /// <https://developers.google.com/youtube/v3/docs/thumbnails/set>
    #[instrument(skip(self, image), fields(bytes = image.data.len()))]
    pub async fn set(&self, video_id: &str, image: &Media) -> Result<ThumbnailSetResponse> {
        let query = Query::new().set("videoId", require("videoId", video_id)?);
        self.session
            .upload_media("thumbnails/set", query, image)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use serde_json::json;

    #[tokio::test]
    async fn set_uploads_image_body() {
        let api = MockApi::start(|_| {
            (
                200,
                json!({"kind": "youtube#thumbnailSetResponse", "items": [
                    {"default": {"url": "https://i.ytimg.com/vi/v1/default.jpg", "width": 120, "height": 90}}
                ]}),
            )
        })
        .await;
        let session = api.session();
        let png = Media::new("image/png", &b"\x89PNG fake"[..]);

        let response = Thumbnails::new(&session).set("v1", &png).await.unwrap();

        assert_eq!(response.items[0]["default"].width, Some(120));
        let request = &api.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/upload/youtube/v3/thumbnails/set");
        assert_eq!(request.query("videoId"), Some("v1"));
        assert_eq!(request.query("uploadType"), Some("media"));
        assert_eq!(request.header("content-type"), Some("image/png"));
        assert_eq!(&request.body[..], b"\x89PNG fake");
    }
}
