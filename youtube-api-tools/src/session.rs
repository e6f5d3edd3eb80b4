//! The authenticated session shared by every resource client.

use crate::config::DEFAULT_API_BASE;
use crate::error::{Error, RemoteError, Result, TransportError};
use crate::oauth::{Authorizer, StoredToken, TokenStore};
use crate::youtube_api::types::{Media, Query};
use bytes::Bytes;
use eyre::Context;
use http::Method;
use jiff::{SignedDuration, Timestamp};
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// Access tokens are treated as expired this long before they actually expire.
const EXPIRY_SAFETY_BUFFER: SignedDuration = SignedDuration::from_secs(300);

/// Assumed lifetime (minus buffer) for tokens that do not say when they expire.
const DEFAULT_TOKEN_LIFETIME: SignedDuration = SignedDuration::from_secs(3300);

/// An OAuth token together with the moment it stops being usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBoundAccessToken {
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: Timestamp,
}

impl TimeBoundAccessToken {
    /// Creates a token that is already expired, forcing a refresh before first use.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Timestamp::UNIX_EPOCH,
            token,
        }
    }

    /// Creates a token whose expiry is computed from its `expires_in` field.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Self::calculate_token_expiry(&token),
            token,
        }
    }

    pub fn raw_token(&self) -> &BasicTokenResponse {
        &self.token
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Timestamp::now() >= self.expires_at
    }

    /// Refreshes this token through `authorizer`, preserving the refresh token.
    ///
    /// * `Ok(true)` - token was refreshed
    /// * `Ok(false)` - refresh was refused (invalid grant, no refresh token)
    /// * `Err(_)` - network or other error
    pub async fn refresh(&mut self, authorizer: &dyn Authorizer) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        match authorizer
            .refresh_token(self.token.clone())
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google usually omits the refresh token from refresh responses
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                } else {
                    tracing::debug!("new token includes refresh token");
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn calculate_token_expiry(token: &BasicTokenResponse) -> Timestamp {
        let now = Timestamp::now();
        let lifetime = match token.expires_in() {
            Some(expires_in) => SignedDuration::try_from(expires_in)
                .map(|d| d - EXPIRY_SAFETY_BUFFER)
                .unwrap_or(DEFAULT_TOKEN_LIFETIME),
            None => DEFAULT_TOKEN_LIFETIME,
        };
        now.checked_add(lifetime).unwrap_or(now)
    }
}

/// An authenticated handle to the YouTube Data API.
///
/// Cloning is cheap and every clone shares the same token, so a refresh performed
/// through one clone is observed by all of them. The token mutex is held for the
/// duration of a refresh: at most one refresh runs at a time, and requests issued
/// concurrently wait for it and then use the refreshed token.
///
/// Resource clients borrow the session (see [`crate::youtube_api`]); they never own it.
#[derive(Debug, Clone)]
pub struct Session {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    authorizer: Arc<dyn Authorizer>,
    store: Option<Arc<dyn TokenStore>>,
    client: reqwest::Client,
    api_base: Arc<str>,
}

impl Session {
    /// Creates a session over `token`, refreshing it through `authorizer` when it expires.
    pub fn new(
        token: TimeBoundAccessToken,
        authorizer: Arc<dyn Authorizer>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            authorizer,
            store: None,
            client,
            api_base: Arc::from(DEFAULT_API_BASE),
        }
    }

    /// Persists every refreshed token to `store`, and discards it there when refresh fails.
    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sends requests to `base` instead of `https://www.googleapis.com`.
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = Arc::from(base.trim_end_matches('/'));
        self
    }

    /// Returns a clone of the current OAuth token.
    pub async fn token(&self) -> BasicTokenResponse {
        self.token.lock().await.token.clone()
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/youtube/v3/{}", self.api_base, path)
    }

    pub(crate) fn upload_url(&self, path: &str) -> String {
        format!("{}/upload/youtube/v3/{}", self.api_base, path)
    }

    /// Returns a guaranteed-fresh access token, refreshing first if necessary.
    #[instrument(skip(self))]
    pub(crate) async fn fresh_access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;

        if token.is_expired() {
            tracing::debug!("access token expired, attempting refresh");

            let refreshed = token
                .refresh(self.authorizer.as_ref())
                .await
                .map_err(Error::authentication)?;
            if !refreshed {
                tracing::error!("access token refresh failed, session is unusable");
                if let Some(store) = &self.store {
                    store
                        .discard_token()
                        .await
                        .context("discard unrefreshable token")
                        .map_err(Error::authentication)?;
                }
                return Err(Error::authentication(eyre::eyre!(
                    "unable to refresh expired access token"
                )));
            }
            tracing::debug!("access token successfully refreshed");

            if let Some(store) = &self.store {
                let stored = StoredToken {
                    client_id: self.authorizer.client_id().to_string(),
                    scopes: self.authorizer.scopes().clone(),
                    token: token.clone(),
                };
                store
                    .persist_token(&stored)
                    .await
                    .context("persist refreshed token")
                    .map_err(Error::authentication)?;
            }
        }

        Ok(token.token.access_token().secret().to_string())
    }

    /// Makes an authenticated HTTP request with the shared error mapping.
    ///
    /// - 4xx responses become [`Error::Request`] carrying the remote error payload
    /// - 5xx responses and network failures become [`Error::Transport`]
    ///
    /// Nothing is retried.
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    pub(crate) async fn make_authenticated_request(
        &self,
        method: Method,
        url: &str,
        query: &Query,
        json_body: Option<&(impl Serialize + Sync)>,
    ) -> Result<reqwest::Response> {
        let access_token = self.fresh_access_token().await?;

        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(access_token)
            .query(query);

        if let Some(body) = json_body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(TransportError::Http)?;
        Self::check_status(method, url, response).await
    }

    async fn check_status(
        method: Method,
        url: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.map_err(TransportError::Http)?;
        if status.is_client_error() {
            let error = RemoteError::from_body(status.as_u16(), &body);
            tracing::debug!(%method, url, %error, "YouTube API rejected request");
            return Err(Error::Request {
                method,
                url: url.to_string(),
                error,
            });
        }

        tracing::debug!(%method, url, %status, "YouTube API request failed");
        Err(TransportError::Server {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    /// Calls `path` and parses the JSON response.
    pub(crate) async fn call<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        json_body: Option<&(impl Serialize + Sync)>,
    ) -> Result<R> {
        let url = self.api_url(path);
        let response = self
            .make_authenticated_request(method, &url, query, json_body)
            .await?;
        Ok(response.json().await.map_err(TransportError::Http)?)
    }

    /// Calls `path` for an operation that answers with an empty body.
    pub(crate) async fn call_empty(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        json_body: Option<&(impl Serialize + Sync)>,
    ) -> Result<()> {
        let url = self.api_url(path);
        self.make_authenticated_request(method, &url, query, json_body)
            .await?;
        Ok(())
    }

    /// Calls `path` and returns the raw response body.
    pub(crate) async fn download(&self, path: &str, query: &Query) -> Result<Bytes> {
        let url = self.api_url(path);
        let response = self
            .make_authenticated_request(Method::GET, &url, query, None::<&()>)
            .await?;
        Ok(response.bytes().await.map_err(TransportError::Http)?)
    }

    /// Uploads `media` to `path` with a single-body `uploadType=media` request.
    pub(crate) async fn upload_media<R: DeserializeOwned>(
        &self,
        path: &str,
        query: Query,
        media: &Media,
    ) -> Result<R> {
        let url = self.upload_url(path);
        let query = query.set("uploadType", "media");
        let access_token = self.fresh_access_token().await?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .query(&query)
            .header(http::header::CONTENT_TYPE, &media.content_type)
            .body(media.data.clone())
            .send()
            .await
            .map_err(TransportError::Http)?;
        let response = Self::check_status(Method::POST, &url, response).await?;
        Ok(response.json().await.map_err(TransportError::Http)?)
    }

    /// Uploads `metadata` plus `media` to `path` with the resumable upload protocol.
    ///
    /// The session is initiated with the JSON metadata, then the whole media body is
    /// sent in one `PUT` to the URL from the `Location` header.
    pub(crate) async fn upload_resumable<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Query,
        metadata: &(impl Serialize + Sync),
        media: &Media,
    ) -> Result<R> {
        let response = self
            .upload_resumable_raw(method, path, query, metadata, media)
            .await?;
        Ok(response.json().await.map_err(TransportError::Http)?)
    }

    /// Like [`Session::upload_resumable`], for endpoints that answer with an empty body.
    pub(crate) async fn upload_resumable_empty(
        &self,
        method: Method,
        path: &str,
        query: Query,
        metadata: &(impl Serialize + Sync),
        media: &Media,
    ) -> Result<()> {
        self.upload_resumable_raw(method, path, query, metadata, media)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, metadata, media), fields(bytes = media.data.len()))]
    async fn upload_resumable_raw(
        &self,
        method: Method,
        path: &str,
        query: Query,
        metadata: &(impl Serialize + Sync),
        media: &Media,
    ) -> Result<reqwest::Response> {
        let url = self.upload_url(path);
        let query = query.set("uploadType", "resumable");
        let access_token = self.fresh_access_token().await?;
        let response = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&access_token)
            .query(&query)
            .header("X-Upload-Content-Type", &media.content_type)
            .header("X-Upload-Content-Length", media.data.len().to_string())
            .json(metadata)
            .send()
            .await
            .map_err(TransportError::Http)?;
        let response = Self::check_status(method, &url, response).await?;

        let session_url = response
            .headers()
            .get(http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(TransportError::MissingUploadLocation)?
            .to_string();
        tracing::debug!(session_url, "resumable upload session initiated");

        let response = self
            .client
            .put(&session_url)
            .bearer_auth(&access_token)
            .header(http::header::CONTENT_TYPE, &media.content_type)
            .body(media.data.clone())
            .send()
            .await
            .map_err(TransportError::Http)?;
        Self::check_status(Method::PUT, &session_url, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::MemoryTokenStore;
    use crate::testing::{FakeAuthorizer, MockApi, token_response};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    #[test]
    fn new_token_expires_with_buffer() {
        let token = TimeBoundAccessToken::new(token_response("a", Some("r"), 3600));
        let remaining = token.expires_at().duration_since(Timestamp::now());
        assert!(remaining <= SignedDuration::from_secs(3300));
        assert!(remaining > SignedDuration::from_secs(3200));
        assert!(TimeBoundAccessToken::expired(token_response("a", None, 3600)).is_expired());
    }

    #[tokio::test]
    async fn refresh_preserves_refresh_token() {
        let authorizer = FakeAuthorizer::refreshing_to(token_response("new", None, 3600));
        let mut token = TimeBoundAccessToken::expired(token_response("old", Some("keep-me"), 3600));
        assert!(token.refresh(&authorizer).await.unwrap());
        assert_eq!(token.raw_token().access_token().secret(), "new");
        assert_eq!(
            token.raw_token().refresh_token().map(|t| t.secret().as_str()),
            Some("keep-me")
        );
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted_before_request() {
        let api = MockApi::start(|_| (200, json!({"kind": "youtube#channelListResponse", "items": []}))).await;
        let authorizer = Arc::new(FakeAuthorizer::refreshing_to(token_response("fresh", None, 3600)));
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::new(
            TimeBoundAccessToken::expired(token_response("stale", Some("r"), 3600)),
            authorizer.clone(),
            reqwest::Client::new(),
        )
        .with_api_base(&api.base_url())
        .with_token_store(store.clone());

        let _: serde_json::Value = session
            .call(Method::GET, "channels", &Query::new(), None::<&()>)
            .await
            .unwrap();

        assert_eq!(authorizer.refreshes.load(Ordering::SeqCst), 1);
        let requests = api.requests();
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer fresh"));
        let persisted = store.load_token().await.unwrap().unwrap();
        assert_eq!(persisted.token.raw_token().access_token().secret(), "fresh");
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_refresh() {
        let api = MockApi::start(|_| (200, json!({}))).await;
        let authorizer = Arc::new(FakeAuthorizer::refreshing_to(token_response("fresh", None, 3600)));
        let session = Session::new(
            TimeBoundAccessToken::expired(token_response("stale", Some("r"), 3600)),
            authorizer.clone(),
            reqwest::Client::new(),
        )
        .with_api_base(&api.base_url());

        let calls = (0..4).map(|_| {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .call::<serde_json::Value>(Method::GET, "videos", &Query::new(), None::<&()>)
                    .await
            })
        });
        for call in calls {
            call.await.unwrap().unwrap();
        }

        assert_eq!(authorizer.refreshes.load(Ordering::SeqCst), 1);
        assert!(
            api.requests()
                .iter()
                .all(|r| r.authorization.as_deref() == Some("Bearer fresh"))
        );
    }

    #[tokio::test]
    async fn refused_refresh_discards_token_and_fails_authentication() {
        let api = MockApi::start(|_| (200, json!({}))).await;
        let authorizer = Arc::new(FakeAuthorizer::refusing());
        let store = Arc::new(MemoryTokenStore::new());
        store
            .persist_token(&StoredToken {
                client_id: authorizer.client_id().to_string(),
                scopes: authorizer.scopes().clone(),
                token: TimeBoundAccessToken::expired(token_response("stale", Some("r"), 3600)),
            })
            .await
            .unwrap();
        let session = Session::new(
            TimeBoundAccessToken::expired(token_response("stale", Some("r"), 3600)),
            authorizer,
            reqwest::Client::new(),
        )
        .with_api_base(&api.base_url())
        .with_token_store(store.clone());

        let err = session
            .call::<serde_json::Value>(Method::GET, "videos", &Query::new(), None::<&()>)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(store.load_token().await.unwrap().is_none());
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn client_errors_keep_remote_payload() {
        let api = MockApi::start(|_| {
            (
                403,
                json!({"error":{"code":403,"message":"Insufficient Permission","errors":[{"message":"Insufficient Permission","domain":"global","reason":"insufficientPermissions"}],"status":"PERMISSION_DENIED"}}),
            )
        })
        .await;
        let session = api.session();

        let err = session
            .call::<serde_json::Value>(Method::GET, "channels", &Query::new(), None::<&()>)
            .await
            .unwrap_err();
        let Error::Request { method, error, .. } = &err else {
            panic!("expected request error, got {err:?}");
        };
        assert_eq!(*method, Method::GET);
        assert_eq!(error.code, 403);
        assert_eq!(error.reason(), Some("insufficientPermissions"));
        assert_eq!(error.status.as_deref(), Some("PERMISSION_DENIED"));
        assert_eq!(err.remote(), Some(error));
    }

    #[tokio::test]
    async fn server_errors_are_transport_errors() {
        let api = MockApi::start(|_| (503, json!({"error": {"code": 503, "message": "backend"}}))).await;
        let err = api
            .session()
            .call::<serde_json::Value>(Method::GET, "videos", &Query::new(), None::<&()>)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Server { status: 503, .. })
        ));
        assert_eq!(api.requests().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_api_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let session = Session::new(
            TimeBoundAccessToken::new(token_response("a", None, 3600)),
            Arc::new(FakeAuthorizer::refusing()),
            reqwest::Client::new(),
        )
        .with_api_base(&format!("http://{addr}"));
        let err = session
            .call::<serde_json::Value>(Method::GET, "videos", &Query::new(), None::<&()>)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Http(_))));
    }
}
