//! Test doubles: a loopback stand-in for the YouTube API and a scripted authorizer.

use crate::config::ScopeSet;
use crate::oauth::Authorizer;
use crate::session::{Session, TimeBoundAccessToken};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicTokenResponse, BasicTokenType};
use oauth2::{AccessToken, EmptyExtraTokenFields, RefreshToken, StandardTokenResponse};
use serde_json::Value;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) fn token_response(
    access: &str,
    refresh: Option<&str>,
    expires_in_secs: u64,
) -> BasicTokenResponse {
    let mut token = StandardTokenResponse::new(
        AccessToken::new(access.to_string()),
        BasicTokenType::Bearer,
        EmptyExtraTokenFields {},
    );
    token.set_refresh_token(refresh.map(|r| RefreshToken::new(r.to_string())));
    token.set_expires_in(Some(&Duration::from_secs(expires_in_secs)));
    token
}

/// An [`Authorizer`] that hands out canned tokens and counts how often it was asked.
#[derive(Debug)]
pub(crate) struct FakeAuthorizer {
    scopes: ScopeSet,
    acquire_to: Option<BasicTokenResponse>,
    refresh_to: Option<BasicTokenResponse>,
    pub(crate) acquisitions: AtomicUsize,
    pub(crate) refreshes: AtomicUsize,
}

impl FakeAuthorizer {
    /// Refuses refreshes and fails interactive authorization.
    pub(crate) fn refusing() -> Self {
        Self {
            scopes: ScopeSet::default(),
            acquire_to: None,
            refresh_to: None,
            acquisitions: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn refreshing_to(token: BasicTokenResponse) -> Self {
        Self {
            refresh_to: Some(token),
            ..Self::refusing()
        }
    }

    pub(crate) fn acquiring(mut self, token: BasicTokenResponse) -> Self {
        self.acquire_to = Some(token);
        self
    }
}

#[async_trait]
impl Authorizer for FakeAuthorizer {
    fn client_id(&self) -> &str {
        "test-client"
    }

    fn scopes(&self) -> &ScopeSet {
        &self.scopes
    }

    async fn acquire_token(&self) -> eyre::Result<BasicTokenResponse> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.acquire_to
            .clone()
            .ok_or_else(|| eyre::eyre!("user abandoned the authorization flow"))
    }

    async fn refresh_token(
        &self,
        _token: BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        // widen the window in which concurrent callers could race a second refresh
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(self.refresh_to.clone())
    }
}

/// One request as seen by [`MockApi`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: http::HeaderMap,
    pub(crate) authorization: Option<String>,
    pub(crate) body: Bytes,
}

impl RecordedRequest {
    pub(crate) fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub(crate) fn json_body(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

/// What [`MockApi`] answers with.
#[derive(Debug, Clone)]
pub(crate) struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl MockResponse {
    pub(crate) fn raw(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    pub(crate) fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub(crate) fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

impl From<(u16, Value)> for MockResponse {
    fn from((status, json): (u16, Value)) -> Self {
        Self::raw(status, "application/json", json.to_string())
    }
}

/// A loopback HTTP server standing in for `https://www.googleapis.com`.
///
/// Every request is recorded, then answered by the handler.
pub(crate) struct MockApi {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    server: tokio::task::JoinHandle<()>,
}

impl MockApi {
    pub(crate) async fn start<F, R>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> R + Send + Sync + 'static,
        R: Into<MockResponse>,
    {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock API");
        let addr = listener.local_addr().expect("mock API address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let recorded = Arc::clone(&requests);
        let server = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let recorded = Arc::clone(&recorded);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<body::Incoming>| {
                        let recorded = Arc::clone(&recorded);
                        let handler = Arc::clone(&handler);
                        async move {
                            let (parts, body) = req.into_parts();
                            let body = body
                                .collect()
                                .await
                                .map(|b| b.to_bytes())
                                .unwrap_or_default();
                            let request = RecordedRequest {
                                method: parts.method.to_string(),
                                path: parts.uri.path().to_string(),
                                query: form_urlencoded::parse(
                                    parts.uri.query().unwrap_or("").as_bytes(),
                                )
                                .into_owned()
                                .collect(),
                                authorization: parts
                                    .headers
                                    .get(http::header::AUTHORIZATION)
                                    .and_then(|v| v.to_str().ok())
                                    .map(str::to_string),
                                headers: parts.headers,
                                body,
                            };
                            recorded.lock().unwrap().push(request.clone());
                            let reply: MockResponse = handler(&request).into();
                            let mut response = Response::builder().status(reply.status);
                            for (name, value) in &reply.headers {
                                response = response.header(name, value);
                            }
                            Ok::<_, Infallible>(
                                response
                                    .body(Full::new(reply.body))
                                    .expect("valid mock response"),
                            )
                        }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(hyper_util::rt::TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self {
            addr,
            requests,
            server,
        }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// A session pointed at this server, holding a token that will not expire during a test.
    pub(crate) fn session(&self) -> Session {
        Session::new(
            TimeBoundAccessToken::new(token_response("test-token", Some("refresh"), 3600)),
            Arc::new(FakeAuthorizer::refusing()),
            reqwest::Client::new(),
        )
        .with_api_base(&self.base_url())
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}
