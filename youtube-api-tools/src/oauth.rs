//! OAuth 2.0 management for YouTube API authentication.
//!
//! Two narrow seams keep host-environment concerns out of the resource clients:
//!
//! - [`Authorizer`] obtains and refreshes tokens. [`OAuthManager`] implements it with the
//!   installed-app flow (browser + loopback redirect listener), but a service-account or
//!   device-flow implementation can be substituted.
//! - [`TokenStore`] loads, persists and discards tokens between process invocations.
//!   [`FileTokenStore`] keeps them in a JSON file, [`MemoryTokenStore`] in memory.

use crate::config::{ClientSecrets, ScopeSet};
use crate::session::TimeBoundAccessToken;
use async_trait::async_trait;
use eyre::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    Scope, TokenResponse, TokenUrl, reqwest,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const OAUTH_DONE_HTML: &str = "<html><body><p>Authorization complete. You can close this window.</p></body></html>";

/// Obtains and refreshes OAuth tokens for one client and scope set.
#[async_trait]
pub trait Authorizer: fmt::Debug + Send + Sync {
    /// The OAuth client the tokens are issued to.
    fn client_id(&self) -> &str;

    /// The scopes every token from this authorizer is requested with.
    fn scopes(&self) -> &ScopeSet;

    /// Runs a full authorization and returns a brand new token.
    async fn acquire_token(&self) -> eyre::Result<BasicTokenResponse>;

    /// Exchanges the refresh token in `token` for a new access token.
    ///
    /// * `Ok(Some(new_token))` - refresh succeeded
    /// * `Ok(None)` - the grant is no longer valid, or there is no refresh token
    /// * `Err(_)` - network or other error
    async fn refresh_token(
        &self,
        token: BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>>;
}

/// A token as persisted between runs.
///
/// The client id and scopes are recorded so that a token issued for one
/// (client, scope set) pair is never reused for another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub client_id: String,
    pub scopes: ScopeSet,
    pub token: TimeBoundAccessToken,
}

impl StoredToken {
    pub(crate) fn issued_by(&self, authorizer: &dyn Authorizer) -> bool {
        self.client_id == authorizer.client_id() && &self.scopes == authorizer.scopes()
    }
}

/// Loads, persists and discards the token of one (client, scope set) pair.
#[async_trait]
pub trait TokenStore: fmt::Debug + Send + Sync {
    async fn load_token(&self) -> eyre::Result<Option<StoredToken>>;

    /// Writes `token`, replacing whatever was stored before.
    async fn persist_token(&self, token: &StoredToken) -> eyre::Result<()>;

    async fn discard_token(&self) -> eyre::Result<()>;
}

/// Keeps the token in a JSON file at a caller-chosen path.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load_token(&self) -> eyre::Result<Option<StoredToken>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read token file {}", self.path.display()));
            }
        };
        match serde_json::from_str(&json) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                // an unreadable token is as good as none; it gets overwritten
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unparseable token file");
                Ok(None)
            }
        }
    }

    async fn persist_token(&self, token: &StoredToken) -> eyre::Result<()> {
        let json = serde_json::to_string_pretty(token).context("serialize token")?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create token directory {}", parent.display()))?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("write token file {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("move token file into place at {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "persisted token");
        Ok(())
    }

    async fn discard_token(&self) -> eyre::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove token file {}", self.path.display())),
        }
    }
}

/// Keeps the token in memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: StoredToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load_token(&self) -> eyre::Result<Option<StoredToken>> {
        Ok(self.token.lock().await.clone())
    }

    async fn persist_token(&self, token: &StoredToken) -> eyre::Result<()> {
        *self.token.lock().await = Some(token.clone());
        Ok(())
    }

    async fn discard_token(&self) -> eyre::Result<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}

/// Manages OAuth 2.0 authentication flows for YouTube API access.
///
/// Holds the client credentials and requested scopes, and runs both the interactive
/// installed-app flow and refresh-token exchanges against the endpoints named in the
/// credential descriptor.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    secrets: ClientSecrets,
    scopes: ScopeSet,
    oauth_done_html: &'static str,
}

impl OAuthManager {
    pub fn new(secrets: ClientSecrets, scopes: ScopeSet) -> Self {
        Self {
            secrets,
            scopes,
            oauth_done_html: OAUTH_DONE_HTML,
        }
    }

    /// Replaces the page shown in the browser once the redirect has been received.
    pub fn with_done_page(mut self, html: &'static str) -> Self {
        self.oauth_done_html = html;
        self
    }

    fn http_client() -> eyre::Result<reqwest::Client> {
        reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")
    }

    fn token_url(&self) -> eyre::Result<TokenUrl> {
        TokenUrl::new(self.secrets.token_uri.clone()).context("parse token endpoint URL")
    }

    /// Performs a complete OAuth 2.0 authorization flow to obtain a new access token.
    ///
    /// 1. Opens the user's browser at the authorization URL for the configured scopes
    /// 2. Receives the authorization callback on a local HTTP listener
    /// 3. Exchanges the authorization code (with PKCE verifier) for a token
    pub async fn authenticate(&self) -> eyre::Result<BasicTokenResponse> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let auth_url =
            AuthUrl::new(self.secrets.auth_uri.clone()).context("parse authorization endpoint URL")?;
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(self.token_url()?)
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf.clone())
            .add_scopes(self.scopes.iter().map(|s| Scope::new(s.to_string())))
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        if let Err(e) = webbrowser::open(auth_url.as_ref()) {
            tracing::warn!(error = %e, "could not open browser; open the logged URL manually");
        }
        let authorization_code = eventually_authorization_code
            .await
            .context("await user authorization code")?;

        let token_result = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&Self::http_client()?)
            .await
            .context("exchange authorization code with access token")?;

        Ok(token_result)
    }

    /// Attempts to refresh an existing OAuth token using its refresh token.
    ///
    /// An `invalid_grant` answer means the user revoked access or the refresh token
    /// expired; that is reported as `Ok(None)` so callers can fall back to
    /// [`Self::authenticate`].
    pub async fn refresh(
        &self,
        token: BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(None);
        };

        tracing::debug!("attempting to refresh OAuth token");

        // no redirect URL needed for refresh
        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_token_uri(self.token_url()?);

        match client
            .exchange_refresh_token(refresh_token)
            .request_async(&Self::http_client()?)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(
                    sr.error(),
                    oauth2::basic::BasicErrorResponseType::InvalidGrant
                ) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }

    /// Sets up a local HTTP server to receive the OAuth authorization callback.
    ///
    /// Binds a random loopback port, validates the CSRF `state` of the first request and
    /// extracts its `code`. Returns the redirect URL to register with the flow and a future
    /// that resolves to the authorization code.
    async fn setup_redirect(
        &self,
        csrf: CsrfToken,
    ) -> eyre::Result<(
        RedirectUrl,
        impl Future<Output = eyre::Result<AuthorizationCode>>,
    )> {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;
        let (tx, rx) = tokio::sync::oneshot::channel();
        let oauth_done = self.oauth_done_html;
        let requested_scopes = self.scopes.clone();
        tokio::spawn(async move {
            let r = async move {
                let (conn, _) = socket.accept().await.context("accept")?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (got, mut gotten) = tokio::sync::mpsc::channel(1);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let got = got.clone();
                    let requested_scopes = requested_scopes.clone();
                    async move {
                        let mut presented_state = None;
                        let mut presented_code = None;
                        // space-separated
                        let mut presented_scope = None;
                        for (k, v) in
                            form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes())
                        {
                            match &*k {
                                "state" => presented_state = Some(v),
                                "code" => presented_code = Some(v),
                                "scope" => presented_scope = Some(v),
                                _ => {}
                            }
                        }
                        if presented_state.as_deref() != Some(csrf.secret().as_str()) {
                            return Err("invalid csrf token");
                        }
                        let Some(code) = presented_code else {
                            return Err("no authorization code found");
                        };
                        if let Some(granted) = presented_scope {
                            let granted: Vec<&str> = granted.split(' ').collect();
                            let missing: Vec<&str> = requested_scopes
                                .iter()
                                .filter(|s| !granted.contains(s))
                                .collect();
                            if !missing.is_empty() {
                                tracing::warn!(?missing, "user did not grant all requested scopes");
                            }
                        }
                        let code = AuthorizationCode::new(code.into_owned());
                        if got.send(code).await.is_err() {
                            return Err("redirect listener already finished");
                        }
                        Ok(Response::new(Full::<Bytes>::from(oauth_done)))
                    }
                });
                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                tokio::select! {
                    exit = &mut serve => {
                        if let Err(e) = exit {
                            Err(e).context("redirect server got bad request")
                        } else {
                            eyre::bail!("redirect server exit prematurely");
                        }
                    }
                    code = gotten.recv() => {
                        serve.as_mut().graceful_shutdown();
                        // let the done page flush before the connection goes away
                        let _ = serve.await;
                        code.ok_or_else(|| eyre::eyre!("redirect handler dropped without a code"))
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            rx.await.context("redirect future dropped prematurely")?
        }))
    }
}

#[async_trait]
impl Authorizer for OAuthManager {
    fn client_id(&self) -> &str {
        &self.secrets.client_id
    }

    fn scopes(&self) -> &ScopeSet {
        &self.scopes
    }

    async fn acquire_token(&self) -> eyre::Result<BasicTokenResponse> {
        self.authenticate().await
    }

    async fn refresh_token(
        &self,
        token: BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        self.refresh(token).await
    }
}
