//! Typed, per-resource clients for the YouTube Data API v3.
//!
//! Build a [`Session`] once with [`authenticate`], then create resource clients bound to
//! it:
//!
//! ```rust,no_run
//! use youtube_api_tools::youtube_api::{ChannelFilter, Channels, PageRequest};
//! use youtube_api_tools::{Config, ResourceFamily, authenticate_from_config, resolve_by_name};
//!
//! # async fn example() -> youtube_api_tools::Result<()> {
//! let session = authenticate_from_config(&Config::from_env()).await?;
//!
//! let mine = Channels::new(&session)
//!     .list(&["id", "snippet"], &ChannelFilter::Mine, &PageRequest::default())
//!     .await?;
//! let cnn = resolve_by_name(&session, ResourceFamily::Channel, "CNN", true).await?;
//! # Ok(())
//! # }
//! ```

use eyre::Context;
use std::path::PathBuf;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod oauth;
pub mod resolve;
pub mod session;
pub mod youtube_api;

#[cfg(test)]
mod testing;

pub use config::{ClientSecrets, Config, ScopeSet};
pub use error::{Error, RemoteError, RemoteErrorDetail, Result, TransportError};
pub use oauth::{
    Authorizer, FileTokenStore, MemoryTokenStore, OAuthManager, StoredToken, TokenStore,
};
pub use resolve::{ResourceFamily, resolve_by_name};
pub use session::{Session, TimeBoundAccessToken};

/// Authenticates with the installed-app OAuth flow, reusing the token at `token_path`.
///
/// - A stored token for the same client and scopes is reused, refreshed first if expired.
/// - If there is no usable token, or refresh fails, the browser is opened for the
///   interactive flow and the resulting token is written to `token_path`.
pub async fn authenticate(
    secrets: ClientSecrets,
    scopes: ScopeSet,
    token_path: impl Into<PathBuf>,
) -> Result<Session> {
    let client = reqwest::Client::builder()
        .build()
        .map_err(TransportError::Http)?;
    authenticate_with(
        Arc::new(OAuthManager::new(secrets, scopes)),
        Arc::new(FileTokenStore::new(token_path)),
        client,
    )
    .await
}

/// Authenticates using the settings in `config` (see [`Config::from_env`]).
pub async fn authenticate_from_config(config: &Config) -> Result<Session> {
    let secrets = ClientSecrets::from_file(&config.client_secrets_path)
        .await
        .map_err(Error::authentication)?;
    let session = authenticate(secrets, config.scopes.clone(), &config.token_path).await?;
    Ok(session.with_api_base(&config.api_base))
}

/// Drives the token lifecycle over any [`Authorizer`] and [`TokenStore`].
///
/// This is what [`authenticate`] runs; use it directly to substitute a non-interactive
/// authorizer or a different token store.
pub async fn authenticate_with(
    authorizer: Arc<dyn Authorizer>,
    store: Arc<dyn TokenStore>,
    client: reqwest::Client,
) -> Result<Session> {
    let stored = store
        .load_token()
        .await
        .context("load stored token")
        .map_err(Error::authentication)?;

    let reusable = match stored {
        Some(stored) if stored.issued_by(authorizer.as_ref()) => Some(stored.token),
        Some(_) => {
            tracing::info!("stored token was issued for another client or scope set, ignoring it");
            None
        }
        None => None,
    };

    let token = match reusable {
        Some(token) if !token.is_expired() => {
            tracing::debug!("reusing stored token");
            token
        }
        Some(mut token) => {
            tracing::info!("stored token expired, refreshing");
            match token.refresh(authorizer.as_ref()).await {
                Ok(true) => {
                    persist(store.as_ref(), authorizer.as_ref(), &token).await?;
                    token
                }
                Ok(false) => {
                    tracing::warn!("token refresh refused, getting new token via full OAuth");
                    acquire(store.as_ref(), authorizer.as_ref()).await?
                }
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "token refresh failed, getting new token via full OAuth");
                    acquire(store.as_ref(), authorizer.as_ref()).await?
                }
            }
        }
        None => acquire(store.as_ref(), authorizer.as_ref()).await?,
    };

    Ok(Session::new(token, authorizer, client).with_token_store(store))
}

async fn acquire(
    store: &dyn TokenStore,
    authorizer: &dyn Authorizer,
) -> Result<TimeBoundAccessToken> {
    let raw_token = authorizer
        .acquire_token()
        .await
        .context("authorize user to YouTube")
        .map_err(Error::authentication)?;
    let token = TimeBoundAccessToken::new(raw_token);
    persist(store, authorizer, &token).await?;
    Ok(token)
}

async fn persist(
    store: &dyn TokenStore,
    authorizer: &dyn Authorizer,
    token: &TimeBoundAccessToken,
) -> Result<()> {
    let stored = StoredToken {
        client_id: authorizer.client_id().to_string(),
        scopes: authorizer.scopes().clone(),
        token: token.clone(),
    };
    store
        .persist_token(&stored)
        .await
        .context("persist token")
        .map_err(Error::authentication)
}
