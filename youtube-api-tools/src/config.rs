//! Credential descriptors, scope sets, and environment configuration.

use eyre::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Production API host. Resource paths live under `/youtube/v3`, uploads under
/// `/upload/youtube/v3`.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The OAuth client an application authenticates as.
///
/// Loaded from the `client_secret.json` file downloaded from the Google Cloud
/// Console. Both the `installed` and `web` layouts are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
enum ClientSecretsFile {
    #[serde(rename = "installed")]
    Installed(ClientSecrets),
    #[serde(rename = "web")]
    Web(ClientSecrets),
}

impl ClientSecrets {
    /// Parses the JSON contents of a `client_secret.json` file.
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(json).context("parse client secrets JSON")?;
        let secrets = match file {
            ClientSecretsFile::Installed(s) | ClientSecretsFile::Web(s) => s,
        };
        if secrets.client_id.trim().is_empty() {
            eyre::bail!("client secrets carry an empty client_id");
        }
        Ok(secrets)
    }

    /// Reads and parses a `client_secret.json` file.
    pub async fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read client secrets from {}", path.display()))?;
        Self::from_json(&json)
    }
}

/// An ordered, duplicate-free set of OAuth scopes.
///
/// The scopes decide which operations later succeed; a call outside the granted
/// scopes comes back as a 403 `insufficientPermissions` request error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(Vec<String>);

impl ScopeSet {
    /// Manage your YouTube account.
    pub const YOUTUBE: &'static str = "https://www.googleapis.com/auth/youtube";
    /// View your YouTube account.
    pub const YOUTUBE_READONLY: &'static str = "https://www.googleapis.com/auth/youtube.readonly";
    /// Manage your YouTube account over SSL; required for captions and comments.
    pub const YOUTUBE_FORCE_SSL: &'static str =
        "https://www.googleapis.com/auth/youtube.force-ssl";
    /// Upload videos.
    pub const YOUTUBE_UPLOAD: &'static str = "https://www.googleapis.com/auth/youtube.upload";
    /// View and manage assets and content on YouTube (content owners).
    pub const YOUTUBE_PARTNER: &'static str = "https://www.googleapis.com/auth/youtubepartner";
    /// List channel members and membership levels.
    pub const CHANNEL_MEMBERSHIPS_CREATOR: &'static str =
        "https://www.googleapis.com/auth/youtube.channel-memberships.creator";

    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Vec::new();
        for scope in scopes {
            let scope = scope.into();
            if !scope.is_empty() && !set.contains(&scope) {
                set.push(scope);
            }
        }
        Self(set)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ScopeSet {
    fn default() -> Self {
        Self::new([Self::YOUTUBE_FORCE_SSL])
    }
}

/// Process configuration, read from the environment by the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_secrets_path: PathBuf,
    pub token_path: PathBuf,
    pub scopes: ScopeSet,
    pub api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_secrets_path: PathBuf::from("client_secret.json"),
            token_path: PathBuf::from("token.json"),
            scopes: ScopeSet::default(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Reads `YOUTUBE_CLIENT_SECRETS`, `YOUTUBE_TOKEN_FILE`, `YOUTUBE_SCOPES`
    /// (whitespace-separated) and `YOUTUBE_API_BASE`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("YOUTUBE_CLIENT_SECRETS") {
            config.client_secrets_path = path.into();
        }
        if let Some(path) = lookup("YOUTUBE_TOKEN_FILE") {
            config.token_path = path.into();
        }
        if let Some(scopes) = lookup("YOUTUBE_SCOPES") {
            let scopes = ScopeSet::new(scopes.split_whitespace());
            if !scopes.is_empty() {
                config.scopes = scopes;
            }
        }
        if let Some(base) = lookup("YOUTUBE_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        config
    }
}
