//! OAuth2 credential providers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::error::AuthError;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens are treated as expired this long before their stated expiry.
const EXPIRY_DELTA_SECS: i64 = 10;

// == Types ==
/// OAuth2 client credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

/// Layout of a Google client-secrets download.
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: Option<OAuth2Config>,
    web: Option<OAuth2Config>,
}

/// Stored OAuth2 token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Token {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl OAuth2Token {
    /// Whether the access token should no longer be used as of `now`.
    ///
    /// A missing expiry, or the zero timestamp written by some token tools,
    /// means the token does not expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) if expiry.year() > 1 => {
                expiry - Duration::seconds(EXPIRY_DELTA_SECS) < now
            }
            _ => false,
        }
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

// == Provider Traits ==
#[async_trait]
pub trait OAuth2ConfigProvider: Send + Sync {
    async fn oauth2_config(&self) -> Result<OAuth2Config, AuthError>;
}

#[async_trait]
pub trait OAuth2TokenProvider: Send + Sync {
    async fn oauth2_token(&self) -> Result<OAuth2Token, AuthError>;
}

// == File Providers ==
/// Reads client credentials from a client-secrets JSON file.
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    file: PathBuf,
}

impl FileConfigProvider {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }
}

#[async_trait]
impl OAuth2ConfigProvider for FileConfigProvider {
    async fn oauth2_config(&self) -> Result<OAuth2Config, AuthError> {
        let body = read_file(&self.file).await?;
        let secrets: ClientSecrets = serde_json::from_str(&body).map_err(|source| {
            AuthError::Parse {
                what: "oauth config file",
                source,
            }
        })?;
        secrets
            .installed
            .or(secrets.web)
            .ok_or(AuthError::MissingClientSection)
    }
}

/// Reads a stored token from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct FileTokenProvider {
    file: PathBuf,
}

impl FileTokenProvider {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }
}

#[async_trait]
impl OAuth2TokenProvider for FileTokenProvider {
    async fn oauth2_token(&self) -> Result<OAuth2Token, AuthError> {
        let body = read_file(&self.file).await?;
        serde_json::from_str(&body).map_err(|source| AuthError::Parse {
            what: "token file",
            source,
        })
    }
}

async fn read_file(path: &Path) -> Result<String, AuthError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AuthError::Io {
            path: path.display().to_string(),
            source,
        })
}

// == Refreshing Provider ==
/// Wraps a stored token and renews it through the token endpoint once expired.
///
/// The renewed token is kept in memory; the stored token is not rewritten.
pub struct RefreshingTokenProvider {
    config: Arc<dyn OAuth2ConfigProvider>,
    stored: Arc<dyn OAuth2TokenProvider>,
    current: Mutex<Option<OAuth2Token>>,
    client: reqwest::Client,
}

impl RefreshingTokenProvider {
    pub fn new(
        config: Arc<dyn OAuth2ConfigProvider>,
        stored: Arc<dyn OAuth2TokenProvider>,
    ) -> Self {
        Self {
            config,
            stored,
            current: Mutex::new(None),
            client: reqwest::Client::new(),
        }
    }

    #[instrument(skip(self, refresh_token), level = "info")]
    async fn refresh(&self, refresh_token: &str) -> Result<OAuth2Token, AuthError> {
        let config = self.config.oauth2_config().await?;

        let response = self
            .client
            .post(&config.token_uri)
            .form(&[
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Refresh(format!("{}: {}", status, text)));
        }

        let resp: TokenResponse = response.json().await?;
        info!("Refreshed OAuth2 access token");

        Ok(OAuth2Token {
            access_token: resp.access_token,
            token_type: resp.token_type,
            refresh_token: resp
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
            expiry: resp
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

#[async_trait]
impl OAuth2TokenProvider for RefreshingTokenProvider {
    async fn oauth2_token(&self) -> Result<OAuth2Token, AuthError> {
        let mut current = self.current.lock().await;
        let now = Utc::now();

        if let Some(token) = current.as_ref() {
            if !token.is_expired(now) {
                return Ok(token.clone());
            }
        }

        let stored = self.stored.oauth2_token().await?;
        if !stored.is_expired(now) {
            *current = Some(stored.clone());
            return Ok(stored);
        }

        let refresh_token = current
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .or(stored.refresh_token)
            .ok_or_else(|| AuthError::Refresh("token expired and no refresh token".to_string()))?;

        debug!("Access token expired, refreshing");
        let token = self.refresh(&refresh_token).await?;
        *current = Some(token.clone());
        Ok(token)
    }
}
