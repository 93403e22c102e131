use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{OAuthError, OAuthProvider};
use crate::identity::domain::ExternalProfile;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Google client registration.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl GoogleOAuthConfig {
    /// `None` when the client id or secret is missing.
    pub fn from_config(cfg: &configs::GoogleConfig) -> Option<Self> {
        let (client_id, client_secret) = cfg.credentials()?;
        Some(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: cfg.callback_url.clone(),
            scopes: vec!["openid".into(), "email".into(), "profile".into()],
        })
    }

    pub fn scopes_string(&self) -> String { self.scopes.join(" ") }
}

#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Userinfo payload; only the fields provisioning reads.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
}

impl GoogleUserInfo {
    /// The email, unless Google reports it as unverified. An absent flag is
    /// accepted.
    pub fn verified_email(&self) -> Option<&str> {
        match self.email_verified {
            Some(false) => None,
            _ => self.email.as_deref(),
        }
    }
}

impl From<GoogleUserInfo> for ExternalProfile {
    // 未验证的邮箱不能用于关联账号
    fn from(info: GoogleUserInfo) -> Self {
        let email = info.verified_email().map(str::to_owned);
        ExternalProfile { email, display_name: info.name }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    config: GoogleOAuthConfig,
    authorize_url: Url,
    http: reqwest::Client,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, OAuthError> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(OAuthError::InvalidConfig("client_id/client_secret cannot be empty".into()));
        }
        Url::parse(&config.redirect_uri)
            .map_err(|e| OAuthError::InvalidConfig(format!("redirect_uri: {e}")))?;
        let authorize_url = Url::parse(GOOGLE_AUTHORIZE_URL).map_err(|e| OAuthError::InvalidConfig(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { config, authorize_url, http })
    }

    pub fn config(&self) -> &GoogleOAuthConfig { &self.config }

    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokenResponse, OAuthError> {
        debug!("exchanging authorization code for tokens");
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        let body = response.text().await?;
        parse_token_response(&body)
    }

    #[instrument(skip(self, access_token))]
    pub async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let response = self.http.get(GOOGLE_USERINFO_URL).bearer_auth(access_token).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Provider(format!("userinfo returned {status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| OAuthError::Parse(format!("userinfo: {e}")))
    }
}

fn parse_token_response(body: &str) -> Result<GoogleTokenResponse, OAuthError> {
    if let Ok(err) = serde_json::from_str::<GoogleErrorResponse>(body) {
        if !err.error.is_empty() {
            return Err(OAuthError::Provider(err.error_description.unwrap_or(err.error)));
        }
    }
    serde_json::from_str(body).map_err(|e| OAuthError::Parse(format!("token response: {e}")))
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn name(&self) -> &'static str { "google" }

    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes_string())
            .append_pair("state", state)
            .append_pair("prompt", "select_account");
        url.to_string()
    }

    async fn fetch_profile(&self, code: &str) -> Result<ExternalProfile, OAuthError> {
        let tokens = self.exchange_code(code).await?;
        let info = self.get_user_info(&tokens.access_token).await?;
        debug!(
            sub = %info.sub,
            has_email = info.email.is_some(),
            email_verified = ?info.email_verified,
            "google profile fetched"
        );
        Ok(info.into())
    }
}
