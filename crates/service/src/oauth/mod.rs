//! External identity providers.
//!
//! A provider turns an authorization `code` from the browser redirect into an
//! [`ExternalProfile`]; what happens next (lookup or first-login provisioning)
//! is [`crate::identity::IdentityService`]'s job.

pub mod google;

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::domain::ExternalProfile;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    /// Provider answered with an error payload (expired code, revoked token...).
    #[error("provider error: {0}")]
    Provider(String),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Short provider name used in routes and logs.
    fn name(&self) -> &'static str;

    /// Where to send the browser; `state` is echoed back on the callback.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange the callback code and fetch the user's profile.
    async fn fetch_profile(&self, code: &str) -> Result<ExternalProfile, OAuthError>;
}
