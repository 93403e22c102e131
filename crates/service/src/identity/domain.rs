use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use models::GradingScale;

/// Name of the college every provisioned user is attached to.
pub const DEFAULT_COLLEGE_NAME: &str = "Default College";
pub const DEFAULT_GRADING_SCALE: GradingScale = GradingScale::FourPoint;

/// Profile reported by an external identity provider after a successful login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl ExternalProfile {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self { email: Some(email.into()), display_name: Some(display_name.into()) }
    }

    /// Providers may report several addresses; the first one is used.
    pub fn from_emails<I, S>(emails: I, display_name: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { email: emails.into_iter().next().map(Into::into), display_name }
    }
}

/// What crosses into the session layer: no ids, hashes or tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct College {
    pub id: Uuid,
    pub name: String,
    pub grading_scale: GradingScale,
}

/// Stored user as seen by the identity workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub college_id: Uuid,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity { username: self.username.clone(), email: self.email.clone() }
    }
}

/// Insert payload; `email` is already lower-cased and `password_hash` already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub college_id: Uuid,
}

/// Password login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Password change input; `username` comes from the authenticated session.
#[derive(Debug, Clone)]
pub struct ChangePasswordInput {
    pub username: String,
    pub current_password: String,
    pub new_password: String,
}
