use thiserror::Error;

use models::errors::ModelError;

/// Business errors for identity workflows
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("profile has no usable email address")]
    MissingEmail,
    #[error("validation failed: {0}")]
    Validation(String),
    /// A storage unique constraint rejected the write, typically two first
    /// logins racing. The login should be retried.
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("no free username for '{base}' after {attempts} suffixes")]
    UsernameExhausted { base: String, attempts: u32 },
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl IdentityError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            IdentityError::MissingEmail => 1001,
            IdentityError::Validation(_) => 1002,
            IdentityError::Conflict(_) => 1003,
            IdentityError::UsernameExhausted { .. } => 1004,
            IdentityError::NotFound => 1005,
            IdentityError::Unauthorized => 1006,
            IdentityError::HashError(_) => 1101,
            IdentityError::Repository(_) => 1200,
        }
    }
}

impl From<ModelError> for IdentityError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => IdentityError::Validation(msg),
            ModelError::Conflict(msg) => IdentityError::Conflict(msg),
            ModelError::Db(msg) => IdentityError::Repository(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_keep_their_kind() {
        assert!(matches!(IdentityError::from(ModelError::Conflict("uniq".into())), IdentityError::Conflict(_)));
        assert!(matches!(IdentityError::from(ModelError::Db("down".into())), IdentityError::Repository(_)));
        assert!(matches!(IdentityError::from(ModelError::Validation("bad".into())), IdentityError::Validation(_)));
    }

    #[test]
    fn codes_are_distinct() {
        let all = [
            IdentityError::MissingEmail,
            IdentityError::Validation(String::new()),
            IdentityError::Conflict(String::new()),
            IdentityError::UsernameExhausted { base: "a".into(), attempts: 1 },
            IdentityError::NotFound,
            IdentityError::Unauthorized,
            IdentityError::HashError(String::new()),
            IdentityError::Repository(String::new()),
        ];
        let mut codes: Vec<u16> = all.iter().map(IdentityError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }
}
