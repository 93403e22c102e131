use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

pub use configs::HashingConfig;

use super::errors::IdentityError;

/// Length of the throwaway secret generated for externally-authenticated users.
pub const PLACEHOLDER_SECRET_LEN: usize = 32;

/// The one credential hasher. Provisioning, login and password change all go
/// through the same instance so every stored hash carries the same cost.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    cfg: HashingConfig,
}

impl CredentialHasher {
    pub fn new(cfg: HashingConfig) -> Self { Self { cfg } }

    pub fn config(&self) -> HashingConfig { self.cfg }

    fn argon2(&self) -> Result<Argon2<'static>, IdentityError> {
        let params = Params::new(self.cfg.memory_kib, self.cfg.iterations, self.cfg.parallelism, None)
            .map_err(|e| IdentityError::HashError(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a secret into a PHC string with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| IdentityError::HashError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
    pub fn verify(&self, secret: &str, stored_hash: &str) -> Result<bool, IdentityError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| IdentityError::HashError(e.to_string()))?;
        // cost parameters are read back from the PHC string
        match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(IdentityError::HashError(e.to_string())),
        }
    }

    /// Random alphanumeric secret from the OS RNG.
    pub fn random_secret() -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(PLACEHOLDER_SECRET_LEN)
            .map(char::from)
            .collect()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self { Self::new(HashingConfig::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> CredentialHasher {
        CredentialHasher::new(HashingConfig { memory_kib: 1024, iterations: 1, parallelism: 1 })
    }

    #[test]
    fn hash_then_verify() {
        let h = fast();
        let hash = h.hash("Passw0rd!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=1024,t=1,p=1"));
        assert!(h.verify("Passw0rd!", &hash).unwrap());
        assert!(!h.verify("passw0rd!", &hash).unwrap());
        assert!(!h.verify("", &hash).unwrap());
    }

    #[test]
    fn same_secret_hashes_differently() {
        let h = fast();
        assert_ne!(h.hash("same").unwrap(), h.hash("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(fast().verify("x", "not-a-phc-string"), Err(IdentityError::HashError(_))));
    }

    #[test]
    fn invalid_params_are_an_error() {
        let h = CredentialHasher::new(HashingConfig { memory_kib: 1, iterations: 1, parallelism: 1 });
        assert!(matches!(h.hash("x"), Err(IdentityError::HashError(_))));
    }

    #[test]
    fn random_secrets_are_alphanumeric_and_distinct() {
        let a = CredentialHasher::random_secret();
        let b = CredentialHasher::random_secret();
        assert_eq!(a.len(), PLACEHOLDER_SECRET_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
