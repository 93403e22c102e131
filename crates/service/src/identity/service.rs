use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::domain::{
    ChangePasswordInput, ExternalProfile, GradingScale, Identity, LoginInput, NewUser, DEFAULT_COLLEGE_NAME,
    DEFAULT_GRADING_SCALE,
};
use super::errors::IdentityError;
use super::hasher::{CredentialHasher, HashingConfig};
use super::repository::IdentityRepository;
use super::username;

/// Identity service configuration
#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub default_college_name: String,
    pub default_grading_scale: GradingScale,
    /// Suffixed candidates tried after the bare base username.
    pub max_username_attempts: u32,
    pub min_password_len: usize,
    pub hashing: HashingConfig,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            default_college_name: DEFAULT_COLLEGE_NAME.to_string(),
            default_grading_scale: DEFAULT_GRADING_SCALE,
            max_username_attempts: 100,
            min_password_len: 8,
            hashing: HashingConfig::default(),
        }
    }
}

impl IdentityConfig {
    pub fn from_auth(auth: &configs::AuthConfig) -> Self {
        Self {
            max_username_attempts: auth.max_username_attempts,
            min_password_len: auth.min_password_len,
            hashing: auth.hashing,
            ..Default::default()
        }
    }
}

/// Identity business service independent of web framework
pub struct IdentityService<R: IdentityRepository + ?Sized> {
    repo: Arc<R>,
    cfg: IdentityConfig,
    hasher: CredentialHasher,
}

impl<R: IdentityRepository + ?Sized> IdentityService<R> {
    pub fn new(repo: Arc<R>, cfg: IdentityConfig) -> Self {
        let hasher = CredentialHasher::new(cfg.hashing);
        Self { repo, cfg, hasher }
    }

    pub fn hasher(&self) -> &CredentialHasher { &self.hasher }

    /// Resolve an external profile to an internal identity, creating the user
    /// (and the default college) on first login.
    ///
    /// The college lookup-or-create and the username scan are not atomic with
    /// the final insert: a concurrent first login can win the race, in which
    /// case the insert fails with [`IdentityError::Conflict`] and nothing is
    /// rolled back.
    ///
    /// # Examples
    /// ```
    /// use service::identity::{service::{IdentityService, IdentityConfig}, repository::mock::MockIdentityRepository};
    /// use service::identity::domain::ExternalProfile;
    /// use service::identity::hasher::HashingConfig;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockIdentityRepository::default());
    /// let cfg = IdentityConfig { hashing: HashingConfig { memory_kib: 1024, iterations: 1, parallelism: 1 }, ..Default::default() };
    /// let svc = IdentityService::new(repo, cfg);
    /// let id = tokio_test::block_on(svc.provision(&ExternalProfile::new("Bob@X.com", "Bob Smith"))).unwrap();
    /// assert_eq!(id.username, "bobsmith");
    /// assert_eq!(id.email, "bob@x.com");
    /// ```
    #[instrument(skip(self, profile), fields(email = profile.email.as_deref().unwrap_or("")))]
    pub async fn provision(&self, profile: &ExternalProfile) -> Result<Identity, IdentityError> {
        let email = username::normalize_email(profile.email.as_deref()).ok_or(IdentityError::MissingEmail)?;
        let display = username::display_name(profile.display_name.as_deref(), &email);

        let college = self
            .repo
            .ensure_college(&self.cfg.default_college_name, self.cfg.default_grading_scale)
            .await?;

        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!(username = %existing.username, "existing user matched by email");
            return Ok(existing.identity());
        }

        let base = username::base_username(&display, &email);
        let username = self.resolve_username(&base).await?;

        let password_hash = self.hasher.hash(&CredentialHasher::random_secret())?;
        let created = self
            .repo
            .create_user(NewUser { username, email, password_hash, college_id: college.id })
            .await?;
        info!(user_id = %created.id, username = %created.username, college_id = %created.college_id, "user_provisioned");
        Ok(created.identity())
    }

    /// First free name among `base`, `base1`, `base2`, ... with one existence
    /// check per candidate.
    pub async fn resolve_username(&self, base: &str) -> Result<String, IdentityError> {
        for suffix in 0..=self.cfg.max_username_attempts {
            let candidate = username::candidate(base, suffix);
            if self.repo.find_user_by_username(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            debug!(%candidate, "username taken");
        }
        warn!(%base, attempts = self.cfg.max_username_attempts, "username suffixes exhausted");
        Err(IdentityError::UsernameExhausted { base: base.to_string(), attempts: self.cfg.max_username_attempts })
    }

    /// Authenticate with email and password.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: &LoginInput) -> Result<Identity, IdentityError> {
        let email = username::normalize_email(Some(&input.email)).ok_or(IdentityError::Unauthorized)?;
        let user = self.repo.find_user_by_email(&email).await?.ok_or(IdentityError::Unauthorized)?;
        if !self.hasher.verify(&input.password, &user.password_hash)? {
            return Err(IdentityError::Unauthorized);
        }
        Ok(user.identity())
    }

    /// Verify the current password and store a hash of the new one.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn change_password(&self, input: &ChangePasswordInput) -> Result<(), IdentityError> {
        if input.new_password.chars().count() < self.cfg.min_password_len {
            return Err(IdentityError::Validation(format!("password too short (>={})", self.cfg.min_password_len)));
        }
        if input.new_password == input.current_password {
            return Err(IdentityError::Validation("new password must differ from the current one".into()));
        }
        let user = self
            .repo
            .find_user_by_username(&input.username)
            .await?
            .ok_or(IdentityError::NotFound)?;
        if !self.hasher.verify(&input.current_password, &user.password_hash)? {
            return Err(IdentityError::Unauthorized);
        }
        let hash = self.hasher.hash(&input.new_password)?;
        self.repo.update_password(user.id, hash).await?;
        info!(user_id = %user.id, "password_changed");
        Ok(())
    }
}
