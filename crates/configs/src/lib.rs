use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: true,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

/// Session and credential settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
    #[serde(default = "default_max_username_attempts")]
    pub max_username_attempts: u32,
    #[serde(default)]
    pub hashing: HashingConfig,
    /// Skip the Argon2id cost floor. Only for local test setups.
    #[serde(default)]
    pub allow_weak_hashing: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            secure_cookies: false,
            min_password_len: default_min_password_len(),
            max_username_attempts: default_max_username_attempts(),
            hashing: HashingConfig::default(),
            allow_weak_hashing: false,
        }
    }
}

fn default_token_ttl_hours() -> i64 { 12 }
fn default_min_password_len() -> usize { 8 }
fn default_max_username_attempts() -> u32 { 100 }

/// Argon2id cost parameters. Every flow that hashes a credential uses these.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    // argon2 crate defaults (OWASP minimum for Argon2id)
    fn default() -> Self {
        Self { memory_kib: 19 * 1024, iterations: 2, parallelism: 1 }
    }
}

/// Google OAuth client registration. Login with Google is disabled unless
/// both `client_id` and `client_secret` are present.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self { client_id: None, client_secret: None, callback_url: default_callback_url() }
    }
}

fn default_callback_url() -> String { "http://127.0.0.1:8080/auth/google/callback".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load_and_validate`] but starts from defaults when no
    /// config file is present, so a bare environment is enough to boot.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server（环境变量优先级高于文件中的空值）
        self.server.normalize_from_env();
        self.server.normalize()?;
        // 归一化 database（支持从环境变量填充 URL）
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.google.normalize_from_env();
        Ok(())
    }
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Some(host) = non_empty_env("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = non_empty_env("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url 为空；请在 config.toml 或环境变量 DATABASE_URL 中提供"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url 必须以 postgresql:// 或 postgres:// 开头"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections 必须 >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections 必须 >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database 超时配置必须为正整数秒"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Some(secret) = non_empty_env("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret 为空；请在 config.toml 或环境变量 JWT_SECRET 中提供"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours 必须 > 0"));
        }
        if self.min_password_len == 0 {
            return Err(anyhow!("auth.min_password_len 必须 >= 1"));
        }
        if self.max_username_attempts == 0 {
            return Err(anyhow!("auth.max_username_attempts 必须 >= 1"));
        }
        if self.allow_weak_hashing {
            self.hashing.validate_params()
        } else {
            self.hashing.validate()
        }
    }
}

impl HashingConfig {
    /// Smallest memory cost in the OWASP Argon2id table (7 MiB with t=5).
    pub const MIN_MEMORY_KIB: u32 = 7 * 1024;
    /// memory_kib * iterations of the cheapest OWASP row; the other rows
    /// (19 MiB/t=2, 12 MiB/t=3, 9 MiB/t=4, 46 MiB/t=1) all sit above it.
    pub const MIN_TOTAL_COST: u64 = 7 * 1024 * 5;

    /// Structural checks plus the OWASP cost floor.
    pub fn validate(&self) -> Result<()> {
        self.validate_params()?;
        if !self.meets_cost_floor() {
            return Err(anyhow!(
                "auth.hashing 强度不足：需要 memory_kib >= {} 且 memory_kib * iterations >= {}（测试环境可设置 auth.allow_weak_hashing = true）",
                Self::MIN_MEMORY_KIB,
                Self::MIN_TOTAL_COST
            ));
        }
        Ok(())
    }

    pub fn meets_cost_floor(&self) -> bool {
        self.memory_kib >= Self::MIN_MEMORY_KIB
            && u64::from(self.memory_kib) * u64::from(self.iterations) >= Self::MIN_TOTAL_COST
    }

    /// Parameters argon2 itself accepts, regardless of cost.
    pub fn validate_params(&self) -> Result<()> {
        if self.iterations == 0 || self.parallelism == 0 {
            return Err(anyhow!("auth.hashing.iterations 与 parallelism 必须 >= 1"));
        }
        // argon2 要求 m_cost >= 8 * p_cost
        if self.memory_kib < 8 * self.parallelism {
            return Err(anyhow!("auth.hashing.memory_kib 必须 >= 8 * parallelism"));
        }
        Ok(())
    }
}

impl GoogleConfig {
    pub fn normalize_from_env(&mut self) {
        if self.client_id.as_deref().map_or(true, |v| v.trim().is_empty()) {
            self.client_id = non_empty_env("GOOGLE_CLIENT_ID");
        }
        if self.client_secret.as_deref().map_or(true, |v| v.trim().is_empty()) {
            self.client_secret = non_empty_env("GOOGLE_CLIENT_SECRET");
        }
        if let Some(url) = non_empty_env("GOOGLE_CALLBACK_URL") {
            self.callback_url = url;
        }
    }

    /// Client id and secret when both are configured and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let id = self.client_id.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        let secret = self.client_secret.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        Some((id, secret))
    }

    pub fn enabled(&self) -> bool {
        self.credentials().is_some()
    }
}
