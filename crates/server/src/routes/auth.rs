use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use service::identity::domain::{ChangePasswordInput, Identity, LoginInput};
use service::identity::repository::IdentityRepository;
use service::identity::{IdentityConfig, IdentityError, IdentityService};
use service::oauth::OAuthProvider;

use crate::errors::{ApiError, SESSION_ERROR_CODE};
use crate::session::{self, AuthUser, SESSION_COOKIE};

pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub secure_cookies: bool,
}

impl From<&configs::AuthConfig> for ServerAuthConfig {
    fn from(cfg: &configs::AuthConfig) -> Self {
        Self { jwt_secret: cfg.jwt_secret.clone(), token_ttl_hours: cfg.token_ttl_hours, secure_cookies: cfg.secure_cookies }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub identity: Arc<IdentityService<dyn IdentityRepository>>,
    pub auth: ServerAuthConfig,
    /// `None` when Google login is not configured.
    pub google: Option<Arc<dyn OAuthProvider>>,
}

impl ServerState {
    pub fn new(
        repo: Arc<dyn IdentityRepository>,
        identity: IdentityConfig,
        auth: ServerAuthConfig,
        google: Option<Arc<dyn OAuthProvider>>,
    ) -> Self {
        Self { identity: Arc::new(IdentityService::new(repo, identity)), auth, google }
    }
}

#[derive(Serialize, Deserialize)]
pub struct SessionOutput {
    pub username: String,
    pub email: String,
    pub token: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn start_session(jar: CookieJar, identity: &Identity, cfg: &ServerAuthConfig) -> Result<(CookieJar, String), ApiError> {
    let token = session::issue_token(identity, cfg).map_err(|e| {
        tracing::error!(err = %e, "token generation failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, SESSION_ERROR_CODE, "token generation failed")
    })?;
    Ok((jar.add(session::session_cookie(token.clone(), cfg)), token))
}

fn google_disabled() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, IdentityError::NotFound.code(), "google login disabled")
}

fn random_state() -> String {
    rand::rngs::OsRng.sample_iter(&Alphanumeric).take(32).map(char::from).collect()
}

fn expired(name: &'static str, path: &'static str) -> Cookie<'static> {
    let mut c = Cookie::from(name);
    c.set_path(path);
    c
}

/// Redirect the browser to Google; the state is kept in a short-lived cookie.
pub async fn google_start(State(state): State<ServerState>, jar: CookieJar) -> Result<(CookieJar, Redirect), ApiError> {
    let provider = state.google.as_ref().ok_or_else(google_disabled)?;
    let csrf = random_state();
    let mut cookie = Cookie::new(OAUTH_STATE_COOKIE, csrf.clone());
    cookie.set_path("/auth/google");
    cookie.set_http_only(true);
    cookie.set_secure(state.auth.secure_cookies);
    cookie.set_same_site(SameSite::Lax);
    Ok((jar.add(cookie), Redirect::to(&provider.authorization_url(&csrf))))
}

/// Google redirect target: verify state, fetch the profile, provision, open a session.
pub async fn google_callback(
    State(state): State<ServerState>,
    jar: CookieJar,
    Query(q): Query<CallbackQuery>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let provider = state.google.as_ref().ok_or_else(google_disabled)?;

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(expired(OAUTH_STATE_COOKIE, "/auth/google"));
    match (expected.as_deref(), q.state.as_deref()) {
        (Some(want), Some(got)) if !want.is_empty() && want == got => {}
        _ => {
            warn!(provider = provider.name(), "oauth state mismatch");
            return Err(ApiError::bad_request("invalid oauth state"));
        }
    }
    if let Some(err) = q.error.as_deref() {
        warn!(provider = provider.name(), %err, "provider denied authorization");
        return Err(ApiError::unauthorized("authorization denied"));
    }
    let code = q.code.as_deref().filter(|c| !c.is_empty()).ok_or_else(|| ApiError::bad_request("missing code"))?;

    let profile = provider.fetch_profile(code).await?;
    let identity = match state.identity.provision(&profile).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(provider = provider.name(), code = e.code(), error = %e, "oauth login denied");
            return Err(ApiError::login_denied(&e));
        }
    };
    let (jar, _token) = start_session(jar, &identity, &state.auth)?;
    info!(provider = provider.name(), username = %identity.username, "oauth_login");
    Ok((jar, Redirect::to("/")))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In", body = crate::openapi::SessionResponse), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> Result<(CookieJar, Json<SessionOutput>), ApiError> {
    let identity = state.identity.login(&input).await?;
    let (jar, token) = start_session(jar, &identity, &state.auth)?;
    Ok((jar, Json(SessionOutput { username: identity.username, email: identity.email, token })))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(expired(SESSION_COOKIE, "/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current identity", body = crate::openapi::IdentityResponse), (status = 401, description = "Unauthorized")))]
pub async fn me(AuthUser(identity): AuthUser) -> Json<Identity> {
    Json(identity)
}

#[utoipa::path(post, path = "/auth/password", tag = "auth", request_body = crate::openapi::ChangePasswordRequestDoc, responses((status = 204, description = "Password changed"), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized")))]
pub async fn change_password(
    State(state): State<ServerState>,
    AuthUser(identity): AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .identity
        .change_password(&ChangePasswordInput {
            username: identity.username,
            current_password: input.current_password,
            new_password: input.new_password,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
