use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use service::identity::domain::Identity;

use crate::errors::ApiError;
use crate::routes::auth::{ServerAuthConfig, ServerState};

pub const SESSION_COOKIE: &str = "auth_token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// username
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn issue_token(identity: &Identity, cfg: &ServerAuthConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: identity.username.clone(),
        email: identity.email.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(cfg.token_ttl_hours)).timestamp() as usize,
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation).map(|data| data.claims)
}

pub fn session_cookie(token: String, cfg: &ServerAuthConfig) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(cfg.secure_cookies);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// 读取 Authorization: Bearer；缺失时回退到 auth_token Cookie
fn token_from(headers: &HeaderMap, jar: &CookieJar) -> Result<Option<String>, ApiError> {
    if let Some(h) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.is_empty() => Ok(Some(t.to_string())),
            _ => {
                tracing::warn!("invalid Authorization format (expect Bearer)");
                Err(ApiError::unauthorized("invalid authorization header"))
            }
        };
    }
    Ok(jar.get(SESSION_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// Identity of the caller, taken from a valid session token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

#[async_trait]
impl FromRequestParts<ServerState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = token_from(&parts.headers, &jar)?.ok_or_else(|| ApiError::unauthorized("not signed in"))?;
        match decode_token(&token, &state.auth.jwt_secret) {
            Ok(claims) => Ok(AuthUser(Identity { username: claims.sub, email: claims.email })),
            Err(e) => {
                tracing::warn!(path = %parts.uri.path(), err = %e, "token validation failed");
                Err(ApiError::unauthorized("invalid session"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ServerAuthConfig {
        ServerAuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: 1, secure_cookies: false }
    }

    fn bob() -> Identity {
        Identity { username: "bobsmith".into(), email: "bob@x.com".into() }
    }

    #[test]
    fn issued_token_decodes_to_identity() {
        let token = issue_token(&bob(), &cfg()).unwrap();
        let claims = decode_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "bobsmith");
        assert_eq!(claims.email, "bob@x.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wrong_secret_or_expired_is_rejected() {
        let token = issue_token(&bob(), &cfg()).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());

        let expired = issue_token(&bob(), &ServerAuthConfig { token_ttl_hours: -2, ..cfg() }).unwrap();
        assert!(decode_token(&expired, "test-secret").is_err());
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        headers.insert(header::COOKIE, "auth_token=cookie-token".parse().unwrap());
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(token_from(&headers, &jar).unwrap().as_deref(), Some("abc"));

        headers.remove(header::AUTHORIZATION);
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(token_from(&headers, &jar).unwrap().as_deref(), Some("cookie-token"));

        headers.insert(header::AUTHORIZATION, "Basic Zm9vOmJhcg==".parse().unwrap());
        assert!(token_from(&headers, &jar).is_err());
    }

    #[test]
    fn session_cookie_is_http_only() {
        let c = session_cookie("t".into(), &ServerAuthConfig { secure_cookies: true, ..cfg() });
        assert_eq!(c.name(), SESSION_COOKIE);
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.path(), Some("/"));
    }
}
