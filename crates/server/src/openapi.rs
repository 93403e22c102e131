use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct SessionResponse { pub username: String, pub email: String, pub token: String }

#[derive(ToSchema)]
pub struct IdentityResponse { pub username: String, pub email: String }

#[derive(ToSchema)]
pub struct ChangePasswordRequestDoc { pub current_password: String, pub new_password: String }

#[derive(ToSchema)]
pub struct ErrorResponse { pub error: String, pub code: u16 }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::change_password,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            SessionResponse,
            IdentityResponse,
            ChangePasswordRequestDoc,
            ErrorResponse,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_json_endpoints() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = json["paths"].as_object().unwrap();
        for p in ["/health", "/auth/login", "/auth/logout", "/auth/me", "/auth/password"] {
            assert!(paths.contains_key(p), "missing {p}");
        }
        assert!(json["components"]["schemas"]["LoginRequest"].is_object());
    }
}
