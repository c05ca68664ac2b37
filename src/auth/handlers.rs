use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{info, instrument};

use crate::auth::auth::AuthUser;
use crate::auth::provider::{AuthError, AuthProvider, Credentials, Session};

/// Login with the locally configured credential
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Session created", body = Session),
        (status = 400, description = "Missing username or password", body = Object, example = json!({
            "error": "Username and password must not be empty"
        })),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "error": "Invalid username or password"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(provider, credentials),
    fields(username = %credentials.username)
)]
pub async fn login(
    provider: web::Data<dyn AuthProvider>,
    credentials: web::Json<Credentials>,
) -> impl Responder {
    info!("Login request received");

    match provider.login(&credentials) {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(e @ AuthError::MissingCredentials) => {
            info!("Validation failed: empty username or password");
            HttpResponse::BadRequest().json(json!({ "error": e.to_string() }))
        }
        Err(e @ AuthError::InvalidCredentials) => {
            info!("Invalid credentials");
            HttpResponse::Unauthorized().json(json!({ "error": e.to_string() }))
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })),
    }
}

/// Current session for the presented bearer token
#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Active session", body = Session),
        (status = 401, description = "Missing or invalid token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn session(user: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(user.session)
}
