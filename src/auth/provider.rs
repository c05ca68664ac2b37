use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Credentials {
    #[schema(example = "admin")]
    pub username: String,
    #[schema(example = "admin123")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Session {
    #[schema(example = "admin")]
    pub subject: String,
    pub access_token: String,
    /// Unix timestamp after which the session is no longer valid.
    #[schema(example = 1717000000)]
    pub expires_at: usize,
}

#[derive(Debug, Display, Error)]
pub enum AuthError {
    #[display(fmt = "Username and password must not be empty")]
    MissingCredentials,
    #[display(fmt = "Invalid username or password")]
    InvalidCredentials,
    #[display(fmt = "Authentication backend failure")]
    Internal,
}

/// Seam between the HTTP layer and whatever actually owns credentials.
/// The bundled implementation is a single config-seeded account; a real
/// identity provider slots in behind the same two calls.
pub trait AuthProvider: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Resolve a bearer token to its session, if it is still valid.
    fn current_session(&self, token: &str) -> Option<Session>;
}
