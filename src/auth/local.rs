use tracing::error;

use crate::auth::jwt::{generate_access_token, verify_token};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::provider::{AuthError, AuthProvider, Credentials, Session};
use crate::config::Config;

/// Single-account provider over the config-seeded credential. The seed
/// password is argon2-hashed at construction and never kept in memory in
/// the clear; sessions are stateless JWTs.
pub struct LocalCredentialProvider {
    username: String,
    password_hash: String,
    jwt_secret: String,
    token_ttl: usize,
}

impl LocalCredentialProvider {
    pub fn new(username: &str, password: &str, jwt_secret: &str, token_ttl: usize) -> Self {
        let password_hash = hash_password(password).expect("Failed to hash seed credential");
        Self {
            username: username.to_string(),
            password_hash,
            jwt_secret: jwt_secret.to_string(),
            token_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.admin_username,
            &config.admin_password,
            &config.jwt_secret,
            config.access_token_ttl,
        )
    }
}

impl AuthProvider for LocalCredentialProvider {
    fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        if credentials.username != self.username {
            return Err(AuthError::InvalidCredentials);
        }

        verify_password(&credentials.password, &self.password_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let (token, claims) = generate_access_token(&self.username, &self.jwt_secret, self.token_ttl)
            .map_err(|e| {
                error!(error = %e, "Failed to mint access token");
                AuthError::Internal
            })?;

        Ok(Session {
            subject: claims.sub,
            access_token: token,
            expires_at: claims.exp,
        })
    }

    fn current_session(&self, token: &str) -> Option<Session> {
        let claims = verify_token(token, &self.jwt_secret).ok()?;
        Some(Session {
            subject: claims.sub,
            access_token: token.to_string(),
            expires_at: claims.exp,
        })
    }
}
