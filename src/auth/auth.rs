use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

use crate::auth::provider::{AuthProvider, Session};

/// The authenticated caller, resolved through the injected [`AuthProvider`].
#[derive(Clone)]
pub struct AuthUser {
    pub session: Session,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // The auth middleware already resolved the session on protected
        // routes; reuse it instead of verifying the token twice.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let provider = match req.app_data::<Data<dyn AuthProvider>>() {
            Some(p) => p,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Auth provider missing",
                )));
            }
        };

        match provider.current_session(token) {
            Some(session) => ready(Ok(AuthUser { session })),
            None => ready(Err(ErrorUnauthorized("Invalid token"))),
        }
    }
}
