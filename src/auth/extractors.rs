use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::debug;

use crate::auth::session::{SessionClaims, SessionKeys};

/// Extracts session claims from the `Authorization: Bearer` header if a
/// valid token is present. Never rejects: a missing header, a bad scheme or
/// a failed verification all yield `None`, and the handler decides whether
/// the route requires a session.
pub struct MaybeSession(pub Option<SessionClaims>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")));

        let claims = match token {
            Some(t) => match keys.verify(t) {
                Ok(c) => Some(c),
                Err(e) => {
                    debug!(error = %e, "session token rejected");
                    None
                }
            },
            None => None,
        };

        Ok(MaybeSession(claims))
    }
}
