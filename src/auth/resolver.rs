use tracing::warn;

use crate::auth::session::SessionClaims;
use crate::users::{User, UserStore};

/// Resolve the caller's session claims to a stored user. Every failure mode
/// — no claims, empty email claim, lookup miss, store error — folds to
/// `None`; callers treat that uniformly as "unauthenticated". Store errors
/// still go to the logs.
pub async fn resolve_current_user(
    store: &dyn UserStore,
    claims: Option<&SessionClaims>,
) -> Option<User> {
    let claims = claims?;
    if claims.email.is_empty() {
        return None;
    }
    match store.find_by_email(&claims.email).await {
        Ok(found) => found,
        Err(e) => {
            warn!(error = %e, "session user lookup failed");
            None
        }
    }
}
