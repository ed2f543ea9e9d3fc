use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::dto::{LoginRequest, SignupRequest};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::SessionKeys;
use crate::error::ApiError;
use crate::users::{CreateUserError, NewUser, User, UserStore};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Create a credential-based account. Email uniqueness is left to the
/// store's constraint; a duplicate surfaces as `Conflict`.
pub async fn signup(store: &dyn UserStore, req: SignupRequest) -> Result<User, ApiError> {
    let email = req.email.trim().to_lowercase();
    let name = req.name.trim().to_string();

    if email.is_empty() || name.is_empty() || req.password.is_empty() {
        return Err(ApiError::invalid("email, name and password are required"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::invalid("invalid email"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::invalid("password too short"));
    }

    let hash = hash_password(&req.password)?;
    let user = store
        .create(NewUser {
            email,
            name: Some(name),
            image: None,
            hashed_password: Some(hash),
        })
        .await
        .map_err(|e| match e {
            CreateUserError::DuplicateEmail => {
                ApiError::Conflict("email already registered".into())
            }
            CreateUserError::Other(cause) => ApiError::Internal(cause),
        })?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(user)
}

/// Verify credentials and issue a session token. An unknown email, an
/// OAuth-only account and a wrong password all answer the same way.
pub async fn login(
    store: &dyn UserStore,
    keys: &SessionKeys,
    req: LoginRequest,
) -> Result<(String, User), ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::invalid("email and password are required"));
    }

    let user = store
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let Some(stored_hash) = user.hashed_password.as_deref() else {
        warn!(user_id = %user.id, "credential login against oauth-only account");
        return Err(ApiError::Unauthorized);
    };
    if !verify_password(&req.password, stored_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = keys.sign(user.id, &user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok((token, user))
}
