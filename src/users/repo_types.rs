use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. The only persisted entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>, // absent for OAuth-only accounts
    pub created_at: OffsetDateTime,
}

/// Insert payload. `hashed_password` is `None` on the OAuth path.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub hashed_password: Option<String>,
}

/// Mutable slice of the profile. A `None` field is left untouched;
/// email and credentials are not reachable from here.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
