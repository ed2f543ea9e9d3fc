use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::users::repo_types::{CreateUserError, NewUser, ProfilePatch, User};

/// Storage capability for the `users` table. Handlers and services only see
/// this trait; `PgUsers` is the production adapter, `MemoryUsers` backs the
/// tests.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create(&self, new: NewUser) -> Result<User, CreateUserError>;
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> anyhow::Result<User>;
}

#[derive(Clone)]
pub struct PgUsers {
    db: PgPool,
}

impl PgUsers {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str = "id, email, name, image, hashed_password, created_at";

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl UserStore for PgUsers {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Uniqueness of `email` is enforced solely by the table constraint;
    /// no pre-check, a concurrent duplicate surfaces as `DuplicateEmail`.
    async fn create(&self, new: NewUser) -> Result<User, CreateUserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, image, hashed_password)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.image)
        .bind(&new.hashed_password)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CreateUserError::DuplicateEmail
            } else {
                CreateUserError::Other(e.into())
            }
        })?;
        Ok(user)
    }

    /// Touches exactly `name` and `image`; an omitted field keeps its value.
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   image = COALESCE($3, image)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.image)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}
