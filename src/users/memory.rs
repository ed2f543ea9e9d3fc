use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::UserStore;
use crate::users::repo_types::{CreateUserError, NewUser, ProfilePatch, User};

/// In-memory `UserStore` used by `AppState::fake()` and the unit tests.
/// Mirrors the Postgres adapter's behavior, including the unique-email
/// constraint.
#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
    // set to simulate a failing backing store
    fail: Mutex<bool>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap() = failing;
    }

    fn check_failing(&self) -> anyhow::Result<()> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.check_failing()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.check_failing()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&id).cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, CreateUserError> {
        self.check_failing()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|u| u.email == new.email) {
            return Err(CreateUserError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            image: new.image,
            hashed_password: new.hashed_password,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> anyhow::Result<User> {
        self.check_failing()?;
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("no user with id {id}"))?;
        if let Some(name) = patch.name {
            user.name = Some(name);
        }
        if let Some(image) = patch.image {
            user.image = Some(image);
        }
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            name: Some("Someone".into()),
            image: None,
            hashed_password: Some("$argon2id$fake".into()),
        }
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let store = MemoryUsers::new();
        let created = store.create(new_user("a@example.com")).await.unwrap();
        let by_email = store
            .find_by_email("a@example.com")
            .await
            .unwrap()
            .expect("found by email");
        assert_eq!(by_email.id, created.id);
        let by_id = store.find_by_id(created.id).await.unwrap().expect("found by id");
        assert_eq!(by_id.email, "a@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let store = MemoryUsers::new();
        store.create(new_user("a@example.com")).await.unwrap();
        let err = store.create(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, CreateUserError::DuplicateEmail));
        // no second record
        assert!(store.find_by_email("a@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn patch_leaves_omitted_fields_alone() {
        let store = MemoryUsers::new();
        let created = store.create(new_user("a@example.com")).await.unwrap();
        let updated = store
            .update_profile(
                created.id,
                ProfilePatch {
                    name: Some("Alice".into()),
                    image: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Alice"));
        assert_eq!(updated.image, created.image);
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.hashed_password, created.hashed_password);
    }
}
