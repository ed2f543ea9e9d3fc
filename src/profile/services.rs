use url::Url;

use crate::error::ApiError;
use crate::profile::dto::UpdateProfileRequest;
use crate::users::{ProfilePatch, User, UserStore};

/// Apply a profile mutation for the resolved session's own user. Only
/// `name` and `image` are writable, always on `session_user.id`; no target
/// id is accepted from the request.
pub async fn update_profile(
    store: &dyn UserStore,
    session_user: &User,
    req: UpdateProfileRequest,
) -> Result<User, ApiError> {
    let patch = validate_patch(req)?;
    let updated = store.update_profile(session_user.id, patch).await?;
    Ok(updated)
}

fn validate_patch(req: UpdateProfileRequest) -> Result<ProfilePatch, ApiError> {
    let name = match req.name {
        Some(raw) => {
            let trimmed = raw.trim().to_string();
            if trimmed.chars().count() < 2 {
                return Err(ApiError::invalid("name must be at least 2 characters"));
            }
            Some(trimmed)
        }
        None => None,
    };

    let image = match req.image {
        Some(raw) => {
            let parsed = Url::parse(&raw)
                .map_err(|_| ApiError::invalid("image must be a valid URL"))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ApiError::invalid("image must be an http(s) URL"));
            }
            Some(raw)
        }
        None => None,
    };

    Ok(ProfilePatch { name, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::MemoryUsers;
    use crate::users::NewUser;

    async fn seeded_store() -> (MemoryUsers, User) {
        let store = MemoryUsers::new();
        let user = store
            .create(NewUser {
                email: "a@example.com".into(),
                name: Some("Before".into()),
                image: None,
                hashed_password: Some("$argon2id$fake".into()),
            })
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn updates_exactly_name_and_image() {
        let (store, user) = seeded_store().await;
        let updated = update_profile(
            &store,
            &user,
            UpdateProfileRequest {
                name: Some("Alice".into()),
                image: Some("https://x/y.png".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name.as_deref(), Some("Alice"));
        assert_eq!(updated.image.as_deref(), Some("https://x/y.png"));
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.hashed_password, user.hashed_password);

        // a fresh read reflects the write
        let read_back = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(read_back.name.as_deref(), Some("Alice"));
        assert_eq!(read_back.image.as_deref(), Some("https://x/y.png"));
    }

    #[tokio::test]
    async fn omitted_fields_keep_their_values() {
        let (store, user) = seeded_store().await;
        let updated = update_profile(
            &store,
            &user,
            UpdateProfileRequest {
                name: None,
                image: Some("https://x/z.png".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Before"));
        assert_eq!(updated.image.as_deref(), Some("https://x/z.png"));
    }

    #[tokio::test]
    async fn short_name_is_invalid() {
        let (store, user) = seeded_store().await;
        let err = update_profile(
            &store,
            &user,
            UpdateProfileRequest {
                name: Some(" a ".into()),
                image: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn non_http_image_url_is_invalid() {
        let (store, user) = seeded_store().await;
        for bad in ["not a url", "ftp://x/y.png", "javascript:alert(1)"] {
            let err = update_profile(
                &store,
                &user,
                UpdateProfileRequest {
                    name: None,
                    image: Some(bad.into()),
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput(_)), "{bad}");
        }
    }
}
