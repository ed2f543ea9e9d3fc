use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, SessionResponse, SignupRequest},
        extractors::MaybeSession,
        resolver::resolve_current_user,
        services,
        session::SessionKeys,
    },
    error::ApiError,
    state::AppState,
    users::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<User>, ApiError> {
    let user = services::signup(state.users.as_ref(), payload).await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let keys = SessionKeys::from_ref(&state);
    let (token, user) = services::login(state.users.as_ref(), &keys, payload).await?;
    Ok(Json(SessionResponse { token, user }))
}

#[instrument(skip(state, session))]
pub async fn get_me(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<User>, ApiError> {
    let user = resolve_current_user(state.users.as_ref(), session.as_ref())
        .await
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(user))
}
