use axum::{extract::State, routing::patch, Json, Router};
use tracing::instrument;

use crate::{
    auth::{extractors::MaybeSession, resolver::resolve_current_user},
    error::ApiError,
    profile::{dto::UpdateProfileRequest, services},
    state::AppState,
    users::User,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", patch(update_profile))
}

#[instrument(skip(state, session, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let current = resolve_current_user(state.users.as_ref(), session.as_ref())
        .await
        .ok_or(ApiError::Unauthorized)?;
    let updated = services::update_profile(state.users.as_ref(), &current, payload).await?;
    Ok(Json(updated))
}
