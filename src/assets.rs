use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{
    auth::{extractors::MaybeSession, resolver::resolve_current_user},
    error::ApiError,
    state::AppState,
};

/// Parameters the browser upload widget needs to push an avatar straight to
/// the asset host. Image bytes never transit this backend.
#[derive(Debug, Clone, Serialize)]
pub struct UploadParams {
    pub cloud_name: String,
    pub upload_preset: String,
    pub max_files: u32,
}

/// Delegated image-hosting service. One adapter per deployment; the preset
/// is an opaque string handed through from configuration.
pub trait AssetHost: Send + Sync {
    fn upload_params(&self) -> UploadParams;
}

#[derive(Clone)]
pub struct CloudinaryHost {
    cloud_name: String,
    upload_preset: String,
}

impl CloudinaryHost {
    pub fn new(cloud_name: &str, upload_preset: &str) -> Self {
        Self {
            cloud_name: cloud_name.to_string(),
            upload_preset: upload_preset.to_string(),
        }
    }
}

impl AssetHost for CloudinaryHost {
    fn upload_params(&self) -> UploadParams {
        UploadParams {
            cloud_name: self.cloud_name.clone(),
            upload_preset: self.upload_preset.clone(),
            max_files: 1,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/uploads/params", get(get_upload_params))
}

#[instrument(skip(state, session))]
pub async fn get_upload_params(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<UploadParams>, ApiError> {
    resolve_current_user(state.users.as_ref(), session.as_ref())
        .await
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(state.assets.upload_params()))
}
