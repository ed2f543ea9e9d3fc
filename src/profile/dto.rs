use serde::Deserialize;

/// PATCH /profile body. Omitted fields are left unchanged; email and
/// credentials are not part of this surface.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub image: Option<String>,
}
