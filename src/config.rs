use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Client credentials for the delegated identity provider. Opaque to us,
/// passed through to the adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Cloudinary cloud name + unsigned upload preset consumed by the browser
/// upload widget.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub google: GoogleConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "tripnest".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "tripnest-users".into()),
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 30),
        };
        let google = GoogleConfig {
            client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_url: std::env::var("GOOGLE_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api/auth/callback/google".into()),
        };
        let uploads = UploadConfig {
            cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            upload_preset: std::env::var("CLOUDINARY_UPLOAD_PRESET").unwrap_or_default(),
        };
        Ok(Self {
            database_url,
            session,
            google,
            uploads,
        })
    }
}
