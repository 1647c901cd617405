//! Environment configuration

use crate::error::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    /// Order events are published when set.
    pub nats_url: Option<String>,
    /// Shared secret the managed auth provider signs bearer tokens with.
    pub jwt_secret: String,
    /// Public base URL, used to build media URLs.
    pub site_url: String,
    pub media_dir: PathBuf,
    /// Back-office address receiving the per-order summary.
    pub admin_email: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let get = |name: &str| {
            env::var(name).map_err(|_| AppError::Config(format!("missing environment variable {name}")))
        };

        let host = get("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = get("PORT").unwrap_or_else(|_| "8080".to_string());
        port.parse::<u16>()
            .map_err(|e| AppError::Config(format!("invalid PORT: {e}")))?;

        Ok(Self {
            bind_addr: format!("{host}:{port}"),
            database_url: get("DATABASE_URL")?,
            nats_url: env::var("NATS_URL").ok(),
            jwt_secret: get("AUTH_JWT_SECRET")?,
            site_url: get("SITE_URL").unwrap_or_else(|_| format!("http://localhost:{port}")),
            media_dir: get("MEDIA_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./media")),
            admin_email: get("ADMIN_EMAIL").unwrap_or_else(|_| "admin@localhost".to_string()),
        })
    }
}
