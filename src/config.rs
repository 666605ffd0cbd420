use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Runtime settings, read from the environment with logged defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl_days: i64,
    pub otp_ttl_minutes: i64,
    pub secure_cookies: bool,
    pub cors_origin: String,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: "sqlite://rambo.db".to_string(),
            session_secret: "dev-session-secret-change-me".to_string(),
            session_ttl_days: 7,
            otp_ttl_minutes: 10,
            secure_cookies: false,
            cors_origin: "http://localhost:3000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            public_base_url: String::new(),
            max_upload_bytes: 10 * 1024 * 1024,
            resend_api_key: None,
            email_from: "Rambo <no-reply@rambo.local>".to_string(),
            seed_demo_data: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let session_secret = match var("SESSION_SECRET").or_else(|_| read_secret("SESSION_SECRET")) {
            Ok(secret) => secret,
            Err(_) => {
                warn!("SESSION_SECRET not set, using development secret");
                defaults.session_secret
            }
        };

        Ok(Self {
            port: try_load("PORT", "8080")?,
            database_url: try_load("DATABASE_URL", &defaults.database_url)?,
            session_secret,
            session_ttl_days: try_load("SESSION_TTL_DAYS", "7")?,
            otp_ttl_minutes: try_load("OTP_TTL_MINUTES", "10")?,
            secure_cookies: try_load("SECURE_COOKIES", "false")?,
            cors_origin: try_load("CORS_ORIGIN", &defaults.cors_origin)?,
            upload_dir: try_load("UPLOAD_DIR", "uploads")?,
            public_base_url: var("PUBLIC_BASE_URL").unwrap_or_default(),
            max_upload_bytes: try_load("MAX_UPLOAD_BYTES", "10485760")?,
            resend_api_key: var("RESEND_API_KEY")
                .or_else(|_| read_secret("RESEND_API_KEY"))
                .ok(),
            email_from: try_load("EMAIL_FROM", &defaults.email_from)?,
            seed_demo_data: try_load("SEED_DEMO_DATA", "false")?,
        })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| ())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value: {e}"))
        .context("Environment misconfigured")
}

fn read_secret(secret_name: &str) -> Result<String, ()> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path).map(|s| s.trim().to_string()).map_err(|_| ())
}
