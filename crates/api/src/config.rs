use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;
use crate::auth::totp::OtpConfig;

/// Default per-request upload cap (10 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default minimum password length for sign up and password changes.
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Second-factor settings (issuer, drift, secret encryption key).
    pub otp: OtpConfig,
    /// Directory attachments are written under.
    pub storage_root: PathBuf,
    /// URL prefix attachments are served from.
    pub storage_public_path: String,
    /// Maximum request body size for uploads, in bytes.
    pub max_upload_bytes: usize,
    /// Minimum accepted password length.
    pub min_password_length: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `STORAGE_ROOT`         | `./storage`                |
    /// | `STORAGE_PUBLIC_PATH`  | `/files`                   |
    /// | `MAX_UPLOAD_BYTES`     | `10485760`                 |
    /// | `MIN_PASSWORD_LENGTH`  | `8`                        |
    ///
    /// JWT and second-factor settings are documented on [`JwtConfig::from_env`]
    /// and [`OtpConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let storage_root = PathBuf::from(
            std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage".into()),
        );

        let storage_public_path =
            std::env::var("STORAGE_PUBLIC_PATH").unwrap_or_else(|_| "/files".into());
        assert!(
            storage_public_path.starts_with('/'),
            "STORAGE_PUBLIC_PATH must start with '/'"
        );

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let min_password_length: usize = std::env::var("MIN_PASSWORD_LENGTH")
            .unwrap_or_else(|_| DEFAULT_MIN_PASSWORD_LENGTH.to_string())
            .parse()
            .expect("MIN_PASSWORD_LENGTH must be a valid usize");

        let jwt = JwtConfig::from_env();
        let otp = OtpConfig::from_env(&jwt.secret);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            otp,
            storage_root,
            storage_public_path,
            max_upload_bytes,
            min_password_length,
        }
    }
}
