//! JWT access tokens, second-factor challenge tokens, and refresh-token helpers.
//!
//! Access tokens are HS256-signed JWTs containing a [`Claims`] payload.
//! Challenge tokens are short-lived JWTs issued after a correct password when
//! the account requires a second factor; they carry [`ChallengeClaims`] and
//! cannot be used as access tokens. Refresh tokens are opaque random strings;
//! only their SHA-256 hash is stored server-side.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use prompthub_core::roles::Role;
use prompthub_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Purpose marker embedded in challenge tokens.
pub const CHALLENGE_PURPOSE: &str = "otp";

/// Lifetime of a second-factor challenge token.
pub const CHALLENGE_EXPIRY_MINS: i64 = 5;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// The user's role name (`"user"` or `"admin"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

/// Claims for the pending second-factor step.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChallengeClaims {
    pub sub: DbId,
    /// Always [`CHALLENGE_PURPOSE`].
    pub purpose: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        }
    }
}

/// Generate an HS256 access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    role: Role,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    sign(
        &Claims {
            sub: user_id,
            role: role.as_str().to_string(),
            exp: now + config.access_token_expiry_mins * 60,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        },
        config,
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Challenge tokens fail here because they carry no `role` claim.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    verify(token, config)
}

/// Issue a challenge token for a user who passed the password step.
pub fn generate_challenge_token(
    user_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    sign(
        &ChallengeClaims {
            sub: user_id,
            purpose: CHALLENGE_PURPOSE.to_string(),
            exp: now + CHALLENGE_EXPIRY_MINS * 60,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        },
        config,
    )
}

/// Validate a challenge token and return the user id it was issued for.
///
/// Returns `None` for expired, tampered, or non-challenge tokens.
pub fn validate_challenge_token(token: &str, config: &JwtConfig) -> Option<DbId> {
    let claims: ChallengeClaims = verify(token, config).ok()?;
    (claims.purpose == CHALLENGE_PURPOSE).then_some(claims.sub)
}

fn sign<T: Serialize>(claims: &T, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// HS256 with `exp` checked.
fn verify<T: DeserializeOwned>(token: &str, config: &JwtConfig) -> Result<T, jsonwebtoken::errors::Error> {
    decode::<T>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Generate a random refresh token.
///
/// Returns `(plaintext, sha256_hex)`. Only the hash is persisted.
pub fn generate_refresh_token() -> (String, String) {
    let bytes: [u8; 32] = rand::random();
    let plaintext = to_hex(&bytes);
    let hash = hash_refresh_token(&plaintext);
    (plaintext, hash)
}

/// SHA-256 hex digest of a refresh token.
pub fn hash_refresh_token(token: &str) -> String {
    to_hex(&Sha256::digest(token.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
