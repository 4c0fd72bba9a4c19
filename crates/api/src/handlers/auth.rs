//! Handlers for the `/auth` resource (register, login, second factor, refresh, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use prompthub_core::error::CoreError;
use prompthub_core::roles::Role;
use prompthub_core::validation::{self, FieldErrors};
use prompthub_db::models::session::CreateSession;
use prompthub_db::models::user::{CreateUser, User, UserResponse};
use prompthub_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{
    generate_access_token, generate_challenge_token, generate_refresh_token, hash_refresh_token,
    validate_challenge_token,
};
use crate::auth::password::{check_new_password, hash_password, verify_password};
use crate::error::{unique_violation, AppError, AppResult};
use crate::handlers::two_factor::{accept_code, user_totp};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Maximum consecutive failed sign-in attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

const INVALID_CREDENTIALS: &str = "Invalid login or password";
const INVALID_CODE: &str = "Invalid authentication code";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "is invalid"))]
    pub email: String,
    pub password: String,
    pub password_confirmation: Option<String>,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 100, message = "is too long (maximum is 100 characters)"))]
    pub name: Option<String>,
}

/// Request body for `POST /auth/login`. `login` is an email or username.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Request body for `POST /auth/two-factor`.
#[derive(Debug, Deserialize)]
pub struct TwoFactorRequest {
    pub challenge_token: String,
    pub otp_attempt: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Returned instead of tokens when the account requires a second factor.
#[derive(Debug, Serialize)]
pub struct TwoFactorChallenge {
    pub two_factor_required: bool,
    pub challenge_token: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Authenticated(AuthResponse),
    ChallengeIssued(TwoFactorChallenge),
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account with role `user` and sign it in.
pub async fn register(
    State(state): State<AppState>,
    Json(mut input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let email = input.email.trim().to_lowercase();
    // A blank username is the same as none.
    input.username = input
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let mut errors = validation::check(&input);
    check_new_password(
        &mut errors,
        &input.password,
        Some(input.password_confirmation.as_deref().unwrap_or_default()),
        state.config.min_password_length,
    );
    errors.into_result()?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create = CreateUser {
        email,
        username: input.username,
        name: input.name,
        password_hash,
        role: Role::User,
    };

    let user = UserRepo::create(&state.pool, &create)
        .await
        .map_err(taken_fields)?;

    tracing::info!(user_id = user.id, "User registered");

    let response = create_auth_response(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Check email-or-username and password. Returns tokens, or a challenge
/// token when the account has two-factor enabled.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = UserRepo::find_by_login(&state.pool, input.login.trim())
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into())))?;

    ensure_not_locked(&user)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        record_failure(&state, &user).await?;
        return Err(AppError::Core(CoreError::Unauthorized(
            INVALID_CREDENTIALS.into(),
        )));
    }

    if user.otp_required_for_login {
        let challenge_token = generate_challenge_token(user.id, &state.config.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
        tracing::info!(user_id = user.id, "Second factor required");
        return Ok(Json(LoginResponse::ChallengeIssued(TwoFactorChallenge {
            two_factor_required: true,
            challenge_token,
        })));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let response = create_auth_response(&state, &user).await?;
    Ok(Json(LoginResponse::Authenticated(response)))
}

/// POST /api/v1/auth/two-factor
///
/// Complete a sign in by exchanging a challenge token and a one-time code
/// for access and refresh tokens.
pub async fn verify_two_factor(
    State(state): State<AppState>,
    Json(input): Json<TwoFactorRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user_id = validate_challenge_token(&input.challenge_token, &state.config.jwt)
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired challenge".into(),
            ))
        })?;

    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .filter(|u| u.otp_required_for_login)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CODE.into())))?;

    ensure_not_locked(&user)?;

    let totp = user_totp(&state, &user)?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CODE.into())))?;

    let accepted = accept_code(
        &state,
        &user,
        &totp,
        &input.otp_attempt,
        state.config.otp.drift_secs,
    )
    .await?;

    if !accepted {
        record_failure(&state, &user).await?;
        return Err(AppError::Core(CoreError::Unauthorized(INVALID_CODE.into())));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let response = create_auth_response(&state, &user).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_active_by_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    // Rotation: a refresh token is good for one exchange.
    if !SessionRepo::revoke(&state.pool, session.id).await? {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        )));
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    ensure_not_locked(&user)?;

    let response = create_auth_response(&state, &user).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated user. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User signed out");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ensure_not_locked(user: &User) -> AppResult<()> {
    if user.is_locked(Utc::now()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        )));
    }
    Ok(())
}

/// Count a failed attempt and lock the account once the threshold is hit.
async fn record_failure(state: &AppState, user: &User) -> AppResult<()> {
    let count = UserRepo::increment_failed_login(&state.pool, user.id).await?;
    if count >= MAX_FAILED_ATTEMPTS {
        let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
        UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
        tracing::warn!(user_id = user.id, count, "Account locked after failed sign-in attempts");
    }
    Ok(())
}

/// Turn unique violations on user columns into field errors.
pub(crate) fn taken_fields(err: sqlx::Error) -> AppError {
    let field = match unique_violation(&err) {
        Some("uq_users_email") => "email",
        Some("uq_users_username") => "username",
        _ => return AppError::Database(err),
    };
    let mut errors = FieldErrors::new();
    errors.add(field, "has already been taken");
    AppError::Core(CoreError::InvalidFields(errors))
}

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    let session_input = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh_hash,
        expires_at,
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserResponse::from(user),
    })
}
