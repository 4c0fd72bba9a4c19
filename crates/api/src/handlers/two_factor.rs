//! Handlers for `/auth/two-factor/settings` and the shared code check used
//! by the sign-in step.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use prompthub_core::error::CoreError;
use prompthub_core::validation::FieldErrors;
use prompthub_db::models::user::User;
use prompthub_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use totp_rs::TOTP;

use crate::auth::{secret_box, totp};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnableTwoFactorRequest {
    pub otp_attempt: String,
}

/// Current two-factor state. Enrolment fields are present only while
/// two-factor is disabled.
#[derive(Debug, Serialize)]
pub struct TwoFactorSettings {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_png_base64: Option<String>,
}

impl TwoFactorSettings {
    fn enabled() -> Self {
        Self {
            enabled: true,
            secret: None,
            provisioning_uri: None,
            qr_code_png_base64: None,
        }
    }
}

/// GET /api/v1/auth/two-factor/settings
///
/// Generates and stores a secret on first call so the user can enrol an
/// authenticator app. Later calls return the same secret until it is
/// enabled or disabled.
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<TwoFactorSettings>>> {
    let mut user = load_user(&state, &auth).await?;

    if user.otp_required_for_login {
        return Ok(Json(DataResponse {
            data: TwoFactorSettings::enabled(),
        }));
    }

    if user.otp_secret_ciphertext.is_none() {
        let sealed = secret_box::seal(&state.config.otp.encryption_key, &totp::new_secret())
            .map_err(|e| AppError::InternalError(format!("Secret sealing error: {e}")))?;
        UserRepo::store_otp_secret(&state.pool, user.id, &sealed.ciphertext, &sealed.nonce)
            .await?;
        user.otp_secret_ciphertext = Some(sealed.ciphertext);
        user.otp_secret_nonce = Some(sealed.nonce);
        tracing::info!(user_id = user.id, "Second-factor secret generated");
    }

    let generator = user_totp(&state, &user)?
        .ok_or_else(|| AppError::InternalError("Second-factor secret missing".into()))?;
    let provisioning = totp::provisioning(&generator)
        .map_err(|e| AppError::InternalError(format!("Provisioning error: {e}")))?;

    Ok(Json(DataResponse {
        data: TwoFactorSettings {
            enabled: false,
            secret: Some(provisioning.secret),
            provisioning_uri: Some(provisioning.provisioning_uri),
            qr_code_png_base64: Some(provisioning.qr_code_png_base64),
        },
    }))
}

/// POST /api/v1/auth/two-factor/settings
///
/// Turn two-factor on after the user proves their app produces the current
/// code. No drift is tolerated here.
pub async fn enable(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<EnableTwoFactorRequest>,
) -> AppResult<Json<DataResponse<TwoFactorSettings>>> {
    let user = load_user(&state, &auth).await?;

    if user.otp_required_for_login {
        return Err(AppError::Core(CoreError::Conflict(
            "Two-factor authentication is already enabled".into(),
        )));
    }

    let generator = user_totp(&state, &user)?.ok_or_else(|| {
        AppError::Core(CoreError::Validation(
            "Fetch two-factor settings before enabling".into(),
        ))
    })?;

    if !accept_code(&state, &user, &generator, &input.otp_attempt, 0).await? {
        let mut errors = FieldErrors::new();
        errors.add("otp_attempt", "is invalid");
        return Err(AppError::Core(CoreError::InvalidFields(errors)));
    }

    UserRepo::enable_two_factor(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, "Two-factor enabled");

    Ok(Json(DataResponse {
        data: TwoFactorSettings::enabled(),
    }))
}

/// DELETE /api/v1/auth/two-factor/settings
pub async fn disable(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    UserRepo::disable_two_factor(&state.pool, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, "Two-factor disabled");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_user(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))
}

/// Decrypt the user's stored secret and build a code generator for it.
///
/// Returns `None` when no secret has been generated yet.
pub(crate) fn user_totp(state: &AppState, user: &User) -> AppResult<Option<TOTP>> {
    let (Some(ciphertext), Some(nonce)) = (&user.otp_secret_ciphertext, &user.otp_secret_nonce)
    else {
        return Ok(None);
    };

    let secret = secret_box::open(&state.config.otp.encryption_key, ciphertext, nonce)
        .map_err(|e| AppError::InternalError(format!("Secret opening error: {e}")))?;

    totp::build(secret, &state.config.otp.issuer, &user.email)
        .map(Some)
        .map_err(|e| AppError::InternalError(format!("Code generator error: {e}")))
}

/// Check `code` within `drift_secs` of now and record the matching step so
/// the same code is never accepted twice.
pub(crate) async fn accept_code(
    state: &AppState,
    user: &User,
    generator: &TOTP,
    code: &str,
    drift_secs: u64,
) -> AppResult<bool> {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    let Some(step) = totp::matching_timestep(generator, code, now, drift_secs) else {
        return Ok(false);
    };
    Ok(UserRepo::consume_otp_timestep(&state.pool, user.id, step).await?)
}
