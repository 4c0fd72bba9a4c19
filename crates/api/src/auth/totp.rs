//! Time-based one-time codes (RFC 6238) for the second sign-in factor.
//!
//! Codes are six digits over 30-second steps with SHA-1, which is what
//! authenticator apps expect. Accepted steps are reported back to the caller
//! so it can record them and refuse a replay of the same code.

use sha2::{Digest, Sha256};
use totp_rs::{Algorithm, TOTP};

/// Length of a generated secret in bytes (160 bits).
pub const SECRET_BYTES: usize = 20;

/// Step length in seconds.
pub const STEP_SECS: u64 = 30;

const DIGITS: usize = 6;

const DEFAULT_ISSUER: &str = "PromptHub";
const DEFAULT_DRIFT_SECS: u64 = 60;

/// Second-factor settings.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// Issuer shown in authenticator apps.
    pub issuer: String,
    /// Clock drift tolerated at sign in, in seconds either side of now.
    pub drift_secs: u64,
    /// AES-256 key for secrets at rest.
    pub encryption_key: [u8; 32],
}

impl OtpConfig {
    /// Load second-factor settings from environment variables.
    ///
    /// | Env Var                     | Default        |
    /// |-----------------------------|----------------|
    /// | `OTP_ISSUER`                | `PromptHub`    |
    /// | `OTP_DRIFT_SECS`            | `60`           |
    /// | `OTP_SECRET_ENCRYPTION_KEY` | `JWT_SECRET`   |
    ///
    /// The encryption key is the SHA-256 digest of the configured material.
    pub fn from_env(jwt_secret: &str) -> Self {
        let issuer = std::env::var("OTP_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.into());
        assert!(!issuer.contains(':'), "OTP_ISSUER must not contain ':'");

        let drift_secs: u64 = std::env::var("OTP_DRIFT_SECS")
            .unwrap_or_else(|_| DEFAULT_DRIFT_SECS.to_string())
            .parse()
            .expect("OTP_DRIFT_SECS must be a valid u64");

        let key_material = std::env::var("OTP_SECRET_ENCRYPTION_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| jwt_secret.to_string());

        Self {
            issuer,
            drift_secs,
            encryption_key: derive_key(&key_material),
        }
    }
}

/// Derive a 256-bit key from arbitrary key material.
pub fn derive_key(material: &str) -> [u8; 32] {
    Sha256::digest(material.as_bytes()).into()
}

/// What a user needs to enrol an authenticator app.
#[derive(Debug, Clone)]
pub struct Provisioning {
    pub secret: String,
    pub provisioning_uri: String,
    pub qr_code_png_base64: String,
}

/// A fresh random secret.
pub fn new_secret() -> Vec<u8> {
    rand::random::<[u8; SECRET_BYTES]>().to_vec()
}

/// Build a generator for `secret`, labelled with `account` under `issuer`.
pub fn build(secret: Vec<u8>, issuer: &str, account: &str) -> Result<TOTP, String> {
    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        0,
        STEP_SECS,
        secret,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| e.to_string())
}

/// Base32 secret, otpauth URI, and QR code for enrolment.
pub fn provisioning(totp: &TOTP) -> Result<Provisioning, String> {
    Ok(Provisioning {
        secret: totp.get_secret_base32(),
        provisioning_uri: totp.get_url(),
        qr_code_png_base64: totp.get_qr_base64()?,
    })
}

/// Find the step whose code equals `code`, searching `drift_secs` either
/// side of `now_secs`. Later steps win when several match.
pub fn matching_timestep(totp: &TOTP, code: &str, now_secs: u64, drift_secs: u64) -> Option<i64> {
    let code = code.trim();
    if code.len() != DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let current = now_secs / STEP_SECS;
    let span = drift_secs / STEP_SECS;
    let first = current.saturating_sub(span);

    (first..=current + span)
        .rev()
        .find(|step| totp.generate(step * STEP_SECS) == code)
        .and_then(|step| i64::try_from(step).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn totp() -> TOTP {
        build(vec![7u8; SECRET_BYTES], "PromptHub", "ada@example.com").unwrap()
    }

    #[test]
    fn current_code_matches_current_step() {
        let totp = totp();
        let code = totp.generate(NOW);
        assert_eq!(
            matching_timestep(&totp, &code, NOW, 0),
            Some((NOW / STEP_SECS) as i64)
        );
    }

    #[test]
    fn previous_step_needs_drift() {
        let totp = totp();
        let old = totp.generate(NOW - STEP_SECS);
        assert_eq!(matching_timestep(&totp, &old, NOW, 0), None);
        assert_eq!(
            matching_timestep(&totp, &old, NOW, 60),
            Some((NOW / STEP_SECS - 1) as i64)
        );
    }

    #[test]
    fn code_outside_drift_is_rejected() {
        let totp = totp();
        let stale = totp.generate(NOW - 5 * STEP_SECS);
        assert_eq!(matching_timestep(&totp, &stale, NOW, 60), None);
    }

    #[test]
    fn malformed_codes_are_rejected() {
        let totp = totp();
        assert_eq!(matching_timestep(&totp, "", NOW, 60), None);
        assert_eq!(matching_timestep(&totp, "12ab56", NOW, 60), None);
        assert_eq!(matching_timestep(&totp, "1234567", NOW, 60), None);
    }

    #[test]
    fn provisioning_exposes_uri_and_secret() {
        let p = provisioning(&totp()).unwrap();
        assert!(p.provisioning_uri.starts_with("otpauth://totp/"));
        assert!(p.provisioning_uri.contains("issuer=PromptHub"));
        assert!(!p.secret.is_empty());
        assert!(!p.qr_code_png_base64.is_empty());
    }

    #[test]
    fn new_secrets_differ() {
        assert_eq!(new_secret().len(), SECRET_BYTES);
        assert_ne!(new_secret(), new_secret());
    }
}
