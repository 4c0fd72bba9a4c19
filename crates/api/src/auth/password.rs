//! Argon2id password hashing, verification, and sign-up rules.
//!
//! Hashes are stored in PHC string format so that algorithm parameters and
//! salt travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use prompthub_core::validation::FieldErrors;

/// Hash a plaintext password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only for malformed hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Check a new password and its confirmation, recording failures under
/// `password` and `password_confirmation`.
pub fn check_new_password(
    errors: &mut FieldErrors,
    password: &str,
    confirmation: Option<&str>,
    min_length: usize,
) {
    if password.is_empty() {
        errors.add("password", "can't be blank");
    } else if password.chars().count() < min_length {
        errors.add(
            "password",
            format!("is too short (minimum is {min_length} characters)"),
        );
    }

    if let Some(confirmation) = confirmation {
        if confirmation != password {
            errors.add("password_confirmation", "doesn't match Password");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct-horse-battery-staple").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse-battery-staple", &hash).unwrap());
    }

    #[test]
    fn wrong_password_fails() {
        let hash = hash_password("real-password").unwrap();
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn short_password_and_mismatch_reported_together() {
        let mut errors = FieldErrors::new();
        check_new_password(&mut errors, "short", Some("shorter"), 8);
        assert!(errors.has_field("password"));
        assert!(errors.has_field("password_confirmation"));
        assert_eq!(
            errors.full_messages()[0],
            "password is too short (minimum is 8 characters)"
        );
    }

    #[test]
    fn password_at_minimum_passes() {
        let mut errors = FieldErrors::new();
        check_new_password(&mut errors, "eightchr", Some("eightchr"), 8);
        assert!(errors.is_empty());
    }

    #[test]
    fn missing_confirmation_is_not_checked() {
        let mut errors = FieldErrors::new();
        check_new_password(&mut errors, "long-enough", None, 8);
        assert!(errors.is_empty());
    }
}
