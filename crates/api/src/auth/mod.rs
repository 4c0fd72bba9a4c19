//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and sign-up password rules.
//! - [`jwt`] -- access, challenge, and refresh tokens.
//! - [`totp`] -- one-time codes for the second factor.
//! - [`secret_box`] -- encryption of second-factor secrets at rest.

pub mod jwt;
pub mod password;
pub mod secret_box;
pub mod totp;
