//! AES-256-GCM sealing for second-factor secrets stored in the database.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};

/// Nonce length for AES-GCM.
pub const NONCE_BYTES: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum SecretBoxError {
    #[error("nonce must be {NONCE_BYTES} bytes")]
    BadNonce,
    #[error("secret could not be sealed or opened")]
    Cipher,
}

/// A sealed secret and the nonce it was sealed with.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<Sealed, SecretBoxError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = rand::random::<[u8; NONCE_BYTES]>();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| SecretBoxError::Cipher)?;
    Ok(Sealed {
        ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Decrypt a secret sealed by [`seal`]. Fails if the key, nonce, or
/// ciphertext do not match.
pub fn open(key: &[u8; 32], ciphertext: &[u8], nonce: &[u8]) -> Result<Vec<u8>, SecretBoxError> {
    if nonce.len() != NONCE_BYTES {
        return Err(SecretBoxError::BadNonce);
    }
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| SecretBoxError::Cipher)
}
