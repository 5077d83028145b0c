//! AES-256-GCM authenticated encryption under a passphrase.
//!
//! Each call to `encrypt` derives the key from the passphrase, generates a
//! fresh random 12-byte nonce and prepends it to the ciphertext.  `decrypt`
//! splits the nonce back out before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! No associated data is bound into the tag.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use super::kdf::derive_key;
use super::keys::CipherKey;
use crate::errors::{KriptoError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under the key derived from `passphrase`.
pub fn encrypt(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let key = derive_key(passphrase);
    encrypt_with_key(&key, plaintext)
}

/// Decrypt data that was produced by [`encrypt`] with the same passphrase.
///
/// Fails with [`KriptoError::DecryptionFailed`] on a wrong passphrase,
/// truncated input, or any modified byte.
pub fn decrypt(ciphertext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let key = derive_key(passphrase);
    decrypt_with_key(&key, ciphertext)
}

/// Encrypt with an already-derived key.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn encrypt_with_key(key: &CipherKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| KriptoError::CryptoSetup(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| KriptoError::CryptoSetup(format!("encryption error: {e}")))?;

    // Prepend the nonce so the caller only needs to store one blob.
    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt with an already-derived key.
pub fn decrypt_with_key(key: &CipherKey, ciphertext_with_nonce: &[u8]) -> Result<Vec<u8>> {
    // Anything shorter than nonce + tag cannot have been produced by `encrypt`.
    if ciphertext_with_nonce.len() < NONCE_LEN + TAG_LEN {
        return Err(KriptoError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| KriptoError::CryptoSetup(format!("invalid key length: {e}")))?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| KriptoError::DecryptionFailed)
}
