//! Cryptographic primitives for Kripto.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption under a passphrase (`encryption`)
//! - SHA-256 passphrase key derivation and password hashing (`kdf`)
//! - The zeroize-on-drop key wrapper (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, hash_password, ...};
pub use encryption::{decrypt, decrypt_with_key, encrypt, encrypt_with_key};
pub use kdf::{derive_key, hash_password, one_way_hash};
pub use keys::CipherKey;
