//! Key derivation and one-way hashing with SHA-256.
//!
//! The vault passphrase is turned into an AES-256 key by hashing its UTF-8
//! bytes once. The same primitive hashes user passwords before they are
//! written into a credential record. Both are deterministic: the same input
//! always yields the same 32 bytes.

use sha2::{Digest, Sha256};

use super::keys::{CipherKey, KEY_LEN};

/// SHA-256 of arbitrary bytes.
pub fn one_way_hash(data: &[u8]) -> [u8; KEY_LEN] {
    Sha256::digest(data).into()
}

/// Derive the symmetric data-at-rest key from the vault passphrase.
pub fn derive_key(passphrase: &str) -> CipherKey {
    CipherKey::new(one_way_hash(passphrase.as_bytes()))
}

/// Hash a user password for storage inside a credential record.
///
/// Returns lowercase hex so the record stays printable.
pub fn hash_password(password: &str) -> String {
    hex::encode(one_way_hash(password.as_bytes()))
}
