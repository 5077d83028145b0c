//! Symmetric key material held in memory.

use zeroize::Zeroize;

/// Length of a derived AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// A 32-byte AES-256 key that zeroes its memory when dropped.
///
/// Built by [`crate::crypto::derive_key`]; never serialized or logged.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct CipherKey {
    bytes: [u8; KEY_LEN],
}

impl CipherKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to build the AEAD cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey(<redacted>)")
    }
}
