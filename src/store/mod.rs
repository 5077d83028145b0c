//! Sanitized file-backed persistence.
//!
//! Every entity (credential, secret bundle, key material) lives in one
//! file whose name is derived from a sanitized logical name plus a
//! kind-specific convention:
//!
//! ```text
//! <auth_dir>/.<name>.auth      credential record (ciphertext)
//! <secrets_dir>/<name>.secret  secret bundle (ciphertext)
//! <keys_dir>/<name>            Ed25519 private key (PEM)
//! <keys_dir>/<name>.pub        Ed25519 public key (PEM)
//! ```
//!
//! Access to each file is serialized through a per-key lock arena.

pub mod fs;
pub mod lock;
pub mod sanitize;

pub use fs::{FileKind, FileStore, LockedEntry, StoreLayout};
pub use lock::KeyLocks;
pub use sanitize::sanitize;
