//! Who the caller is: password login and the bearer tokens it earns.

pub mod credentials;
mod signer;
pub mod token;

pub use credentials::{validate_username, Credential, CredentialStore};
pub use token::{Claims, TokenAuthority, VerifiedToken, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
