//! Token-gated, encrypted secret storage.
//!
//! - `SecretBundle`: one app's variables (`secret`)
//! - `SecretVault`: put / get / delete / list behind a bearer token (`store`)

pub mod secret;
pub mod store;

pub use secret::SecretBundle;
pub use store::SecretVault;
