pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod service;
pub mod store;
pub mod vault;

pub use errors::{ErrorKind, KriptoError, Result, TokenRejection};
pub use service::Kripto;
