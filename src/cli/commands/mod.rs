//! One module per top-level subcommand.

pub mod audit_cmd;
pub mod secret;
pub mod token;
pub mod user;
