//! The assembled core: one file store shared by every component.
//!
//! A transport (the CLI here, an HTTP layer elsewhere) builds a [`Kripto`]
//! from [`Settings`] once and calls into it per request.

use std::sync::Arc;

use tracing::debug;

use crate::audit::{AuditSink, TracingAudit};
use crate::auth::{CredentialStore, TokenAuthority};
use crate::config::Settings;
use crate::errors::{KriptoError, Result};
use crate::store::FileStore;
use crate::vault::SecretVault;

pub struct Kripto {
    files: Arc<FileStore>,
    credentials: CredentialStore,
    tokens: Arc<TokenAuthority>,
    vault: SecretVault,
}

impl Kripto {
    /// Wire every component to `audit`.
    pub fn new(settings: &Settings, audit: Arc<dyn AuditSink>) -> Self {
        let files = Arc::new(FileStore::new(settings.layout()));
        let tokens = Arc::new(
            TokenAuthority::new(files.clone(), settings.key_name.clone(), audit.clone())
                .with_ttl(settings.token_ttl()),
        );
        let credentials = CredentialStore::new(files.clone(), audit.clone());
        let vault = SecretVault::new(files.clone(), tokens.clone(), audit);

        debug!(layout = ?settings.layout(), key = %settings.key_name, "kripto core ready");

        Self {
            files,
            credentials,
            tokens,
            vault,
        }
    }

    /// Like [`new`](Self::new), auditing through `tracing` only.
    pub fn with_tracing(settings: &Settings) -> Self {
        Self::new(settings, Arc::new(TracingAudit))
    }

    /// Check a password and hand out a token.
    ///
    /// The token lives as long as the user's own lifetime if one was set at
    /// registration, otherwise the configured default. Unknown user and
    /// wrong password are the same error.
    pub fn login(&self, username: &str, password: &str, passphrase: &str) -> Result<String> {
        let credential = self
            .credentials
            .authenticate(username, password, passphrase)?
            .ok_or(KriptoError::BadCredentials)?;

        let ttl = credential
            .token_ttl
            .unwrap_or_else(|| self.tokens.default_ttl());
        self.tokens.issue_with_ttl(&credential.username, ttl)
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    pub fn vault(&self) -> &SecretVault {
        &self.vault
    }
}
