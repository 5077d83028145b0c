//! High-level vault operations used by the service and the CLI.
//!
//! `SecretVault` wraps the file store and the cipher so callers can work
//! with calls like `vault.put(&token, &bundle, passphrase)`. Every
//! operation verifies the bearer token before it touches the disk.

use std::collections::BTreeMap;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::audit::{AuditEvent, AuditSink};
use crate::auth::{TokenAuthority, VerifiedToken};
use crate::crypto::{decrypt, encrypt};
use crate::errors::{KriptoError, Result};
use crate::store::{FileKind, FileStore};

use super::secret::SecretBundle;

/// Encrypted per-app bundles, one file each.
pub struct SecretVault {
    files: Arc<FileStore>,
    tokens: Arc<TokenAuthority>,
    audit: Arc<dyn AuditSink>,
}

impl SecretVault {
    pub fn new(
        files: Arc<FileStore>,
        tokens: Arc<TokenAuthority>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            files,
            tokens,
            audit,
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Store `bundle`, replacing whatever the app had before.
    pub fn put(&self, token: &str, bundle: &SecretBundle, passphrase: &str) -> Result<()> {
        self.authorize(token)?;

        let plaintext = Zeroizing::new(bundle.to_json()?);
        let sealed = encrypt(&plaintext, passphrase)?;
        self.files.write(FileKind::Secret, &bundle.app, &sealed)?;

        self.audit.record(&AuditEvent::SecretWritten {
            app: bundle.app.clone(),
            vars: bundle.len(),
        });
        Ok(())
    }

    /// Remove the app's bundle. Missing is [`KriptoError::NotFound`].
    pub fn delete(&self, token: &str, app: &str) -> Result<()> {
        self.authorize(token)?;
        self.files.delete(FileKind::Secret, app)?;

        self.audit.record(&AuditEvent::SecretDeleted {
            app: app.to_string(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The app's variables. An app with nothing stored yields an empty map.
    pub fn get(
        &self,
        token: &str,
        app: &str,
        passphrase: &str,
    ) -> Result<BTreeMap<String, String>> {
        Ok(self
            .lookup(token, app, passphrase)?
            .map(|bundle| bundle.vars)
            .unwrap_or_default())
    }

    /// The stored bundle, or `None` if the app has never been written.
    ///
    /// Unlike [`get`](Self::get) this tells "missing" apart from "empty".
    pub fn lookup(
        &self,
        token: &str,
        app: &str,
        passphrase: &str,
    ) -> Result<Option<SecretBundle>> {
        self.authorize(token)?;

        let sealed = self.files.read(FileKind::Secret, app)?;
        self.audit.record(&AuditEvent::SecretRead {
            app: app.to_string(),
            found: sealed.is_some(),
        });

        let Some(sealed) = sealed else {
            return Ok(None);
        };

        let plaintext = Zeroizing::new(decrypt(&sealed, passphrase)?);
        let bundle = SecretBundle::from_json(&plaintext)
            .map_err(|e| KriptoError::CorruptRecord(format!("secret for '{app}': {e}")))?;
        Ok(Some(bundle))
    }

    /// Sanitized names of every app with a stored bundle.
    pub fn list(&self, token: &str) -> Result<Vec<String>> {
        self.authorize(token)?;
        self.files.list(FileKind::Secret)
    }

    fn authorize(&self, token: &str) -> Result<VerifiedToken> {
        self.tokens.verify(token)
    }
}
