//! Username/password credentials, encrypted at rest.
//!
//! A credential file holds a small JSON record (username, hex SHA-256 of
//! the password, optional per-user token lifetime) sealed with the vault
//! passphrase. The plaintext password is never written anywhere.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::audit::{AuditEvent, AuditSink};
use crate::crypto::{decrypt, encrypt, hash_password};
use crate::errors::{KriptoError, Result};
use crate::store::{sanitize, FileKind, FileStore};

use super::token::MAX_TOKEN_TTL_SECS;

/// Characters a username may never contain.
const FORBIDDEN_USERNAME_CHARS: &[char] = &['@'];

/// Longest accepted username, in bytes.
const MAX_USERNAME_LEN: usize = 256;

/// On-disk plaintext of a credential file (before encryption).
#[derive(Debug, Serialize, Deserialize)]
struct CredentialRecord {
    username: String,
    password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_ttl_secs: Option<i64>,
}

/// A registered user, as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    /// Hex SHA-256 of the password.
    pub password_hash: String,
    /// Token lifetime chosen at registration, if any.
    pub token_ttl: Option<Duration>,
}

/// Registers and checks username/password pairs.
pub struct CredentialStore {
    files: Arc<FileStore>,
    audit: Arc<dyn AuditSink>,
}

impl CredentialStore {
    pub fn new(files: Arc<FileStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { files, audit }
    }

    /// Register (or re-register) `username` with the default token lifetime.
    pub fn register(&self, username: &str, password: &str, passphrase: &str) -> Result<()> {
        self.register_with_ttl(username, password, passphrase, None)
    }

    /// Register `username`, optionally pinning the lifetime of its tokens.
    ///
    /// Overwrites any existing credential for the same (sanitized) name.
    pub fn register_with_ttl(
        &self,
        username: &str,
        password: &str,
        passphrase: &str,
        token_ttl: Option<Duration>,
    ) -> Result<()> {
        validate_username(username)?;
        if password.is_empty() {
            return Err(KriptoError::InvalidPassword(
                "password must not be empty".into(),
            ));
        }
        if let Some(ttl) = token_ttl {
            if ttl <= Duration::zero() || ttl.num_seconds() > MAX_TOKEN_TTL_SECS {
                return Err(KriptoError::CommandFailed(format!(
                    "token lifetime must be between 1 and {MAX_TOKEN_TTL_SECS} seconds"
                )));
            }
        }

        let record = CredentialRecord {
            username: username.to_string(),
            password_hash: hash_password(password),
            token_ttl_secs: token_ttl.map(|ttl| ttl.num_seconds()),
        };
        let plaintext = serde_json::to_vec(&record)
            .map_err(|e| KriptoError::Serialization(format!("credential record: {e}")))?;

        let sealed = encrypt(&plaintext, passphrase)?;
        self.files.write(FileKind::Credential, username, &sealed)?;

        self.audit.record(&AuditEvent::UserRegistered {
            username: username.to_string(),
        });
        Ok(())
    }

    /// `true` only when `username` exists and `password` matches.
    ///
    /// An unknown user is `Ok(false)`. A record that cannot be decrypted
    /// (wrong passphrase, corrupted file) is an error, not a mismatch.
    pub fn verify(&self, username: &str, password: &str, passphrase: &str) -> Result<bool> {
        Ok(self.authenticate(username, password, passphrase)?.is_some())
    }

    /// Like [`verify`](Self::verify), but returns the matched credential.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        passphrase: &str,
    ) -> Result<Option<Credential>> {
        let Some(credential) = self.load(username, passphrase)? else {
            self.login_failed(username, "unknown user");
            return Ok(None);
        };

        let presented = hash_password(password);
        let hash_matches: bool = presented
            .as_bytes()
            .ct_eq(credential.password_hash.as_bytes())
            .into();

        if credential.username != username || !hash_matches {
            self.login_failed(username, "password mismatch");
            return Ok(None);
        }

        self.audit.record(&AuditEvent::LoginSucceeded {
            username: username.to_string(),
        });
        Ok(Some(credential))
    }

    /// Remove the credential for `username`. Missing is `NotFound`.
    pub fn remove(&self, username: &str) -> Result<()> {
        self.files.delete(FileKind::Credential, username)?;
        self.audit.record(&AuditEvent::UserRemoved {
            username: username.to_string(),
        });
        Ok(())
    }

    /// Sanitized names of every stored credential.
    pub fn list(&self) -> Result<Vec<String>> {
        self.files.list(FileKind::Credential)
    }

    /// Decrypt and parse the stored record, `None` if there is none.
    fn load(&self, username: &str, passphrase: &str) -> Result<Option<Credential>> {
        // A name that sanitizes to nothing cannot have been registered.
        if sanitize(username).is_err() {
            return Ok(None);
        }

        let Some(sealed) = self.files.read(FileKind::Credential, username)? else {
            return Ok(None);
        };

        let plaintext = decrypt(&sealed, passphrase)?;
        let record: CredentialRecord = serde_json::from_slice(&plaintext)
            .map_err(|e| KriptoError::CorruptRecord(format!("credential for '{username}': {e}")))?;

        let token_ttl = match record.token_ttl_secs {
            Some(secs) => Some(Duration::try_seconds(secs).ok_or_else(|| {
                KriptoError::CorruptRecord(format!(
                    "credential for '{username}': token lifetime {secs}s out of range"
                ))
            })?),
            None => None,
        };

        Ok(Some(Credential {
            username: record.username,
            password_hash: record.password_hash,
            token_ttl,
        }))
    }

    fn login_failed(&self, username: &str, reason: &'static str) {
        self.audit.record(&AuditEvent::LoginFailed {
            username: username.to_string(),
            reason,
        });
    }
}

/// Check a username before it is used as a file key or stored.
pub fn validate_username(username: &str) -> Result<()> {
    if username.len() > MAX_USERNAME_LEN {
        return Err(KriptoError::InvalidUsername(format!(
            "username cannot exceed {MAX_USERNAME_LEN} bytes"
        )));
    }
    if let Some(c) = username.chars().find(|c| FORBIDDEN_USERNAME_CHARS.contains(c)) {
        return Err(KriptoError::InvalidUsername(format!(
            "username '{username}' must not contain '{c}'"
        )));
    }
    sanitize(username).map_err(|_| {
        KriptoError::InvalidUsername(format!(
            "username '{username}' needs at least one ASCII letter or digit"
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAudit;
    use crate::store::StoreLayout;
    use tempfile::TempDir;

    const PHRASE: &str = "avocado";

    fn setup() -> (TempDir, Arc<FileStore>, Arc<MemoryAudit>, CredentialStore) {
        let dir = TempDir::new().unwrap();
        let files = Arc::new(FileStore::new(StoreLayout::under(dir.path())));
        let audit = Arc::new(MemoryAudit::new());
        let creds = CredentialStore::new(files.clone(), audit.clone());
        (dir, files, audit, creds)
    }

    #[test]
    fn rejects_usernames_with_delimiter() {
        let (_dir, _files, _audit, creds) = setup();
        let result = creds.register("a@b", "pw", PHRASE);
        assert!(matches!(result, Err(KriptoError::InvalidUsername(_))));
    }

    #[test]
    fn rejects_empty_password() {
        let (_dir, _files, _audit, creds) = setup();
        let result = creds.register("alice", "", PHRASE);
        assert!(matches!(result, Err(KriptoError::InvalidPassword(_))));
    }

    #[test]
    fn stored_file_does_not_contain_password_or_username() {
        let (_dir, files, _audit, creds) = setup();
        creds.register("alice", "hunter2hunter2", PHRASE).unwrap();

        let raw = files.read(FileKind::Credential, "alice").unwrap().unwrap();
        let haystack = String::from_utf8_lossy(&raw);
        assert!(!haystack.contains("hunter2"));
        assert!(!haystack.contains("alice"));
    }

    #[test]
    fn colliding_sanitized_names_do_not_authenticate_each_other() {
        let (_dir, _files, _audit, creds) = setup();
        creds.register("j.doe", "pw", PHRASE).unwrap();

        // "jdoe" maps to the same file but is a different username.
        assert!(!creds.verify("jdoe", "pw", PHRASE).unwrap());
        assert!(creds.verify("j.doe", "pw", PHRASE).unwrap());
    }

    #[test]
    fn lifetime_beyond_the_cap_is_refused() {
        let (_dir, files, _audit, creds) = setup();
        let too_long = Duration::seconds(MAX_TOKEN_TTL_SECS + 1);

        let err = creds
            .register_with_ttl("alice", "pw", PHRASE, Some(too_long))
            .unwrap_err();
        assert!(matches!(err, KriptoError::CommandFailed(_)));
        assert!(!files.exists(FileKind::Credential, "alice").unwrap());
    }

    #[test]
    fn stored_lifetime_out_of_range_is_corrupt() {
        let (_dir, files, _audit, creds) = setup();
        let record = CredentialRecord {
            username: "alice".into(),
            password_hash: hash_password("pw"),
            token_ttl_secs: Some(i64::MAX),
        };
        let sealed = encrypt(&serde_json::to_vec(&record).unwrap(), PHRASE).unwrap();
        files.write(FileKind::Credential, "alice", &sealed).unwrap();

        let err = creds.authenticate("alice", "pw", PHRASE).unwrap_err();
        assert!(matches!(err, KriptoError::CorruptRecord(_)));
    }

    #[test]
    fn ttl_survives_the_round_trip() {
        let (_dir, _files, _audit, creds) = setup();
        creds
            .register_with_ttl("alice", "pw", PHRASE, Some(Duration::minutes(200)))
            .unwrap();

        let cred = creds.authenticate("alice", "pw", PHRASE).unwrap().unwrap();
        assert_eq!(cred.token_ttl, Some(Duration::minutes(200)));
    }

    #[test]
    fn audit_records_failure_reasons() {
        let (_dir, _files, audit, creds) = setup();
        creds.register("alice", "pw", PHRASE).unwrap();
        creds.verify("alice", "nope", PHRASE).unwrap();
        creds.verify("bob", "pw", PHRASE).unwrap();

        let events = audit.events();
        assert_eq!(
            events[1],
            AuditEvent::LoginFailed {
                username: "alice".into(),
                reason: "password mismatch"
            }
        );
        assert_eq!(
            events[2],
            AuditEvent::LoginFailed {
                username: "bob".into(),
                reason: "unknown user"
            }
        );
    }

    #[test]
    fn unsanitizable_username_is_simply_unknown() {
        let (_dir, _files, _audit, creds) = setup();
        assert!(!creds.verify("!!!", "pw", PHRASE).unwrap());
    }
}
