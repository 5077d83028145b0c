//! Integration tests for credentials and bearer tokens.

mod common;

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use kripto::audit::{AuditEvent, MemoryAudit, NullAudit};
use kripto::auth::{CredentialStore, TokenAuthority};
use kripto::store::{FileKind, FileStore, StoreLayout};
use kripto::{KriptoError, TokenRejection};
use tempfile::TempDir;

const PHRASE: &str = "avocado";

fn files() -> (TempDir, Arc<FileStore>) {
    let dir = TempDir::new().unwrap();
    let files = Arc::new(FileStore::new(StoreLayout::under(dir.path())));
    (dir, files)
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

// ---------------------------------------------------------------------------
// Credential lifecycle
// ---------------------------------------------------------------------------

#[test]
fn credential_lifecycle() {
    let (dir, files) = files();
    let creds = CredentialStore::new(files, Arc::new(NullAudit));

    creds.register("ffhenkes", "secret", PHRASE).unwrap();
    assert!(dir.path().join("authdb").join(".ffhenkes.auth").is_file());

    assert!(creds.verify("ffhenkes", "secret", PHRASE).unwrap());
    assert!(!creds.verify("ffhenkes", "wrong", PHRASE).unwrap());
    assert!(!creds.verify("nobody", "secret", PHRASE).unwrap());

    // Re-registering replaces the password.
    creds.register("ffhenkes", "changed", PHRASE).unwrap();
    assert!(!creds.verify("ffhenkes", "secret", PHRASE).unwrap());
    assert!(creds.verify("ffhenkes", "changed", PHRASE).unwrap());

    assert_eq!(creds.list().unwrap(), vec!["ffhenkes"]);
    creds.remove("ffhenkes").unwrap();
    assert!(!creds.verify("ffhenkes", "changed", PHRASE).unwrap());
    assert!(matches!(
        creds.remove("ffhenkes"),
        Err(KriptoError::NotFound(_))
    ));
}

#[test]
fn wrong_passphrase_is_not_a_mismatch() {
    let (_dir, files) = files();
    let creds = CredentialStore::new(files, Arc::new(NullAudit));
    creds.register("alice", "pw", PHRASE).unwrap();

    let err = creds.verify("alice", "pw", "guacamole").unwrap_err();
    assert!(matches!(err, KriptoError::DecryptionFailed));
}

#[test]
fn corrupted_credential_file_is_an_error() {
    let (_dir, files) = files();
    let creds = CredentialStore::new(files.clone(), Arc::new(NullAudit));
    creds.register("alice", "pw", PHRASE).unwrap();

    let mut raw = files.read(FileKind::Credential, "alice").unwrap().unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0xff;
    files.write(FileKind::Credential, "alice", &raw).unwrap();

    assert!(creds.verify("alice", "pw", PHRASE).is_err());
}

#[test]
fn invalid_usernames_are_rejected_before_any_write() {
    let (dir, files) = files();
    let creds = CredentialStore::new(files, Arc::new(NullAudit));

    for username in ["", "!!!", "me@example.com"] {
        let err = creds.register(username, "pw", PHRASE).unwrap_err();
        assert!(
            matches!(err, KriptoError::InvalidUsername(_)),
            "{username:?} gave {err:?}"
        );
    }
    assert!(!dir.path().join("authdb").exists());
}

// ---------------------------------------------------------------------------
// Token lifecycle
// ---------------------------------------------------------------------------

#[test]
fn token_is_valid_until_expiry_then_rejected() {
    let (_dir, files) = files();
    common::install_keys(&files, "kripto", 1);
    let tokens = TokenAuthority::new(files, "kripto", Arc::new(NullAudit));

    let t0 = at(1_700_000_000);
    let token = tokens.issue_at("alice", Duration::hours(24), t0).unwrap();

    let verified = tokens.verify_at(&token, t0 + Duration::hours(1)).unwrap();
    assert_eq!(verified.username, "alice");
    assert_eq!(verified.expires_at, t0 + Duration::hours(24));

    match tokens.verify_at(&token, t0 + Duration::hours(25)) {
        Err(KriptoError::Unauthorized(TokenRejection::Expired {
            username,
            expired_at,
        })) => {
            assert_eq!(username, "alice");
            assert_eq!(expired_at, t0 + Duration::hours(24));
        }
        other => panic!("expected expiry, got {other:?}"),
    }
}

#[test]
fn token_from_a_foreign_key_is_rejected() {
    let (_dir_a, files_a) = files();
    let (_dir_b, files_b) = files();
    common::install_keys(&files_a, "kripto", 1);
    common::install_keys(&files_b, "kripto", 2);
    let ours = TokenAuthority::new(files_a, "kripto", Arc::new(NullAudit));
    let theirs = TokenAuthority::new(files_b, "kripto", Arc::new(NullAudit));

    let foreign = theirs.issue("mallory").unwrap();
    let err = ours.verify(&foreign).unwrap_err();
    assert!(matches!(
        err,
        KriptoError::Unauthorized(TokenRejection::BadSignature)
    ));
}

#[test]
fn replaced_keys_take_effect_without_restart() {
    let (_dir, files) = files();
    common::install_keys(&files, "kripto", 1);
    let tokens = TokenAuthority::new(files.clone(), "kripto", Arc::new(NullAudit));
    let old = tokens.issue("alice").unwrap();

    common::install_keys(&files, "kripto", 2);
    assert!(tokens.verify(&old).unwrap_err().is_unauthorized());
    let fresh = tokens.issue("alice").unwrap();
    assert_eq!(tokens.verify(&fresh).unwrap().username, "alice");
}

#[test]
fn rsa_pair_issues_and_checks_rs256_tokens() {
    let (_dir, files) = files();
    common::install_rsa_keys(&files, "kripto");
    let tokens = TokenAuthority::new(files, "kripto", Arc::new(NullAudit));

    let t0 = at(1_700_000_000);
    let token = tokens.issue_at("alice", Duration::minutes(5), t0).unwrap();
    assert_eq!(token.split('.').next().unwrap(), "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9");

    assert_eq!(tokens.verify_at(&token, t0).unwrap().username, "alice");
    assert!(matches!(
        tokens.verify_at(&token, t0 + Duration::minutes(6)),
        Err(KriptoError::Unauthorized(TokenRejection::Expired { .. }))
    ));
}

#[test]
fn pkcs1_rsa_pair_is_accepted() {
    let (_dir, files) = files();
    common::install_rsa_pkcs1_keys(&files, "kripto");
    let tokens = TokenAuthority::new(files, "kripto", Arc::new(NullAudit));

    let token = tokens.issue("alice").unwrap();
    assert_eq!(tokens.verify(&token).unwrap().username, "alice");
}

#[test]
fn switching_key_type_rejects_tokens_of_the_old_algorithm() {
    let (_dir, files) = files();
    common::install_rsa_keys(&files, "kripto");
    let tokens = TokenAuthority::new(files.clone(), "kripto", Arc::new(NullAudit));
    let rs256 = tokens.issue("alice").unwrap();

    common::install_keys(&files, "kripto", 1);
    assert!(matches!(
        tokens.verify(&rs256),
        Err(KriptoError::Unauthorized(TokenRejection::Malformed(_)))
    ));

    let eddsa = tokens.issue("alice").unwrap();
    common::install_rsa_keys(&files, "kripto");
    assert!(matches!(
        tokens.verify(&eddsa),
        Err(KriptoError::Unauthorized(TokenRejection::Malformed(_)))
    ));
}

#[test]
fn out_of_range_lifetime_fails_cleanly() {
    let (_dir, files) = files();
    common::install_keys(&files, "kripto", 1);
    let tokens = TokenAuthority::new(files, "kripto", Arc::new(NullAudit));

    let err = tokens
        .issue_with_ttl("alice", Duration::days(1_000_000_000))
        .unwrap_err();
    assert!(matches!(err, KriptoError::Signing(_)));

    let err = tokens
        .issue_at("alice", Duration::MAX, at(1_700_000_000))
        .unwrap_err();
    assert!(matches!(err, KriptoError::Signing(_)));
}

#[test]
fn token_events_reach_the_audit_sink() {
    let (_dir, files) = files();
    let audit = Arc::new(MemoryAudit::new());
    common::install_keys(&files, "kripto", 1);
    let tokens = TokenAuthority::new(files, "kripto", audit.clone());

    let t0 = at(1_700_000_000);
    let token = tokens.issue_at("alice", Duration::minutes(5), t0).unwrap();
    tokens.verify_at(&token, t0).unwrap();
    let _ = tokens.verify_at(&token, t0 + Duration::minutes(6));

    let events = audit.events();
    assert_eq!(
        events[0],
        AuditEvent::TokenIssued {
            username: "alice".into(),
            expires_at: t0 + Duration::minutes(5),
        }
    );
    assert_eq!(
        events[1],
        AuditEvent::TokenAccepted {
            username: "alice".into(),
            expires_at: t0 + Duration::minutes(5),
        }
    );
    assert!(matches!(events[2], AuditEvent::TokenRejected { .. }));

    // Nothing recorded may carry the token itself.
    for event in &events {
        assert!(!format!("{event:?}").contains(&token));
    }
}
