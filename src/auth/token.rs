//! Signed bearer tokens.
//!
//! Tokens are compact JWS strings, `header.claims.signature`, each part
//! base64url without padding. The header is `{"alg":...,"typ":"JWT"}` with
//! `alg` taken from the stored key: `RS256` for an RSA pair, `EdDSA` for an
//! Ed25519 pair. The signature covers the ASCII bytes of `header.claims`.
//!
//! The signing key lives in the key directory as a PEM file named after
//! `key_name`, the verification key beside it as `<key_name>.pub`. The pair
//! is provisioned out of band, for example with `openssl genpkey`. Both are
//! read from disk on every call so a replaced key takes effect without a
//! restart.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::audit::{AuditEvent, AuditSink};
use crate::errors::{KriptoError, Result, TokenRejection};
use crate::store::{FileKind, FileStore};

use super::signer::{TokenSigner, TokenVerifier};

/// Lifetime of a token when neither the caller nor the user record picks one.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Longest lifetime a configured or per-user token may carry (ten years).
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// What a token asserts. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// A token that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies bearer tokens with one named key pair.
pub struct TokenAuthority {
    files: Arc<FileStore>,
    key_name: String,
    default_ttl: Duration,
    audit: Arc<dyn AuditSink>,
}

impl TokenAuthority {
    pub fn new(files: Arc<FileStore>, key_name: impl Into<String>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            files,
            key_name: key_name.into(),
            default_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            audit,
        }
    }

    /// Override the lifetime used by [`issue`](Self::issue).
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Sign a token for `username` valid for the default lifetime.
    pub fn issue(&self, username: &str) -> Result<String> {
        self.issue_at(username, self.default_ttl, Utc::now())
    }

    pub fn issue_with_ttl(&self, username: &str, ttl: Duration) -> Result<String> {
        self.issue_at(username, ttl, Utc::now())
    }

    /// Sign a token as if the clock read `now`.
    pub fn issue_at(&self, username: &str, ttl: Duration, now: DateTime<Utc>) -> Result<String> {
        let signer = self.load_signer()?;

        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            KriptoError::Signing(format!(
                "token lifetime of {}s is out of range",
                ttl.num_seconds()
            ))
        })?;
        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let header = Header {
            alg: signer.alg().into(),
            typ: TOKEN_TYPE.into(),
        };

        let header_json = serde_json::to_vec(&header)
            .map_err(|e| KriptoError::Signing(format!("header encoding: {e}")))?;
        let claims_json = serde_json::to_vec(&claims)
            .map_err(|e| KriptoError::Signing(format!("claims encoding: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = signer
            .sign(signing_input.as_bytes())
            .map_err(KriptoError::Signing)?;

        self.audit.record(&AuditEvent::TokenIssued {
            username: username.to_string(),
            expires_at,
        });

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Check a presented token against the current time.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken> {
        self.verify_at(token, Utc::now())
    }

    /// Check a presented token as if the clock read `now`.
    ///
    /// Structure and algorithm are checked first, then the signature, then
    /// expiry. A token is still valid in the second its `exp` names.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken> {
        let verifier = self.load_verifier()?;

        match check(&verifier, token.trim(), now) {
            Ok(verified) => {
                self.audit.record(&AuditEvent::TokenAccepted {
                    username: verified.username.clone(),
                    expires_at: verified.expires_at,
                });
                Ok(verified)
            }
            Err(rejection) => {
                self.audit.record(&AuditEvent::TokenRejected {
                    reason: rejection.to_string(),
                });
                Err(rejection.into())
            }
        }
    }

    fn load_signer(&self) -> Result<TokenSigner> {
        let pem = self.read_pem(FileKind::PrivateKey)?;
        TokenSigner::from_pem(&pem).map_err(|e| self.key_error(e))
    }

    fn load_verifier(&self) -> Result<TokenVerifier> {
        let pem = self.read_pem(FileKind::PublicKey)?;
        TokenVerifier::from_pem(&pem).map_err(|e| self.key_error(e))
    }

    fn read_pem(&self, kind: FileKind) -> Result<Zeroizing<String>> {
        let bytes = self
            .files
            .read(kind, &self.key_name)
            .map_err(|e| self.key_error(e))?
            .ok_or_else(|| self.key_error("key file does not exist"))?;
        let bytes = Zeroizing::new(bytes);

        let text = std::str::from_utf8(&bytes).map_err(|_| self.key_error("key file is not UTF-8"))?;
        Ok(Zeroizing::new(text.to_string()))
    }

    fn key_error(&self, reason: impl std::fmt::Display) -> KriptoError {
        KriptoError::KeyLoad {
            name: self.key_name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Pure token check, independent of where the key came from.
fn check(
    key: &TokenVerifier,
    token: &str,
    now: DateTime<Utc>,
) -> std::result::Result<VerifiedToken, TokenRejection> {
    let malformed = |what: &str| TokenRejection::Malformed(what.to_string());

    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed("expected three dot-separated parts"));
    };

    let header: Header = decode_json(header_b64).ok_or_else(|| malformed("bad header"))?;
    if header.alg != key.alg() {
        return Err(TokenRejection::Malformed(format!(
            "algorithm '{}' does not match the {} key",
            header.alg,
            key.alg()
        )));
    }

    let sig_bytes = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| malformed("signature is not base64url"))?;

    let signing_input_len = header_b64.len() + 1 + claims_b64.len();
    key.verify(&token.as_bytes()[..signing_input_len], &sig_bytes)?;

    let claims: Claims = decode_json(claims_b64).ok_or_else(|| malformed("bad claims"))?;
    let (Some(issued_at), Some(expires_at)) = (
        Utc.timestamp_opt(claims.iat, 0).single(),
        Utc.timestamp_opt(claims.exp, 0).single(),
    ) else {
        return Err(malformed("timestamps out of range"));
    };

    if now.timestamp() > claims.exp {
        return Err(TokenRejection::Expired {
            username: claims.username,
            expired_at: expires_at,
        });
    }

    Ok(VerifiedToken {
        username: claims.username,
        issued_at,
        expires_at,
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(part: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(part).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Write a deterministic Ed25519 key pair derived from `seed`.
#[cfg(test)]
pub(crate) fn install_test_keys(files: &FileStore, key_name: &str, seed: u8) {
    use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
    use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};

    let signing_key = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]);
    let private_pem = signing_key.to_pkcs8_pem(LineEnding::LF).unwrap();
    let public_pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    files
        .write(FileKind::PrivateKey, key_name, private_pem.as_bytes())
        .unwrap();
    files
        .write(FileKind::PublicKey, key_name, public_pem.as_bytes())
        .unwrap();
}

/// Write the fixed RSA test pair (PKCS#8 private, SPKI public).
#[cfg(test)]
pub(crate) fn install_test_rsa_keys(files: &FileStore, key_name: &str) {
    files
        .write(
            FileKind::PrivateKey,
            key_name,
            include_bytes!("../../tests/fixtures/rsa_pkcs8.pem"),
        )
        .unwrap();
    files
        .write(
            FileKind::PublicKey,
            key_name,
            include_bytes!("../../tests/fixtures/rsa_spki.pub"),
        )
        .unwrap();
}
