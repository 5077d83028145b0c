//! Token key material.
//!
//! The signing algorithm follows the key the operator provisioned: an
//! Ed25519 pair signs `EdDSA`, an RSA pair signs `RS256` (PKCS#1 v1.5 over
//! SHA-256). Private keys are accepted as PKCS#8 PEM, or PKCS#1 PEM
//! (`BEGIN RSA PRIVATE KEY`) for RSA; public keys as SPKI PEM, or PKCS#1
//! PEM for RSA.

use ed25519_dalek::{Signer as _, Verifier as _};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15;
use rsa::signature::{SignatureEncoding as _, Signer as _, Verifier as _};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::errors::TokenRejection;

pub(crate) const EDDSA: &str = "EdDSA";
pub(crate) const RS256: &str = "RS256";

const UNSUPPORTED_KEY: &str = "not an Ed25519 or RSA key in PKCS#8 or PKCS#1 PEM form";

/// A loaded private key, ready to sign.
pub(crate) enum TokenSigner {
    Ed25519(ed25519_dalek::SigningKey),
    Rs256(Box<pkcs1v15::SigningKey<Sha256>>),
}

impl TokenSigner {
    /// Parse a private key, whichever supported kind it is.
    pub(crate) fn from_pem(pem: &str) -> Result<Self, String> {
        if let Ok(key) =
            <ed25519_dalek::SigningKey as ed25519_dalek::pkcs8::DecodePrivateKey>::from_pkcs8_pem(pem)
        {
            return Ok(Self::Ed25519(key));
        }

        let rsa_key = <RsaPrivateKey as rsa::pkcs8::DecodePrivateKey>::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|_| UNSUPPORTED_KEY.to_string())?;
        Ok(Self::Rs256(Box::new(pkcs1v15::SigningKey::new(rsa_key))))
    }

    /// The JWS `alg` this key produces.
    pub(crate) fn alg(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => EDDSA,
            Self::Rs256(_) => RS256,
        }
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, String> {
        match self {
            Self::Ed25519(key) => key
                .try_sign(message)
                .map(|sig| sig.to_bytes().to_vec())
                .map_err(|e| e.to_string()),
            Self::Rs256(key) => key
                .try_sign(message)
                .map(|sig| sig.to_vec())
                .map_err(|e| e.to_string()),
        }
    }
}

/// A loaded public key, ready to check signatures.
pub(crate) enum TokenVerifier {
    Ed25519(ed25519_dalek::VerifyingKey),
    Rs256(Box<pkcs1v15::VerifyingKey<Sha256>>),
}

impl TokenVerifier {
    /// Parse a public key, whichever supported kind it is.
    pub(crate) fn from_pem(pem: &str) -> Result<Self, String> {
        if let Ok(key) =
            <ed25519_dalek::VerifyingKey as ed25519_dalek::pkcs8::DecodePublicKey>::from_public_key_pem(pem)
        {
            return Ok(Self::Ed25519(key));
        }

        let rsa_key = <RsaPublicKey as rsa::pkcs8::DecodePublicKey>::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|_| UNSUPPORTED_KEY.to_string())?;
        Ok(Self::Rs256(Box::new(pkcs1v15::VerifyingKey::new(rsa_key))))
    }

    /// The only JWS `alg` this key accepts.
    pub(crate) fn alg(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => EDDSA,
            Self::Rs256(_) => RS256,
        }
    }

    /// Check `signature` over `message`.
    ///
    /// A signature that cannot even be decoded for this key type is
    /// `Malformed`; one that decodes but does not match is `BadSignature`.
    pub(crate) fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), TokenRejection> {
        let wrong_shape = || TokenRejection::Malformed("signature has the wrong length".into());

        match self {
            Self::Ed25519(key) => {
                let sig =
                    ed25519_dalek::Signature::from_slice(signature).map_err(|_| wrong_shape())?;
                key.verify(message, &sig)
                    .map_err(|_| TokenRejection::BadSignature)
            }
            Self::Rs256(key) => {
                let sig = pkcs1v15::Signature::try_from(signature).map_err(|_| wrong_shape())?;
                key.verify(message, &sig)
                    .map_err(|_| TokenRejection::BadSignature)
            }
        }
    }
}
