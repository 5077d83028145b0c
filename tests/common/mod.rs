//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::path::Path;

use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::SigningKey;
use kripto::store::{FileKind, FileStore, StoreLayout};

/// Provision a deterministic Ed25519 key pair the way an operator would:
/// PKCS#8 PEM at `<keys_dir>/<name>`, SPKI PEM at `<keys_dir>/<name>.pub`.
pub fn install_keys(files: &FileStore, name: &str, seed: u8) {
    let signing_key = SigningKey::from_bytes(&[seed; 32]);
    let private_pem = signing_key.to_pkcs8_pem(LineEnding::LF).unwrap();
    let public_pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();

    files
        .write(FileKind::PrivateKey, name, private_pem.as_bytes())
        .unwrap();
    files
        .write(FileKind::PublicKey, name, public_pem.as_bytes())
        .unwrap();
}

/// Same, for the conventional `authdb/ secrets/ rsa/` layout under `root`.
pub fn install_keys_under(root: &Path, name: &str, seed: u8) {
    install_keys(&FileStore::new(StoreLayout::under(root)), name, seed);
}

/// Provision the fixed RSA test pair: PKCS#8 private key, SPKI public key.
pub fn install_rsa_keys(files: &FileStore, name: &str) {
    files
        .write(
            FileKind::PrivateKey,
            name,
            include_bytes!("../fixtures/rsa_pkcs8.pem"),
        )
        .unwrap();
    files
        .write(FileKind::PublicKey, name, include_bytes!("../fixtures/rsa_spki.pub"))
        .unwrap();
}

/// Same pair in PKCS#1 PEM (`BEGIN RSA PRIVATE KEY` / `BEGIN RSA PUBLIC KEY`).
pub fn install_rsa_pkcs1_keys(files: &FileStore, name: &str) {
    files
        .write(
            FileKind::PrivateKey,
            name,
            include_bytes!("../fixtures/rsa_pkcs1.pem"),
        )
        .unwrap();
    files
        .write(FileKind::PublicKey, name, include_bytes!("../fixtures/rsa_pkcs1.pub"))
        .unwrap();
}

/// RSA pair for the `authdb/ secrets/ rsa/` layout under `root`.
pub fn install_rsa_keys_under(root: &Path, name: &str) {
    install_rsa_keys(&FileStore::new(StoreLayout::under(root)), name);
}
