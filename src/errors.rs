use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in Kripto.
#[derive(Debug, Error)]
pub enum KriptoError {
    // --- Validation errors ---
    #[error("Invalid name '{0}': nothing left after removing non-alphanumeric characters")]
    InvalidName(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Auth errors ---
    #[error("Unauthorized: {0}")]
    Unauthorized(TokenRejection),

    #[error("Unknown user or wrong password")]
    BadCredentials,

    // --- Crypto errors ---
    #[error("Cipher setup failed: {0}")]
    CryptoSetup(String),

    #[error("Decryption failed: wrong passphrase or corrupted data")]
    DecryptionFailed,

    #[error("Token signing failed: {0}")]
    Signing(String),

    // --- Key material errors ---
    #[error("Cannot load key '{name}': {reason}")]
    KeyLoad { name: String, reason: String },

    // --- Storage errors ---
    #[error("No stored file at {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored record is corrupt: {0}")]
    CorruptRecord(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    AuditError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Why a bearer token was refused.
///
/// Carried inside [`KriptoError::Unauthorized`] for operator logs. A
/// transport layer should answer every variant the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not verify")]
    BadSignature,

    #[error("token for '{username}' expired at {expired_at}")]
    Expired {
        username: String,
        expired_at: chrono::DateTime<chrono::Utc>,
    },
}

/// Coarse classification a transport maps onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any I/O or crypto (400).
    Validation,
    /// Unknown user, wrong password, or a refused token (401).
    Unauthorized,
    /// The named entity does not exist (404).
    NotFound,
    /// Cipher, signing, or key-material failure (500).
    Crypto,
    /// Filesystem, config, or audit failure (500).
    Storage,
}

impl KriptoError {
    /// Classify this error for the caller-facing layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName(_)
            | Self::InvalidUsername(_)
            | Self::InvalidPassword(_)
            | Self::Serialization(_)
            | Self::CommandFailed(_) => ErrorKind::Validation,
            Self::Unauthorized(_) | Self::BadCredentials => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::CryptoSetup(_)
            | Self::DecryptionFailed
            | Self::Signing(_)
            | Self::KeyLoad { .. } => ErrorKind::Crypto,
            Self::Io(_) | Self::CorruptRecord(_) | Self::ConfigError(_) | Self::AuditError(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// Shorthand for `kind() == ErrorKind::Unauthorized`.
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }
}

impl From<TokenRejection> for KriptoError {
    fn from(rejection: TokenRejection) -> Self {
        Self::Unauthorized(rejection)
    }
}

/// Convenience type alias for Kripto results.
pub type Result<T> = std::result::Result<T, KriptoError>;
