//! Error types for keepvault.

use thiserror::Error;

/// Errors produced by the credential store and its utilities.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Filesystem failure (missing file, permission denied, failed rename).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The container could not be parsed.
    #[error("malformed database file: {0}")]
    Format(String),

    /// Wrong master password or corrupted ciphertext. The two are
    /// deliberately reported the same way.
    #[error("decryption failed: wrong password or corrupted data")]
    Decryption,

    /// Invalid caller-supplied configuration (password generation, KDF params).
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// Save requested with a cipher or KDF setting the policy rejects.
    #[error("encryption policy violation: {0}")]
    CipherPolicy(String),

    /// Mutation attempted on a tree without a root group.
    #[error("database is not initialized: no root group")]
    UninitializedDatabase,

    /// Operation requires unlocked secrets but the database was closed.
    #[error("database is locked")]
    Locked,

    /// The RNG or an AEAD primitive failed while sealing data.
    #[error("cryptographic failure: {0}")]
    Crypto(String),
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::Format(e.to_string())
    }
}

impl From<base64::DecodeError> for VaultError {
    fn from(e: base64::DecodeError) -> Self {
        VaultError::Format(format!("invalid base64 field: {e}"))
    }
}

impl From<tempfile::PersistError> for VaultError {
    fn from(e: tempfile::PersistError) -> Self {
        VaultError::Io(e.error)
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, VaultError>;
