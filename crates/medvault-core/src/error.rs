//! Error types for Medvault core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these to
//! user-facing messages. Nothing here ever carries key material or plaintext.

use thiserror::Error;

/// Result type alias for Medvault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Core error type for Medvault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Credential matched no configured role, or a write fell outside the caller's scope
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Envelope could not be decrypted with this key (wrong password, tampering, or malformed envelope)
    #[error("Cannot decrypt records with this key")]
    Authentication,

    /// Key-value backend failed to read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Decrypted payload is not a valid record collection
    #[error("Corrupt record collection: {0}")]
    Corrupt(String),

    /// Encryption primitive failure
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Mutation would break a collection invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session was ended after a terminal load failure
    #[error("Session has ended; authorize again")]
    SessionClosed,
}

impl VaultError {
    /// Whether this error, observed while loading, must end the session and
    /// discard the derived key.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            VaultError::Authentication | VaultError::Storage(_) | VaultError::Corrupt(_)
        )
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for VaultError {
    fn from(err: rusqlite::Error) -> Self {
        VaultError::Storage(format!("SQLite: {}", err))
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::Corrupt(err.to_string())
    }
}
