//! Error types for furtivefs
//!
//! All engine operations return [`Result`]. Failures carry enough context
//! (scope, project, path) for a caller to render a message.

use std::path::PathBuf;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error taxonomy
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Password is malformed (empty). This is never raised for a merely
    /// wrong password; wrong passwords surface as `DecryptionFailed`.
    #[error("invalid password: {0}")]
    InvalidPassword(String),

    /// Authentication tag did not verify: wrong password or a corrupted or
    /// tampered blob. The two cases are indistinguishable by design.
    #[error("decryption failed for object {name}: wrong password or corrupted data")]
    DecryptionFailed {
        /// Storage name of the blob that failed to open
        name: String,
    },

    /// Scope or project absent from the index
    #[error("not found: {0}")]
    NotFound(String),

    /// Push source path does not exist
    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),

    /// Restore target already contains a conflicting entry
    #[error("destination conflict: {0} already exists")]
    DestinationConflict(PathBuf),

    /// An ignore glob failed to parse
    #[error("invalid ignore pattern: {0}")]
    IgnorePattern(String),

    /// Underlying storage medium failure
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Key derivation or encryption-side failure
    #[error("crypto error: {0}")]
    Crypto(String),
}

impl Error {
    /// NotFound for a project within a scope
    pub fn project_not_found(scope: &str, project: &str) -> Self {
        Error::NotFound(format!("project '{}' in scope '{}'", project, scope))
    }

    /// NotFound for a scope
    pub fn scope_not_found(scope: &str) -> Self {
        Error::NotFound(format!("scope '{}'", scope))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(format!("serialization failed: {}", e))
    }
}
