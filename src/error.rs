/// Error types for the catalog store and account operations
///
/// Every failure here is local and recoverable: the UI renders the
/// message inline and offers a manual retry where it makes sense.

use thiserror::Error;

/// Errors raised by the SQLite catalog store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure (I/O, locking, constraint)
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A JSON column (tags, favorites, purchases) could not be encoded or decoded
    #[error("malformed stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No template or user with this id
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Operation requires a signed-in identity
    #[error("you must be signed in to do that")]
    NotSignedIn,

    /// Admin-only mutation attempted by a non-admin identity
    #[error("you do not have permission to perform this action")]
    PermissionDenied,

    /// Email/password pair did not match a stored account
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Sign-up with an email that already has an account
    #[error("an account with email '{0}' already exists")]
    EmailTaken(String),

    /// Form input rejected before reaching the database
    #[error("{0}")]
    Validation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn template_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound { kind: "template", id: id.into() }
    }

    pub fn user_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound { kind: "user", id: id.into() }
    }
}
