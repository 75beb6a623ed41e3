//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] refill_core::EmailError),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// House number or barangay rejected.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] refill_core::AddressError),

    /// A required registration field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Bearer token unknown or expired.
    #[error("invalid or expired session")]
    InvalidSession,

    /// No account for the email given to an admin command.
    #[error("account not found")]
    AccountNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Session lifetime pushes the expiry past the representable range.
    #[error("session lifetime out of range")]
    SessionExpiry,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
