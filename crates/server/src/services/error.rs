//! Service error types.

use thiserror::Error;

use refill_core::{LedgerError, PlanError, ScheduleError, TransitionError};

use crate::db::RepositoryError;

/// Errors raised by the business services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Repository/store failure.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Bad input.
    #[error("{0}")]
    Validation(String),

    /// Request conflicts with the current state of a record.
    #[error("{0}")]
    Conflict(String),

    /// Illegal sale status change.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Invalid plan inputs.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Schedule could not be built or updated.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Referral ledger update rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A multi-document operation failed after earlier writes succeeded.
    #[error("partial write ({completed}); then failed: {source}")]
    PartialWrite {
        /// Writes that did complete.
        completed: String,
        source: RepositoryError,
    },
}

impl ServiceError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Wrap a failure that happened after `completed` was already written.
    pub(crate) fn partial(completed: impl Into<String>, source: RepositoryError) -> Self {
        let completed = completed.into();
        tracing::error!(completed = %completed, error = %source, "Partial write");
        Self::PartialWrite { completed, source }
    }
}

/// Map a missing record to `ServiceError::NotFound`.
pub(crate) fn not_found(what: &'static str) -> impl FnOnce(RepositoryError) -> ServiceError {
    move |err| match err {
        RepositoryError::NotFound => ServiceError::NotFound(what),
        other => ServiceError::Repository(other),
    }
}
