//! Account and session repositories.

use refill_core::{Email, Role};

use super::{RepositoryError, decode, encode};
use crate::models::{Account, Session};
use crate::store::{Collection, DocumentStore, Patch};

/// Repository for login credentials, keyed by normalised email.
pub struct AccountRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> AccountRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Store a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(&self, account: &Account) -> Result<(), RepositoryError> {
        self.store
            .create(Collection::Accounts, account.email.as_str(), encode(account)?)
            .await
            .map_err(|e| match RepositoryError::from(e) {
                RepositoryError::Conflict(_) => {
                    RepositoryError::Conflict("email already exists".to_owned())
                }
                other => other,
            })
    }

    /// Get an account by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the document is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        self.store
            .get(Collection::Accounts, email.as_str())
            .await?
            .map(|data| decode(Collection::Accounts, email.as_str(), data))
            .transpose()
    }

    /// Change an account's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has this email.
    pub async fn set_role(&self, email: &Email, role: Role) -> Result<(), RepositoryError> {
        let patch = Patch::new().set("role", encode(&role)?);
        self.store
            .update(Collection::Accounts, email.as_str(), &patch)
            .await?;
        Ok(())
    }

    /// Remove an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the delete fails.
    pub async fn delete(&self, email: &Email) -> Result<bool, RepositoryError> {
        Ok(self
            .store
            .delete(Collection::Accounts, email.as_str())
            .await?)
    }
}

/// Repository for sign-in sessions, keyed by token digest.
pub struct SessionRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> SessionRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a digest collision.
    pub async fn create(&self, digest: &str, session: &Session) -> Result<(), RepositoryError> {
        self.store
            .create(Collection::Sessions, digest, encode(session)?)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the document is invalid.
    pub async fn get(&self, digest: &str) -> Result<Option<Session>, RepositoryError> {
        self.store
            .get(Collection::Sessions, digest)
            .await?
            .map(|data| decode(Collection::Sessions, digest, data))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the delete fails.
    pub async fn delete(&self, digest: &str) -> Result<bool, RepositoryError> {
        Ok(self.store.delete(Collection::Sessions, digest).await?)
    }
}
