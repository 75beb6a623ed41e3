//! Typed repositories over the document store.
//!
//! # Collections
//!
//! - `users` - Customer profiles, schedules and referral ledgers
//! - `sales` - One-time and subscription sale records
//! - `subscriptions` - Admin plans and per-user custom plans
//! - `products` - One-time purchase catalogue
//! - `accounts` - Login credentials keyed by normalised email
//! - `sessions` - Sign-in sessions keyed by token digest
//!
//! Repositories turn raw JSON into the structs in [`crate::models`]. A
//! document that no longer deserializes is reported as
//! [`RepositoryError::DataCorruption`] instead of being skipped.

pub mod accounts;
pub mod plans;
pub mod products;
pub mod sales;
pub mod users;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::store::{Collection, StoreError, StoredDocument};

pub use accounts::{AccountRepository, SessionRepository};
pub use plans::PlanRepository;
pub use products::ProductRepository;
pub use sales::SaleRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Store backend failure.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Key already taken.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound,
            StoreError::AlreadyExists { collection, id } => {
                Self::Conflict(format!("{collection}/{id} already exists"))
            }
            other => Self::Store(other),
        }
    }
}

/// Deserialize a stored document.
fn decode<T: DeserializeOwned>(
    collection: Collection,
    id: &str,
    data: Value,
) -> Result<T, RepositoryError> {
    serde_json::from_value(data).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid {collection}/{id}: {e}"))
    })
}

/// Deserialize every document of a listing, keeping keys.
fn decode_all<K, T>(
    collection: Collection,
    docs: Vec<StoredDocument>,
) -> Result<Vec<(K, T)>, RepositoryError>
where
    K: From<String>,
    T: DeserializeOwned,
{
    docs.into_iter()
        .map(|doc| {
            let value = decode(collection, &doc.id, doc.data)?;
            Ok((K::from(doc.id), value))
        })
        .collect()
}

/// Serialize a model for storage.
fn encode<T: Serialize>(value: &T) -> Result<Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("cannot serialize document: {e}")))
}
