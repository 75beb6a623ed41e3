//! Document store abstraction.
//!
//! Every record lives as a JSON object in a named [`Collection`], addressed by
//! a string key. The store offers single-document operations only:
//!
//! - read / write / delete by key
//! - create with a generated key, or create-if-absent with a chosen key
//! - partial update of dotted field paths ([`Patch`])
//! - equality query on one field ([`FieldFilter`]) and whole-collection listing
//!
//! There are no multi-document transactions. Callers that touch several
//! documents perform independent writes and must report partial failures.
//!
//! Two backends implement [`DocumentStore`]:
//! - [`MemoryStore`] - process-local maps, used by tests and local runs
//! - [`PgStore`] - `PostgreSQL` `JSONB` rows in `refill.documents`

mod memory;
mod patch;
mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;
pub use patch::{FieldFilter, Patch};
pub use postgres::PgStore;

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Sales,
    Subscriptions,
    Products,
    Accounts,
    Sessions,
}

impl Collection {
    /// Collection name as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Sales => "sales",
            Self::Subscriptions => "subscriptions",
            Self::Products => "products",
            Self::Accounts => "accounts",
            Self::Sessions => "sessions",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document together with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Value,
}

/// Errors raised by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Target document does not exist.
    #[error("{collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    /// A document with this key already exists.
    #[error("{collection}/{id} already exists")]
    AlreadyExists { collection: Collection, id: String },

    /// Documents must be JSON objects.
    #[error("document body must be a JSON object")]
    NotAnObject,

    /// A patch path runs through a non-object value.
    #[error("cannot set {path}: {segment} is not an object")]
    InvalidPath { path: String, segment: String },
}

/// Storage backend for JSON documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document by key.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError>;

    /// Write a document, replacing any existing one.
    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<(), StoreError>;

    /// Write a document only if the key is unused.
    ///
    /// Returns `StoreError::AlreadyExists` otherwise.
    async fn create(&self, collection: Collection, id: &str, data: Value)
    -> Result<(), StoreError>;

    /// Write a document under a freshly generated key and return the key.
    async fn add(&self, collection: Collection, data: Value) -> Result<String, StoreError>;

    /// Apply a partial update to an existing document.
    ///
    /// Returns `StoreError::NotFound` if the document does not exist.
    async fn update(&self, collection: Collection, id: &str, patch: &Patch)
    -> Result<(), StoreError>;

    /// Delete a document. Returns whether it existed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    /// All documents whose field equals the filter value.
    async fn query(
        &self,
        collection: Collection,
        filter: &FieldFilter,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Every document in a collection.
    async fn list(&self, collection: Collection) -> Result<Vec<StoredDocument>, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Generate a fresh document key.
pub(crate) fn generate_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
