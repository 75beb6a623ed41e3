//! Subscription plan repository.

use refill_core::{PlanId, UserId};

use super::{RepositoryError, decode, decode_all, encode};
use crate::models::{Plan, PlanRecord};
use crate::store::{Collection, DocumentStore};

const COLLECTION: Collection = Collection::Subscriptions;

/// Repository for admin and custom plans.
pub struct PlanRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> PlanRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Store an admin plan under a generated key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn create(&self, plan: &Plan) -> Result<PlanId, RepositoryError> {
        let id = self.store.add(COLLECTION, encode(plan)?).await?;
        Ok(PlanId::new(id))
    }

    /// Store a user's custom plan, keyed by their user ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has one.
    pub async fn create_custom(&self, owner: &UserId, plan: &Plan) -> Result<PlanId, RepositoryError> {
        self.store
            .create(COLLECTION, owner.as_str(), encode(plan)?)
            .await?;
        Ok(PlanId::new(owner.as_str()))
    }

    /// Get a plan by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the document is invalid.
    pub async fn get(&self, id: &PlanId) -> Result<Option<Plan>, RepositoryError> {
        self.store
            .get(COLLECTION, id.as_str())
            .await?
            .map(|data| decode(COLLECTION, id.as_str(), data))
            .transpose()
    }

    /// Every stored plan, admin and custom.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if any document is invalid.
    pub async fn list(&self) -> Result<Vec<PlanRecord>, RepositoryError> {
        let docs = self.store.list(COLLECTION).await?;
        Ok(decode_all(COLLECTION, docs)?
            .into_iter()
            .map(|(id, plan)| PlanRecord { id, plan })
            .collect())
    }
}
