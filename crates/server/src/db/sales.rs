//! Sale repository.

use refill_core::{PaymentStatus, SaleId, SaleStatus, SaleType, UserId};

use super::{RepositoryError, decode, decode_all, encode};
use crate::models::{Sale, SaleRecord};
use crate::store::{Collection, DocumentStore, FieldFilter, Patch};

const COLLECTION: Collection = Collection::Sales;

/// Repository for sale records.
pub struct SaleRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> SaleRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Store a new sale under a generated key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn create(&self, sale: &Sale) -> Result<SaleId, RepositoryError> {
        let id = self.store.add(COLLECTION, encode(sale)?).await?;
        Ok(SaleId::new(id))
    }

    /// Get a sale by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the document is invalid.
    pub async fn get(&self, id: &SaleId) -> Result<Option<Sale>, RepositoryError> {
        self.store
            .get(COLLECTION, id.as_str())
            .await?
            .map(|data| decode(COLLECTION, id.as_str(), data))
            .transpose()
    }

    /// Get a sale that must exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such sale.
    pub async fn require(&self, id: &SaleId) -> Result<Sale, RepositoryError> {
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Sales made by one customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if any document is invalid.
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SaleRecord>, RepositoryError> {
        let docs = self
            .store
            .query(COLLECTION, &FieldFilter::eq("user_id", user_id.as_str()))
            .await?;
        Ok(into_records(decode_all(COLLECTION, docs)?))
    }

    /// All sales, optionally restricted to one type, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if any document is invalid.
    pub async fn list(&self, sale_type: Option<SaleType>) -> Result<Vec<SaleRecord>, RepositoryError> {
        let docs = match sale_type {
            Some(t) => {
                self.store
                    .query(COLLECTION, &FieldFilter::eq("type", encode(&t)?))
                    .await?
            }
            None => self.store.list(COLLECTION).await?,
        };
        Ok(into_records(decode_all(COLLECTION, docs)?))
    }

    /// Set the fulfilment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the sale does not exist.
    pub async fn set_status(&self, id: &SaleId, status: SaleStatus) -> Result<(), RepositoryError> {
        let patch = Patch::new().set("status", encode(&status)?);
        self.store.update(COLLECTION, id.as_str(), &patch).await?;
        Ok(())
    }

    /// Mark the sale cancelled and clear any pending referral points on it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the sale does not exist.
    pub async fn cancel(&self, id: &SaleId, has_referral: bool) -> Result<(), RepositoryError> {
        let mut patch = Patch::new().set("status", encode(&SaleStatus::Cancelled)?);
        if has_referral {
            patch = patch.set("referral_details.referral_points_pending", 0);
        }
        self.store.update(COLLECTION, id.as_str(), &patch).await?;
        Ok(())
    }

    /// Mark the sale paid and clear any pending referral points on it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the sale does not exist.
    pub async fn mark_paid(&self, id: &SaleId, has_referral: bool) -> Result<(), RepositoryError> {
        let mut patch = Patch::new().set("payment_status", encode(&PaymentStatus::Paid)?);
        if has_referral {
            patch = patch.set("referral_details.referral_points_pending", 0);
        }
        self.store.update(COLLECTION, id.as_str(), &patch).await?;
        Ok(())
    }
}

fn into_records(mut sales: Vec<(SaleId, Sale)>) -> Vec<SaleRecord> {
    sales.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));
    sales
        .into_iter()
        .map(|(id, sale)| SaleRecord { id, sale })
        .collect()
}
