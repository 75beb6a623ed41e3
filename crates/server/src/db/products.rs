//! Product repository.

use refill_core::ProductId;

use super::{RepositoryError, decode, decode_all, encode};
use crate::models::{Product, ProductRecord};
use crate::store::{Collection, DocumentStore};

const COLLECTION: Collection = Collection::Products;

pub struct ProductRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Store a product under a generated key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn create(&self, product: &Product) -> Result<ProductId, RepositoryError> {
        let id = self.store.add(COLLECTION, encode(product)?).await?;
        Ok(ProductId::new(id))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the document is invalid.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.store
            .get(COLLECTION, id.as_str())
            .await?
            .map(|data| decode(COLLECTION, id.as_str(), data))
            .transpose()
    }

    /// All products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if any document is invalid.
    pub async fn list(&self) -> Result<Vec<ProductRecord>, RepositoryError> {
        let docs = self.store.list(COLLECTION).await?;
        let mut products: Vec<ProductRecord> = decode_all(COLLECTION, docs)?
            .into_iter()
            .map(|(id, product)| ProductRecord { id, product })
            .collect();
        products.sort_by(|a, b| a.product.created_at.cmp(&b.product.created_at));
        Ok(products)
    }
}
