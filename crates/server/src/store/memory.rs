//! In-process document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    Collection, DocumentStore, FieldFilter, Patch, StoreError, StoredDocument, generate_key,
};

type Documents = BTreeMap<String, Value>;

/// Document store backed by in-memory maps.
///
/// Listing and queries return documents ordered by key. Data is lost when the
/// process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Documents>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_object(data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject)
    }
}

fn to_stored<'a>(docs: impl Iterator<Item = (&'a String, &'a Value)>) -> Vec<StoredDocument> {
    docs.map(|(id, data)| StoredDocument {
        id: id.clone(),
        data: data.clone(),
    })
    .collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<(), StoreError> {
        ensure_object(&data)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection)
            .or_default()
            .insert(id.to_owned(), data);
        Ok(())
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<(), StoreError> {
        ensure_object(&data)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::AlreadyExists {
                collection,
                id: id.to_owned(),
            });
        }
        docs.insert(id.to_owned(), data);
        Ok(())
    }

    async fn add(&self, collection: Collection, data: Value) -> Result<String, StoreError> {
        let id = generate_key();
        self.create(collection, &id, data).await?;
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &Patch,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_owned(),
            })?;

        // Apply to a copy so a failing path leaves the stored document untouched.
        let mut updated = doc.clone();
        patch.apply(&mut updated)?;
        *doc = updated;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &FieldFilter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).map_or_else(Vec::new, |docs| {
            to_stored(docs.iter().filter(|(_, data)| filter.matches(data)))
        }))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map_or_else(Vec::new, |docs| to_stored(docs.iter())))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        store
            .set(Collection::Products, "p1", json!({"name": "Slim gallon"}))
            .await
            .unwrap();

        let doc = store.get(Collection::Products, "p1").await.unwrap().unwrap();
        assert_eq!(doc["name"], "Slim gallon");
        assert!(store.get(Collection::Sales, "p1").await.unwrap().is_none());

        assert!(store.delete(Collection::Products, "p1").await.unwrap());
        assert!(!store.delete(Collection::Products, "p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_refuses_existing_key() {
        let store = MemoryStore::new();
        store
            .create(Collection::Accounts, "a@b.ph", json!({}))
            .await
            .unwrap();
        let err = store
            .create(Collection::Accounts, "a@b.ph", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_add_generates_distinct_keys() {
        let store = MemoryStore::new();
        let a = store.add(Collection::Sales, json!({"n": 1})).await.unwrap();
        let b = store.add(Collection::Sales, json!({"n": 2})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list(Collection::Sales).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::Users, "ghost", &Patch::new().set("a", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_document_intact() {
        let store = MemoryStore::new();
        store
            .set(Collection::Users, "u1", json!({"total_gallons": 40}))
            .await
            .unwrap();

        let patch = Patch::new()
            .set("subscription_status", "active")
            .set("total_gallons.nested", 1);
        assert!(store.update(Collection::Users, "u1", &patch).await.is_err());

        let doc = store.get(Collection::Users, "u1").await.unwrap().unwrap();
        assert_eq!(doc, json!({"total_gallons": 40}));
    }

    #[tokio::test]
    async fn test_query_by_nested_field() {
        let store = MemoryStore::new();
        store
            .set(
                Collection::Users,
                "u1",
                json!({"referral_details": {"referral_code": "REF-AAAA1111"}}),
            )
            .await
            .unwrap();
        store
            .set(
                Collection::Users,
                "u2",
                json!({"referral_details": {"referral_code": "REF-BBBB2222"}}),
            )
            .await
            .unwrap();

        let found = store
            .query(
                Collection::Users,
                &FieldFilter::eq("referral_details.referral_code", "REF-BBBB2222"),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "u2");
    }

    #[tokio::test]
    async fn test_rejects_non_object_documents() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set(Collection::Users, "u1", json!("nope")).await,
            Err(StoreError::NotAnObject)
        ));
    }
}
