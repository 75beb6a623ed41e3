//! `PostgreSQL` document store.
//!
//! Documents are rows of `refill.documents (collection, id, body JSONB)`.
//! Equality queries use `JSONB` containment so the GIN index on `body`
//! applies. Partial updates lock the row, apply the [`Patch`] in Rust and
//! write the whole body back inside one transaction.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::{
    Collection, DocumentStore, FieldFilter, Patch, StoreError, StoredDocument, generate_key,
};

/// Document store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the default pool settings.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the connection cannot be established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, sqlx::Error> {
        create_pool(database_url).await.map(Self::new)
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

fn ensure_object(data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject)
    }
}

fn rows_to_documents(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<StoredDocument>, StoreError> {
    rows.into_iter()
        .map(|row| {
            let id: String = row.try_get("id")?;
            let Json(data): Json<Value> = row.try_get("body")?;
            Ok(StoredDocument { id, data })
        })
        .collect()
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT body
            FROM refill.documents
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_get::<Json<Value>, _>("body").map(|Json(body)| body))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<(), StoreError> {
        ensure_object(&data)?;
        sqlx::query(
            r"
            INSERT INTO refill.documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = now()
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&data))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<(), StoreError> {
        ensure_object(&data)?;
        let result = sqlx::query(
            r"
            INSERT INTO refill.documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&data))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists {
                collection,
                id: id.to_owned(),
            });
        }
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
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r"
            SELECT body
            FROM refill.documents
            WHERE collection = $1 AND id = $2
            FOR UPDATE
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            collection,
            id: id.to_owned(),
        })?;

        let Json(mut body): Json<Value> = row.try_get("body")?;
        patch.apply(&mut body)?;

        sqlx::query(
            r"
            UPDATE refill.documents
            SET body = $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&body))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM refill.documents
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &FieldFilter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT id, body
            FROM refill.documents
            WHERE collection = $1 AND body @> $2
            ORDER BY id
            ",
        )
        .bind(collection.as_str())
        .bind(Json(filter.containment()))
        .fetch_all(&self.pool)
        .await?;

        rows_to_documents(rows)
    }

    async fn list(&self, collection: Collection) -> Result<Vec<StoredDocument>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT id, body
            FROM refill.documents
            WHERE collection = $1
            ORDER BY id
            ",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows_to_documents(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
