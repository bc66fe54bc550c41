use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{DocStore, DocumentStream, Result, StoreError};

/// PostgreSQL-backed document store.
///
/// All collections share a single `documents` table keyed by
/// `(collection, id)` with the body held in a JSONB column. Field lookups go
/// through the jsonb `->` operator; the expression index created by the
/// migrations covers the fields the services query by.
#[derive(Clone)]
pub struct PostgresDocStore {
    pool: PgPool,
}

impl PostgresDocStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_doc(row: PgRow) -> Result<Value> {
        Ok(row.try_get("doc")?)
    }
}

#[async_trait]
impl DocStore for PostgresDocStore {
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<()> {
        sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(&doc)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("documents_pkey")
                {
                    return StoreError::DuplicateDocument {
                        collection: collection.to_string(),
                        id,
                    };
                }
                StoreError::Database(e)
            })?;

        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT doc FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_doc).transpose()
    }

    async fn put(&self, collection: &str, id: Uuid, doc: Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET
                doc = EXCLUDED.doc,
                updated_at = now()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&doc)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_one_by(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>> {
        let row = sqlx::query(
            r#"
            SELECT doc FROM documents
            WHERE collection = $1 AND doc -> $2 = $3
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_doc).transpose()
    }

    async fn find_all_by(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM documents
            WHERE collection = $1 AND doc -> $2 = $3
            ORDER BY id ASC
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_doc).collect()
    }

    async fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let rows = sqlx::query("SELECT doc FROM documents WHERE collection = $1 ORDER BY id ASC")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_doc).collect()
    }

    async fn stream_all(&self, collection: &str) -> Result<DocumentStream> {
        use futures_util::StreamExt;

        let stream =
            sqlx::query("SELECT doc FROM documents WHERE collection = $1 ORDER BY id ASC")
                .bind(collection.to_string())
                .fetch(&self.pool)
                .map(|result| match result {
                    Ok(row) => Self::row_to_doc(row),
                    Err(e) => Err(StoreError::Database(e)),
                });

        Ok(Box::pin(stream))
    }

    async fn find_and_update(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<Value>> {
        let row = sqlx::query(
            r#"
            UPDATE documents
            SET doc = doc || $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            RETURNING doc
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&patch)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_doc).transpose()
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
                .bind(collection)
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }
}
