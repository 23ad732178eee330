//! Document store access: eligible-document fetch and embedding write-back.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::StoreError;
use crate::models::{PendingDocument, StoreConfig};

/// Store of candidate documents and their embedding updates.
///
/// Any store offering filtered fetch-with-projection and grouped update of
/// the embedding field satisfies this contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> Result<bool, StoreError>;

    /// Count documents currently lacking an embedding.
    async fn count_pending(&self) -> Result<u64, StoreError>;

    /// Fetch every document lacking an embedding, projecting only the
    /// identifier and text fields, in a stable order.
    async fn fetch_pending(&self) -> Result<Vec<PendingDocument>, StoreError>;

    /// Write each vector onto the document at the same position, as a single
    /// grouped write. Returns the number of documents actually modified,
    /// which may be lower than `documents.len()` if a row vanished
    /// concurrently. Callers must pass slices of equal length.
    async fn apply_embeddings(
        &self,
        documents: &[PendingDocument],
        embeddings: &[Vec<f32>],
    ) -> Result<u64, StoreError>;

    /// Release the underlying connection. Called exactly once per run.
    async fn close(&self);

    /// Get the table the store operates on.
    fn table(&self) -> &str;
}

pub struct PgDocumentStore {
    pool: PgPool,
    table_name: String,
    table: String,
}

impl PgDocumentStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_secs(config.pool_acquire_timeout.into()))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let store = Self {
            pool,
            table_name: config.qualified_table_name(),
            table: config.table.clone(),
        };

        store.check_pgvector_extension().await?;

        Ok(store)
    }

    async fn check_pgvector_extension(&self) -> Result<(), StoreError> {
        let result: Option<(String,)> =
            sqlx::query_as("SELECT extname FROM pg_extension WHERE extname = 'vector'")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::QueryError(e.to_string()))?;

        if result.is_none() {
            return Err(StoreError::ExtensionError(
                "pgvector extension is not installed. Run: CREATE EXTENSION vector;".to_string(),
            ));
        }

        Ok(())
    }
}

fn fetch_statement(table_name: &str) -> String {
    format!(
        "SELECT id, COALESCE(text, '') AS text FROM {} WHERE embedding IS NULL ORDER BY id",
        table_name
    )
}

fn update_statement(table_name: &str) -> String {
    format!(
        r#"
        UPDATE {} AS d
        SET embedding = u.embedding
        FROM (SELECT unnest($1::text[]) AS id, unnest($2::vector[]) AS embedding) AS u
        WHERE d.id = u.id
        "#,
        table_name
    )
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| StoreError::ConnectionError(e.to_string()))
    }

    async fn count_pending(&self) -> Result<u64, StoreError> {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE embedding IS NULL",
            self.table_name
        );
        let row: (i64,) = sqlx::query_as(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))?;

        Ok(row.0 as u64)
    }

    async fn fetch_pending(&self) -> Result<Vec<PendingDocument>, StoreError> {
        let rows: Vec<(String, String)> = sqlx::query_as(&fetch_statement(&self.table_name))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, text)| PendingDocument { id, text })
            .collect())
    }

    async fn apply_embeddings(
        &self,
        documents: &[PendingDocument],
        embeddings: &[Vec<f32>],
    ) -> Result<u64, StoreError> {
        debug_assert_eq!(documents.len(), embeddings.len());

        if documents.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = documents.iter().map(|doc| doc.id.clone()).collect();
        let vectors: Vec<Vector> = embeddings.iter().map(|e| Vector::from(e.clone())).collect();

        let result = sqlx::query(&update_statement(&self.table_name))
            .bind(&ids)
            .bind(&vectors)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::UpdateError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn table(&self) -> &str {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_statement_projects_and_filters() {
        let sql = fetch_statement("search.documents");
        assert!(sql.contains("FROM search.documents"));
        assert!(sql.contains("WHERE embedding IS NULL"));
        assert!(sql.contains("COALESCE(text, '')"));
        assert!(!sql.contains("SELECT *"));
    }

    #[test]
    fn test_update_statement_is_grouped() {
        let sql = update_statement("documents");
        assert!(sql.contains("UPDATE documents"));
        assert!(sql.contains("unnest($1::text[])"));
        assert!(sql.contains("unnest($2::vector[])"));
    }
}
