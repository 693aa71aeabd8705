//! Repository for the `documents` table.

use annotask_core::document::NewDocument;
use annotask_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::document::DocumentRow;

/// Column list for documents queries.
const COLUMNS: &str = "id, name, total_pages, head_commit_id, file_ref, created_at, updated_at";

/// Provides CRUD and head-pointer operations for documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Register a document with no commits.
    pub async fn create(pool: &PgPool, input: &NewDocument) -> Result<DocumentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO documents (name, total_pages, file_ref)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(input.name.trim())
            .bind(input.total_pages)
            .bind(&input.file_ref)
            .fetch_one(pool)
            .await
    }

    /// Find a document by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DocumentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = $1");
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all documents, oldest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<DocumentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents ORDER BY id ASC");
        sqlx::query_as::<_, DocumentRow>(&query).fetch_all(pool).await
    }

    /// Load a document and hold its row lock until the transaction ends.
    ///
    /// Serializes task creation and commits on the same document.
    pub async fn lock(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<DocumentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Move the head to `new_head` only if it is still `expected`.
    ///
    /// Returns `false` when the head has moved.
    pub async fn advance_head(
        conn: &mut PgConnection,
        id: DbId,
        expected: Option<DbId>,
        new_head: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE documents SET head_commit_id = $3
             WHERE id = $1 AND head_commit_id IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(expected)
        .bind(new_head)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
