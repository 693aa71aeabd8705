//! Repository for the `doc_commits` table.

use annotask_core::annotation::DocAnnotations;
use annotask_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::doc_commit::{CommitSummaryRow, DocCommitRow};

/// Column list for doc_commits queries.
const COLUMNS: &str = "id, document_id, task_id, doc_annotations, prev_commit_id, created_at";

/// Summary columns: snapshot sizes instead of the snapshot body.
const SUMMARY_COLUMNS: &str = "id, document_id, task_id, prev_commit_id, created_at, \
    jsonb_array_length(COALESCE(doc_annotations -> 'annotations', '[]'::jsonb)) AS annotation_count, \
    jsonb_array_length(COALESCE(doc_annotations -> 'relations', '[]'::jsonb)) AS relation_count";

/// Provides reads and appends on the commit chain. Commits are never updated.
pub struct DocCommitRepo;

impl DocCommitRepo {
    /// Find a commit by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DocCommitRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM doc_commits WHERE id = $1");
        sqlx::query_as::<_, DocCommitRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Walk a document's chain from its head back to the root.
    pub async fn list_chain(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<Vec<CommitSummaryRow>, sqlx::Error> {
        let query = format!(
            "WITH RECURSIVE chain AS (
                 SELECT c.*, 0 AS depth
                 FROM doc_commits c
                 JOIN documents d ON d.head_commit_id = c.id
                 WHERE d.id = $1
                 UNION ALL
                 SELECT c.*, chain.depth + 1
                 FROM doc_commits c
                 JOIN chain ON c.id = chain.prev_commit_id
             )
             SELECT {SUMMARY_COLUMNS} FROM chain ORDER BY depth ASC"
        );
        sqlx::query_as::<_, CommitSummaryRow>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a commit whose parent is `prev_commit_id`.
    pub async fn insert(
        conn: &mut PgConnection,
        document_id: DbId,
        task_id: DbId,
        prev_commit_id: Option<DbId>,
        snapshot: &DocAnnotations,
    ) -> Result<DocCommitRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO doc_commits (document_id, task_id, doc_annotations, prev_commit_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocCommitRow>(&query)
            .bind(document_id)
            .bind(task_id)
            .bind(Json(snapshot))
            .bind(prev_commit_id)
            .fetch_one(conn)
            .await
    }
}
