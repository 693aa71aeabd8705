//! Commit model. The snapshot is stored as JSONB.

use annotask_core::annotation::DocAnnotations;
use annotask_core::document::{CommitSummary, DocCommit};
use annotask_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use sqlx::types::Json;

/// A row from the `doc_commits` table.
#[derive(Debug, Clone, FromRow)]
pub struct DocCommitRow {
    pub id: DbId,
    pub document_id: DbId,
    pub task_id: Option<DbId>,
    pub doc_annotations: Json<DocAnnotations>,
    pub prev_commit_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl From<DocCommitRow> for DocCommit {
    fn from(row: DocCommitRow) -> Self {
        DocCommit {
            id: row.id,
            document_id: row.document_id,
            task_id: row.task_id,
            created_at: row.created_at,
            doc_annotations: row.doc_annotations.0,
            prev_commit_id: row.prev_commit_id,
        }
    }
}

/// A history row: commit metadata plus snapshot sizes computed in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct CommitSummaryRow {
    pub id: DbId,
    pub document_id: DbId,
    pub task_id: Option<DbId>,
    pub prev_commit_id: Option<DbId>,
    pub created_at: Timestamp,
    pub annotation_count: i32,
    pub relation_count: i32,
}

impl From<CommitSummaryRow> for CommitSummary {
    fn from(row: CommitSummaryRow) -> Self {
        CommitSummary {
            id: row.id,
            document_id: row.document_id,
            task_id: row.task_id,
            created_at: row.created_at,
            prev_commit_id: row.prev_commit_id,
            annotation_count: usize::try_from(row.annotation_count).unwrap_or(0),
            relation_count: usize::try_from(row.relation_count).unwrap_or(0),
        }
    }
}
