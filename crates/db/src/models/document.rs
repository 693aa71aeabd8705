//! Document model.

use annotask_core::document::Document;
use annotask_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `documents` table.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: DbId,
    pub name: String,
    pub total_pages: i32,
    pub head_commit_id: Option<DbId>,
    pub file_ref: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            name: row.name,
            total_pages: row.total_pages,
            head_commit_id: row.head_commit_id,
            file_ref: row.file_ref,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
