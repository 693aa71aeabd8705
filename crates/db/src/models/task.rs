//! Task model.
//!
//! The page range is stored as two integer columns so the exclusion
//! constraint can index it; the status as a `task_statuses` id.

use annotask_core::delta::TaskDeltaAnnotations;
use annotask_core::error::CoreError;
use annotask_core::page_range::PageRange;
use annotask_core::task::{Task, TaskStatus};
use annotask_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use sqlx::types::Json;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: DbId,
    pub document_id: DbId,
    pub user_id: DbId,
    pub page_start: i32,
    pub page_end: i32,
    pub description: String,
    pub status_id: i16,
    pub completed_at: Option<Timestamp>,
    pub base_commit_id: Option<DbId>,
    pub comments: String,
    pub marked_complete: bool,
    pub delta_annotations: Json<TaskDeltaAnnotations>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<TaskRow> for Task {
    type Error = CoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            document_id: row.document_id,
            user_id: row.user_id,
            page_range: PageRange::new(row.page_start, row.page_end),
            description: row.description,
            status: TaskStatus::from_id(row.status_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
            base_commit_id: row.base_commit_id,
            comments: row.comments,
            marked_complete: row.marked_complete,
            delta_annotations: row.delta_annotations.0,
        })
    }
}
