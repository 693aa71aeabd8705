//! Repository for the `tasks` table.
//!
//! Updates that require an active task carry `status_id = Active` in their
//! `WHERE` clause and return `None` when no row matched.

use annotask_core::delta::TaskDeltaAnnotations;
use annotask_core::task::{NewTask, TaskFilter, TaskStatus};
use annotask_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::task::TaskRow;

/// Column list for tasks queries.
const COLUMNS: &str = "id, document_id, user_id, page_start, page_end, description, \
    status_id, completed_at, base_commit_id, comments, marked_complete, \
    delta_annotations, created_at, updated_at";

/// Provides CRUD and state-guarded updates for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert an active task with empty deltas.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewTask,
        base_commit_id: Option<DbId>,
    ) -> Result<TaskRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks
                (document_id, user_id, page_start, page_end, description,
                 status_id, base_commit_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(input.document_id)
            .bind(input.user_id)
            .bind(input.page_range.start)
            .bind(input.page_range.end)
            .bind(&input.description)
            .bind(TaskStatus::Active.id())
            .bind(base_commit_id)
            .fetch_one(conn)
            .await
    }

    /// Page ranges `(start, end)` of a document's active tasks.
    pub async fn active_ranges(
        conn: &mut PgConnection,
        document_id: DbId,
    ) -> Result<Vec<(i32, i32)>, sqlx::Error> {
        sqlx::query_as::<_, (i32, i32)>(
            "SELECT page_start, page_end FROM tasks
             WHERE document_id = $1 AND status_id = $2
             ORDER BY page_start ASC",
        )
        .bind(document_id)
        .bind(TaskStatus::Active.id())
        .fetch_all(conn)
        .await
    }

    /// Find a task by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TaskRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a task row for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Option<TaskRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List tasks matching the optional user and document filters.
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<TaskRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::BIGINT IS NULL OR document_id = $2)
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(filter.user_id)
            .bind(filter.document_id)
            .fetch_all(pool)
            .await
    }

    /// Replace the deltas of an active task.
    pub async fn update_deltas(
        pool: &PgPool,
        id: DbId,
        deltas: &TaskDeltaAnnotations,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET delta_annotations = $2
             WHERE id = $1 AND status_id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .bind(Json(deltas))
            .bind(TaskStatus::Active.id())
            .fetch_optional(pool)
            .await
    }

    /// Replace the comments of a task in any state.
    pub async fn update_comments(
        pool: &PgPool,
        id: DbId,
        comments: &str,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let query = format!("UPDATE tasks SET comments = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .bind(comments)
            .fetch_optional(pool)
            .await
    }

    /// Set the annotator's completion flag on a task in any state.
    pub async fn set_marked_complete(
        pool: &PgPool,
        id: DbId,
        marked_complete: bool,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let query =
            format!("UPDATE tasks SET marked_complete = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .bind(marked_complete)
            .fetch_optional(pool)
            .await
    }

    /// Move an active task to a terminal status, stamping `completed_at`.
    pub async fn finish(
        conn: &mut PgConnection,
        id: DbId,
        target: TaskStatus,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET status_id = $2, completed_at = NOW()
             WHERE id = $1 AND status_id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .bind(target.id())
            .bind(TaskStatus::Active.id())
            .fetch_optional(conn)
            .await
    }

    /// Delete an active task. Returns `true` if a row was removed.
    pub async fn delete_active(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND status_id = $2")
            .bind(id)
            .bind(TaskStatus::Active.id())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
