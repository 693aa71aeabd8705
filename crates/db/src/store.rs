//! [`AnnotationStore`] backed by PostgreSQL.
//!
//! Task creation and commit append each run in one transaction holding the
//! document's row lock. The `ex_tasks_active_pages` exclusion constraint and
//! the head compare-and-set back the lock up at the schema level.

use annotask_core::delta::TaskDeltaAnnotations;
use annotask_core::document::{CommitSummary, DocCommit, Document, NewCommit, NewDocument};
use annotask_core::error::CoreError;
use annotask_core::page_range::{self, PageRange};
use annotask_core::store::AnnotationStore;
use annotask_core::task::{NewTask, Task, TaskFilter, TaskOperation, TaskStatus};
use annotask_core::types::DbId;

use crate::models::task::TaskRow;
use crate::repositories::{DocCommitRepo, DocumentRepo, TaskRepo, UserRepo};
use crate::DbPool;

/// PostgreSQL exclusion constraint violation.
const EXCLUSION_VIOLATION: &str = "23P01";
/// PostgreSQL unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map a sqlx error onto the domain error the workflow understands.
pub fn store_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or("unknown");
        match db_err.code().as_deref() {
            Some(EXCLUSION_VIOLATION) => {
                return CoreError::InvalidRange(
                    "range overlaps an active task on the same document".to_string(),
                );
            }
            Some(UNIQUE_VIOLATION) if constraint.starts_with("uq_doc_commits") => {
                return CoreError::Conflict(
                    "Document history moved while committing; reload and retry".to_string(),
                );
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return CoreError::Validation(format!(
                    "Referenced row does not exist ({constraint})"
                ));
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal(format!("Database error: {err}"))
}

fn to_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, CoreError> {
    rows.into_iter().map(Task::try_from).collect()
}

fn to_task(row: Option<TaskRow>) -> Result<Option<Task>, CoreError> {
    row.map(Task::try_from).transpose()
}

/// Store over a PostgreSQL pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl AnnotationStore for PgStore {
    async fn get_document(&self, id: DbId) -> Result<Option<Document>, CoreError> {
        let row = DocumentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(Document::from))
    }

    async fn list_documents(&self) -> Result<Vec<Document>, CoreError> {
        let rows = DocumentRepo::list(&self.pool).await.map_err(store_error)?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn create_document(&self, input: &NewDocument) -> Result<Document, CoreError> {
        input.validate()?;
        let row = DocumentRepo::create(&self.pool, input)
            .await
            .map_err(store_error)?;
        Ok(row.into())
    }

    async fn user_exists(&self, id: DbId) -> Result<bool, CoreError> {
        UserRepo::exists(&self.pool, id).await.map_err(store_error)
    }

    async fn get_commit(&self, id: DbId) -> Result<Option<DocCommit>, CoreError> {
        let row = DocCommitRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(DocCommit::from))
    }

    async fn list_commits(&self, document_id: DbId) -> Result<Vec<CommitSummary>, CoreError> {
        if DocumentRepo::find_by_id(&self.pool, document_id)
            .await
            .map_err(store_error)?
            .is_none()
        {
            return Err(CoreError::NotFound {
                entity: "Document",
                id: document_id,
            });
        }
        let rows = DocCommitRepo::list_chain(&self.pool, document_id)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(CommitSummary::from).collect())
    }

    async fn append_commit(&self, input: NewCommit) -> Result<DocCommit, CoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let doc = DocumentRepo::lock(&mut tx, input.document_id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound {
                entity: "Document",
                id: input.document_id,
            })?;
        if doc.head_commit_id != input.expected_head {
            return Err(CoreError::Conflict(format!(
                "Document {} head moved while committing; reload and retry",
                doc.id
            )));
        }

        // Holding the task row blocks concurrent delta writes until the
        // transaction ends; they then miss the `status_id = Active` guard.
        let locked = TaskRepo::lock(&mut tx, input.task_id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound {
                entity: "Task",
                id: input.task_id,
            })?;
        if locked.document_id != doc.id {
            return Err(CoreError::Validation(format!(
                "Task {} does not belong to document {}",
                locked.id, doc.id
            )));
        }
        TaskStatus::from_id(locked.status_id)?.ensure_allows(TaskOperation::Commit)?;
        if locked.delta_annotations.0 != input.deltas {
            return Err(CoreError::Conflict(format!(
                "Task {} deltas changed while committing; reload and retry",
                locked.id
            )));
        }

        let task = TaskRepo::finish(&mut tx, locked.id, TaskStatus::Completed)
            .await
            .map_err(store_error)?
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "Task {} changed while committing; reload and retry",
                    locked.id
                ))
            })?;

        let commit = DocCommitRepo::insert(
            &mut tx,
            doc.id,
            task.id,
            input.expected_head,
            &input.snapshot,
        )
        .await
        .map_err(store_error)?;

        let advanced = DocumentRepo::advance_head(&mut tx, doc.id, input.expected_head, commit.id)
            .await
            .map_err(store_error)?;
        if !advanced {
            return Err(CoreError::Conflict(format!(
                "Document {} head moved while committing; reload and retry",
                doc.id
            )));
        }

        tx.commit().await.map_err(store_error)?;
        Ok(commit.into())
    }

    async fn create_task(&self, input: NewTask) -> Result<Task, CoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let doc = DocumentRepo::lock(&mut tx, input.document_id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound {
                entity: "Document",
                id: input.document_id,
            })?;

        let active: Vec<PageRange> = TaskRepo::active_ranges(&mut tx, doc.id)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|(start, end)| PageRange::new(start, end))
            .collect();
        page_range::validate_range(&input.page_range, doc.total_pages, &active)?;

        let row = TaskRepo::insert(&mut tx, &input, doc.head_commit_id)
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;
        row.try_into()
    }

    async fn get_task(&self, id: DbId) -> Result<Option<Task>, CoreError> {
        to_task(TaskRepo::find_by_id(&self.pool, id).await.map_err(store_error)?)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>, CoreError> {
        to_tasks(TaskRepo::list(&self.pool, &filter).await.map_err(store_error)?)
    }

    async fn update_task_deltas(
        &self,
        id: DbId,
        deltas: &TaskDeltaAnnotations,
    ) -> Result<Option<Task>, CoreError> {
        to_task(
            TaskRepo::update_deltas(&self.pool, id, deltas)
                .await
                .map_err(store_error)?,
        )
    }

    async fn update_task_comments(
        &self,
        id: DbId,
        comments: &str,
    ) -> Result<Option<Task>, CoreError> {
        to_task(
            TaskRepo::update_comments(&self.pool, id, comments)
                .await
                .map_err(store_error)?,
        )
    }

    async fn set_task_marked_complete(
        &self,
        id: DbId,
        marked_complete: bool,
    ) -> Result<Option<Task>, CoreError> {
        to_task(
            TaskRepo::set_marked_complete(&self.pool, id, marked_complete)
                .await
                .map_err(store_error)?,
        )
    }

    async fn dismiss_task(&self, id: DbId) -> Result<Option<Task>, CoreError> {
        let mut conn = self.pool.acquire().await.map_err(store_error)?;
        to_task(
            TaskRepo::finish(&mut conn, id, TaskStatus::Dismissed)
                .await
                .map_err(store_error)?,
        )
    }

    async fn delete_task(&self, id: DbId) -> Result<bool, CoreError> {
        TaskRepo::delete_active(&self.pool, id)
            .await
            .map_err(store_error)
    }
}
