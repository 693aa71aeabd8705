//! Persistence contract consumed by the task workflow.
//!
//! Implementations must make the multi-step writes atomic:
//!
//! - [`AnnotationStore::create_task`] validates the page range against the
//!   active tasks of the document and inserts the task as one unit, so two
//!   concurrent requests cannot both claim overlapping pages.
//! - [`AnnotationStore::append_commit`] inserts the commit, advances the
//!   document head and completes the task as one unit.
//!
//! Conditional task updates return `Ok(None)` when the task is missing or not
//! in a state that allows the update; the caller decides which error that is.

use std::future::Future;

use crate::delta::TaskDeltaAnnotations;
use crate::document::{CommitSummary, DocCommit, Document, NewCommit, NewDocument};
use crate::error::CoreError;
use crate::task::{NewTask, Task, TaskFilter};
use crate::types::DbId;

pub trait AnnotationStore: Send + Sync {
    // -- documents ----------------------------------------------------------

    fn get_document(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<Document>, CoreError>> + Send;

    fn list_documents(&self) -> impl Future<Output = Result<Vec<Document>, CoreError>> + Send;

    fn create_document(
        &self,
        input: &NewDocument,
    ) -> impl Future<Output = Result<Document, CoreError>> + Send;

    // -- users --------------------------------------------------------------

    fn user_exists(&self, id: DbId) -> impl Future<Output = Result<bool, CoreError>> + Send;

    // -- commit chain -------------------------------------------------------

    fn get_commit(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<DocCommit>, CoreError>> + Send;

    /// Summaries of a document's commits, newest first. Snapshot bodies are
    /// not loaded.
    fn list_commits(
        &self,
        document_id: DbId,
    ) -> impl Future<Output = Result<Vec<CommitSummary>, CoreError>> + Send;

    /// Append a commit and complete its task atomically.
    ///
    /// Fails with `NotFound` if the document or task is missing, and with
    /// `Conflict` (writing nothing) if the document head is no longer
    /// `expected_head`, the task is no longer active, or the task's deltas
    /// are no longer `input.deltas`. Delta writes to the task are serialized
    /// with the append.
    fn append_commit(
        &self,
        input: NewCommit,
    ) -> impl Future<Output = Result<DocCommit, CoreError>> + Send;

    // -- tasks --------------------------------------------------------------

    /// Insert an active task based on the document's current head.
    ///
    /// Fails with `NotFound` if the document is missing and `InvalidRange`
    /// if the range is out of bounds or overlaps another active task.
    fn create_task(&self, input: NewTask) -> impl Future<Output = Result<Task, CoreError>> + Send;

    fn get_task(&self, id: DbId) -> impl Future<Output = Result<Option<Task>, CoreError>> + Send;

    fn list_tasks(
        &self,
        filter: TaskFilter,
    ) -> impl Future<Output = Result<Vec<Task>, CoreError>> + Send;

    /// Replace the deltas of an *active* task.
    fn update_task_deltas(
        &self,
        id: DbId,
        deltas: &TaskDeltaAnnotations,
    ) -> impl Future<Output = Result<Option<Task>, CoreError>> + Send;

    fn update_task_comments(
        &self,
        id: DbId,
        comments: &str,
    ) -> impl Future<Output = Result<Option<Task>, CoreError>> + Send;

    fn set_task_marked_complete(
        &self,
        id: DbId,
        marked_complete: bool,
    ) -> impl Future<Output = Result<Option<Task>, CoreError>> + Send;

    /// Move an *active* task to dismissed, stamping `completed_at`.
    fn dismiss_task(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<Task>, CoreError>> + Send;

    /// Delete an *active* task. Returns `true` if a row was removed.
    fn delete_task(&self, id: DbId) -> impl Future<Output = Result<bool, CoreError>> + Send;
}
