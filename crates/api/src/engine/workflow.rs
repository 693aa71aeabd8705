use annotask_core::annotation::DocAnnotations;
use annotask_core::authz::{self, Actor};
use annotask_core::delta::{self, DeltaLimits, TaskDeltaAnnotations};
use annotask_core::document::{CommitSummary, DocCommit, Document, NewCommit, NewDocument};
use annotask_core::error::CoreError;
use annotask_core::merge;
use annotask_core::page_range::PageRange;
use annotask_core::store::AnnotationStore;
use annotask_core::task::{
    self, NewTask, Task, TaskFilter, TaskOperation, DEFAULT_MAX_DESCRIPTION_LENGTH,
};
use annotask_core::types::DbId;
use serde::Deserialize;

/// Default cap on the number of delta entries stored on one task.
const DEFAULT_MAX_DELTA_ENTRIES: usize = 5000;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Limits and policies of the workflow engine.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Maximum annotation + relation deltas per task.
    pub max_delta_entries: usize,
    /// Maximum task description length in bytes.
    pub max_description_length: usize,
    /// Reject annotation deltas on pages outside the task's range.
    pub restrict_deltas_to_range: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_delta_entries: DEFAULT_MAX_DELTA_ENTRIES,
            max_description_length: DEFAULT_MAX_DESCRIPTION_LENGTH,
            restrict_deltas_to_range: true,
        }
    }
}

impl WorkflowConfig {
    /// Load workflow limits from environment variables with defaults.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `MAX_DELTA_ENTRIES`           | `5000`  |
    /// | `MAX_TASK_DESCRIPTION_LENGTH` | `2000`  |
    /// | `RESTRICT_DELTAS_TO_RANGE`    | `true`  |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_delta_entries: usize = std::env::var("MAX_DELTA_ENTRIES")
            .map(|v| v.parse().expect("MAX_DELTA_ENTRIES must be a valid usize"))
            .unwrap_or(defaults.max_delta_entries);

        let max_description_length: usize = std::env::var("MAX_TASK_DESCRIPTION_LENGTH")
            .map(|v| {
                v.parse()
                    .expect("MAX_TASK_DESCRIPTION_LENGTH must be a valid usize")
            })
            .unwrap_or(defaults.max_description_length);

        let restrict_deltas_to_range: bool = std::env::var("RESTRICT_DELTAS_TO_RANGE")
            .map(|v| {
                v.parse()
                    .expect("RESTRICT_DELTAS_TO_RANGE must be true or false")
            })
            .unwrap_or(defaults.restrict_deltas_to_range);

        Self {
            max_delta_entries,
            max_description_length,
            restrict_deltas_to_range,
        }
    }
}

/// Request body for creating a task. The page range is 1-based.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTaskInput {
    pub user_id: DbId,
    #[serde(alias = "doc_id")]
    pub document_id: DbId,
    pub page_range: PageRange,
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Task and document operations over an [`AnnotationStore`].
pub struct TaskWorkflow<S> {
    store: S,
    config: WorkflowConfig,
}

impl<S: AnnotationStore> TaskWorkflow<S> {
    pub fn new(store: S, config: WorkflowConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -- documents ----------------------------------------------------------

    pub async fn get_document(&self, id: DbId) -> Result<Document, CoreError> {
        self.store
            .get_document(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Document",
                id,
            })
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>, CoreError> {
        self.store.list_documents().await
    }

    /// Register a document's metadata and blob reference.
    pub async fn create_document(&self, input: &NewDocument) -> Result<Document, CoreError> {
        input.validate()?;
        let doc = self.store.create_document(input).await?;
        tracing::info!(
            document_id = doc.id,
            total_pages = doc.total_pages,
            "Document registered"
        );
        Ok(doc)
    }

    /// Current head commit of a document, if any.
    pub async fn head_of(&self, document_id: DbId) -> Result<Option<DbId>, CoreError> {
        Ok(self.get_document(document_id).await?.head_commit_id)
    }

    /// Commit history of a document, newest first.
    pub async fn list_commits(&self, document_id: DbId) -> Result<Vec<CommitSummary>, CoreError> {
        self.store.list_commits(document_id).await
    }

    pub async fn get_commit(&self, id: DbId) -> Result<DocCommit, CoreError> {
        self.store.get_commit(id).await?.ok_or(CoreError::NotFound {
            entity: "DocCommit",
            id,
        })
    }

    /// The snapshot stored at commit `id`.
    pub async fn commit_annotations(&self, id: DbId) -> Result<DocAnnotations, CoreError> {
        Ok(self.get_commit(id).await?.doc_annotations)
    }

    /// The snapshot at the document's head, or an empty one before the
    /// first commit.
    pub async fn document_annotations(
        &self,
        document_id: DbId,
    ) -> Result<DocAnnotations, CoreError> {
        let head = self.head_of(document_id).await?;
        self.snapshot_at(head).await
    }

    async fn snapshot_at(&self, commit_id: Option<DbId>) -> Result<DocAnnotations, CoreError> {
        match commit_id {
            None => Ok(DocAnnotations::empty()),
            Some(id) => self.commit_annotations(id).await,
        }
    }

    // -- task lifecycle -----------------------------------------------------

    /// Create an active task based on the document's current head.
    pub async fn create_task(&self, input: NewTaskInput) -> Result<Task, CoreError> {
        self.get_document(input.document_id).await?;
        if !self.store.user_exists(input.user_id).await? {
            return Err(CoreError::NotFound {
                entity: "User",
                id: input.user_id,
            });
        }
        task::validate_description(&input.description, self.config.max_description_length)?;

        let task = self
            .store
            .create_task(NewTask {
                document_id: input.document_id,
                user_id: input.user_id,
                page_range: input.page_range,
                description: input.description,
            })
            .await?;

        tracing::info!(
            task_id = task.id,
            document_id = task.document_id,
            user_id = task.user_id,
            pages = %task.page_range,
            "Task created"
        );
        Ok(task)
    }

    pub async fn get_task(&self, id: DbId) -> Result<Task, CoreError> {
        self.store
            .get_task(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Task", id })
    }

    pub async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>, CoreError> {
        self.store.list_tasks(filter).await
    }

    /// Merge the task's deltas into the snapshot it was based on, restricted
    /// to the task's pages.
    pub async fn combined_annotations(&self, task_id: DbId) -> Result<DocAnnotations, CoreError> {
        let task = self.get_task(task_id).await?;
        let base = self.snapshot_at(task.base_commit_id).await?;
        Ok(merge::combine(
            &base,
            &task.delta_annotations,
            Some(task.page_range.to_zero_based()),
        ))
    }

    pub async fn task_deltas(&self, task_id: DbId) -> Result<TaskDeltaAnnotations, CoreError> {
        Ok(self.get_task(task_id).await?.delta_annotations)
    }

    /// Replace the task's deltas wholesale.
    pub async fn replace_deltas(
        &self,
        task_id: DbId,
        actor: &Actor,
        deltas: TaskDeltaAnnotations,
    ) -> Result<Task, CoreError> {
        let task = self.get_task(task_id).await?;
        authz::ensure_can_mutate_task(task.user_id, actor)?;
        task.status.ensure_allows(TaskOperation::EditDeltas)?;

        let limits = DeltaLimits {
            max_entries: self.config.max_delta_entries,
            pages: self
                .config
                .restrict_deltas_to_range
                .then(|| task.page_range.to_zero_based()),
        };
        delta::validate_deltas(&deltas, &limits)?;

        let updated = self
            .store
            .update_task_deltas(task_id, &deltas)
            .await?
            .ok_or_else(|| no_longer_active(task_id))?;
        tracing::debug!(
            task_id,
            entries = deltas.len(),
            "Task deltas replaced"
        );
        Ok(updated)
    }

    pub async fn set_comments(
        &self,
        task_id: DbId,
        actor: &Actor,
        comments: &str,
    ) -> Result<Task, CoreError> {
        let task = self.get_task(task_id).await?;
        authz::ensure_can_mutate_task(task.user_id, actor)?;
        task.status.ensure_allows(TaskOperation::EditComments)?;

        self.store
            .update_task_comments(task_id, comments)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Task",
                id: task_id,
            })
    }

    /// Set the annotator's own completion flag. Does not change `status`.
    pub async fn set_marked_complete(
        &self,
        task_id: DbId,
        actor: &Actor,
        marked_complete: bool,
    ) -> Result<Task, CoreError> {
        let task = self.get_task(task_id).await?;
        authz::ensure_can_mutate_task(task.user_id, actor)?;
        task.status.ensure_allows(TaskOperation::MarkComplete)?;

        self.store
            .set_task_marked_complete(task_id, marked_complete)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Task",
                id: task_id,
            })
    }

    /// Merge the task into the document's current head and append the
    /// result as a new commit, completing the task.
    ///
    /// The merge keeps every page. If another commit lands between reading
    /// the head and appending, or the task's deltas are replaced in that
    /// window, the store rejects the append with a conflict and nothing is
    /// written.
    pub async fn commit_task(&self, task_id: DbId) -> Result<DocCommit, CoreError> {
        let task = self.get_task(task_id).await?;
        task.status.ensure_allows(TaskOperation::Commit)?;

        let doc = self.get_document(task.document_id).await?;
        let base = self.snapshot_at(doc.head_commit_id).await?;
        let snapshot = merge::combine(&base, &task.delta_annotations, None);

        let commit = self
            .store
            .append_commit(NewCommit {
                document_id: doc.id,
                task_id: task.id,
                expected_head: doc.head_commit_id,
                deltas: task.delta_annotations,
                snapshot,
            })
            .await?;

        tracing::info!(
            task_id,
            document_id = doc.id,
            commit_id = commit.id,
            prev_commit_id = ?commit.prev_commit_id,
            annotations = commit.doc_annotations.annotation_count(),
            "Task committed"
        );
        Ok(commit)
    }

    /// Dismiss an active task, freeing its page range without touching the
    /// document.
    pub async fn dismiss_task(&self, task_id: DbId) -> Result<Task, CoreError> {
        let task = self.get_task(task_id).await?;
        task.status.ensure_allows(TaskOperation::Dismiss)?;

        let dismissed = self
            .store
            .dismiss_task(task_id)
            .await?
            .ok_or_else(|| no_longer_active(task_id))?;
        tracing::info!(task_id, document_id = task.document_id, "Task dismissed");
        Ok(dismissed)
    }

    /// Delete an active task.
    pub async fn delete_task(&self, task_id: DbId) -> Result<(), CoreError> {
        let task = self.get_task(task_id).await?;
        task.status.ensure_allows(TaskOperation::Delete)?;

        if !self.store.delete_task(task_id).await? {
            return Err(no_longer_active(task_id));
        }
        tracing::info!(task_id, document_id = task.document_id, "Task deleted");
        Ok(())
    }
}

/// A conditional store update missed because the task left `active` after
/// it was read.
fn no_longer_active(task_id: DbId) -> CoreError {
    CoreError::Conflict(format!(
        "Task {task_id} is already completed or dismissed"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use annotask_core::annotation::fixtures::{annotation, relation};
    use annotask_core::delta::{DeltaStatus, TaskAnnotation, TaskRelationGroup};
    use annotask_core::memory::MemoryStore;
    use annotask_core::roles::{ROLE_ADMIN, ROLE_ANNOTATOR};
    use annotask_core::task::TaskStatus;
    use assert_matches::assert_matches;

    struct Fixture {
        workflow: TaskWorkflow<MemoryStore>,
        admin: Actor,
        annotator: Actor,
        document_id: DbId,
    }

    async fn fixture(total_pages: i32) -> Fixture {
        let workflow = TaskWorkflow::new(MemoryStore::new(), WorkflowConfig::default());
        let admin = Actor::new(workflow.store().add_user(ROLE_ADMIN).await, ROLE_ADMIN);
        let annotator = Actor::new(
            workflow.store().add_user(ROLE_ANNOTATOR).await,
            ROLE_ANNOTATOR,
        );
        let doc = workflow
            .create_document(&NewDocument {
                name: "manual.pdf".to_string(),
                total_pages,
                file_ref: "blob/manual".to_string(),
            })
            .await
            .unwrap();
        Fixture {
            workflow,
            admin,
            annotator,
            document_id: doc.id,
        }
    }

    fn task_input(document_id: DbId, user_id: DbId, start: i32, end: i32) -> NewTaskInput {
        NewTaskInput {
            user_id,
            document_id,
            page_range: PageRange::new(start, end),
            description: String::new(),
        }
    }

    fn created(id: &str, page: i32) -> TaskAnnotation {
        TaskAnnotation {
            annotation: annotation(id, page),
            status: DeltaStatus::Created,
        }
    }

    fn deltas(annotations: Vec<TaskAnnotation>) -> TaskDeltaAnnotations {
        TaskDeltaAnnotations {
            annotations,
            relations: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_task_requires_document_and_user() {
        let f = fixture(10).await;

        let err = f
            .workflow
            .create_task(task_input(999, f.annotator.user_id, 1, 2))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Document", .. });

        let err = f
            .workflow
            .create_task(task_input(f.document_id, 999, 1, 2))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "User", .. });
    }

    #[tokio::test]
    async fn create_task_bases_on_current_head() {
        let f = fixture(10).await;
        let task = f
            .workflow
            .create_task(task_input(f.document_id, f.annotator.user_id, 1, 5))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Active);
        assert_eq!(task.base_commit_id, None);
        assert!(task.delta_annotations.is_empty());
    }

    #[tokio::test]
    async fn create_task_rejects_long_description() {
        let f = fixture(10).await;
        let mut input = task_input(f.document_id, f.annotator.user_id, 1, 2);
        input.description = "x".repeat(DEFAULT_MAX_DESCRIPTION_LENGTH + 1);

        let err = f.workflow.create_task(input).await.unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[tokio::test]
    async fn create_task_rejects_bad_or_overlapping_ranges() {
        let f = fixture(10).await;
        let user = f.annotator.user_id;
        f.workflow
            .create_task(task_input(f.document_id, user, 1, 5))
            .await
            .unwrap();

        for (start, end) in [(0, 2), (4, 3), (9, 11), (5, 7)] {
            let err = f
                .workflow
                .create_task(task_input(f.document_id, user, start, end))
                .await
                .unwrap_err();
            assert_matches!(err, CoreError::InvalidRange(_), "range [{start}, {end}]");
        }

        f.workflow
            .create_task(task_input(f.document_id, user, 6, 10))
            .await
            .unwrap();
    }

    // -----------------------------------------------------------------------
    // Deltas
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn only_owner_or_admin_may_replace_deltas() {
        let f = fixture(10).await;
        let task = f
            .workflow
            .create_task(task_input(f.document_id, f.annotator.user_id, 1, 5))
            .await
            .unwrap();
        let outsider = Actor::new(
            f.workflow.store().add_user(ROLE_ANNOTATOR).await,
            ROLE_ANNOTATOR,
        );

        let err = f
            .workflow
            .replace_deltas(task.id, &outsider, deltas(vec![created("a1", 0)]))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Forbidden(_));

        f.workflow
            .replace_deltas(task.id, &f.annotator, deltas(vec![created("a1", 0)]))
            .await
            .unwrap();
        let updated = f
            .workflow
            .replace_deltas(task.id, &f.admin, deltas(vec![created("a2", 1)]))
            .await
            .unwrap();
        assert_eq!(updated.delta_annotations.annotations.len(), 1);
        assert_eq!(updated.delta_annotations.annotations[0].annotation.id, "a2");
    }

    #[tokio::test]
    async fn deltas_outside_task_pages_are_rejected() {
        let f = fixture(10).await;
        let task = f
            .workflow
            .create_task(task_input(f.document_id, f.annotator.user_id, 1, 5))
            .await
            .unwrap();

        // Page index 5 is page 6, one past the task's range.
        let err = f
            .workflow
            .replace_deltas(task.id, &f.annotator, deltas(vec![created("a1", 5)]))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::InvalidRange(_));
    }

    #[tokio::test]
    async fn delta_entry_limit_is_enforced() {
        let mut f = fixture(10).await;
        f.workflow.config.max_delta_entries = 2;
        let task = f
            .workflow
            .create_task(task_input(f.document_id, f.annotator.user_id, 1, 5))
            .await
            .unwrap();

        let too_many = deltas(vec![created("a1", 0), created("a2", 0), created("a3", 0)]);
        let err = f
            .workflow
            .replace_deltas(task.id, &f.annotator, too_many)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[tokio::test]
    async fn combined_view_filters_pages_and_dangling_relations() {
        let f = fixture(10).await;
        let task = f
            .workflow
            .create_task(task_input(f.document_id, f.annotator.user_id, 1, 10))
            .await
            .unwrap();
        let set = TaskDeltaAnnotations {
            annotations: vec![created("a1", 0), created("a2", 9)],
            relations: vec![TaskRelationGroup {
                relation: relation("r1", &["a1"], &["a2"]),
                status: DeltaStatus::Created,
            }],
        };
        f.workflow
            .replace_deltas(task.id, &f.annotator, set)
            .await
            .unwrap();

        let view = f.workflow.combined_annotations(task.id).await.unwrap();
        assert_eq!(view.annotation_count(), 2);
        assert_eq!(view.relation_count(), 1);

        // Commit everything, then a task over page 1 only sees a1.
        f.workflow.commit_task(task.id).await.unwrap();
        let narrow = f
            .workflow
            .create_task(task_input(f.document_id, f.annotator.user_id, 1, 1))
            .await
            .unwrap();
        let view = f.workflow.combined_annotations(narrow.id).await.unwrap();
        assert!(view.contains_annotation("a1"));
        assert!(!view.contains_annotation("a2"));
        assert_eq!(view.relation_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Commit chain and state machine
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn commits_chain_and_complete_tasks() {
        let f = fixture(10).await;
        let user = f.annotator.user_id;
        let t1 = f
            .workflow
            .create_task(task_input(f.document_id, user, 1, 5))
            .await
            .unwrap();
        let t2 = f
            .workflow
            .create_task(task_input(f.document_id, user, 6, 10))
            .await
            .unwrap();
        f.workflow
            .replace_deltas(t1.id, &f.annotator, deltas(vec![created("a1", 0)]))
            .await
            .unwrap();
        f.workflow
            .replace_deltas(t2.id, &f.annotator, deltas(vec![created("a2", 7)]))
            .await
            .unwrap();

        let c1 = f.workflow.commit_task(t1.id).await.unwrap();
        assert_eq!(c1.prev_commit_id, None);
        assert_eq!(c1.task_id, Some(t1.id));

        // t2 was based on the empty document but merges against the new head.
        let c2 = f.workflow.commit_task(t2.id).await.unwrap();
        assert_eq!(c2.prev_commit_id, Some(c1.id));
        assert!(c2.doc_annotations.contains_annotation("a1"));
        assert!(c2.doc_annotations.contains_annotation("a2"));

        assert_eq!(f.workflow.head_of(f.document_id).await.unwrap(), Some(c2.id));
        let history: Vec<DbId> = f
            .workflow
            .list_commits(f.document_id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(history, vec![c2.id, c1.id]);

        let t1 = f.workflow.get_task(t1.id).await.unwrap();
        assert_eq!(t1.status, TaskStatus::Completed);
        assert!(t1.completed_at.is_some());
        assert_eq!(t1.delta_annotations.annotations.len(), 1);
    }

    #[tokio::test]
    async fn terminal_tasks_reject_lifecycle_operations() {
        let f = fixture(10).await;
        let task = f
            .workflow
            .create_task(task_input(f.document_id, f.annotator.user_id, 1, 5))
            .await
            .unwrap();
        f.workflow.commit_task(task.id).await.unwrap();

        assert_matches!(
            f.workflow.commit_task(task.id).await,
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            f.workflow.dismiss_task(task.id).await,
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            f.workflow.delete_task(task.id).await,
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            f.workflow
                .replace_deltas(task.id, &f.annotator, TaskDeltaAnnotations::empty())
                .await,
            Err(CoreError::Conflict(_))
        );

        // Comments and the annotator flag stay editable.
        let task = f
            .workflow
            .set_comments(task.id, &f.annotator, "all done")
            .await
            .unwrap();
        assert_eq!(task.comments, "all done");
        let task = f
            .workflow
            .set_marked_complete(task.id, &f.annotator, true)
            .await
            .unwrap();
        assert!(task.marked_complete);
    }

    #[tokio::test]
    async fn dismiss_frees_range_without_touching_document() {
        let f = fixture(10).await;
        let user = f.annotator.user_id;
        let task = f
            .workflow
            .create_task(task_input(f.document_id, user, 1, 5))
            .await
            .unwrap();

        let dismissed = f.workflow.dismiss_task(task.id).await.unwrap();
        assert_eq!(dismissed.status, TaskStatus::Dismissed);
        assert!(dismissed.completed_at.is_some());
        assert_eq!(f.workflow.head_of(f.document_id).await.unwrap(), None);

        f.workflow
            .create_task(task_input(f.document_id, user, 3, 4))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_removes_active_task() {
        let f = fixture(10).await;
        let task = f
            .workflow
            .create_task(task_input(f.document_id, f.annotator.user_id, 1, 5))
            .await
            .unwrap();

        f.workflow.delete_task(task.id).await.unwrap();
        assert_matches!(
            f.workflow.get_task(task.id).await,
            Err(CoreError::NotFound { entity: "Task", .. })
        );
    }

    #[tokio::test]
    async fn list_tasks_filters_by_user_and_document() {
        let f = fixture(10).await;
        f.workflow
            .create_task(task_input(f.document_id, f.annotator.user_id, 1, 5))
            .await
            .unwrap();
        f.workflow
            .create_task(task_input(f.document_id, f.admin.user_id, 6, 10))
            .await
            .unwrap();

        let mine = f
            .workflow
            .list_tasks(TaskFilter {
                user_id: Some(f.annotator.user_id),
                document_id: None,
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        let on_doc = f
            .workflow
            .list_tasks(TaskFilter {
                user_id: None,
                document_id: Some(f.document_id),
            })
            .await
            .unwrap();
        assert_eq!(on_doc.len(), 2);
    }

    #[tokio::test]
    async fn document_snapshot_is_empty_before_first_commit() {
        let f = fixture(3).await;
        let snapshot = f.workflow.document_annotations(f.document_id).await.unwrap();
        assert!(snapshot.is_empty());
        assert_matches!(
            f.workflow.get_commit(42).await,
            Err(CoreError::NotFound { entity: "DocCommit", .. })
        );
    }

    // -----------------------------------------------------------------------
    // End to end
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn annotate_commit_and_reassign_pages() {
        let f = fixture(10).await;
        let user = f.annotator.user_id;

        let t1 = f
            .workflow
            .create_task(task_input(f.document_id, user, 1, 5))
            .await
            .unwrap();
        f.workflow
            .create_task(task_input(f.document_id, user, 6, 10))
            .await
            .unwrap();

        f.workflow
            .replace_deltas(t1.id, &f.annotator, deltas(vec![created("a1", 2)]))
            .await
            .unwrap();
        let view = f.workflow.combined_annotations(t1.id).await.unwrap();
        assert_eq!(view.annotation_count(), 1);

        let commit = f.workflow.commit_task(t1.id).await.unwrap();
        assert!(commit.doc_annotations.contains_annotation("a1"));

        let t3 = f
            .workflow
            .create_task(task_input(f.document_id, user, 1, 5))
            .await
            .unwrap();
        assert_eq!(t3.base_commit_id, Some(commit.id));
        let view = f.workflow.combined_annotations(t3.id).await.unwrap();
        assert!(view.contains_annotation("a1"));
    }
}
