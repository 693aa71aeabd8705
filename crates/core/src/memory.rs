//! In-memory [`AnnotationStore`] used by tests and local tooling.
//!
//! All tables live behind one async mutex, so every store call is linearizable
//! and the multi-step writes (range-checked insert, commit append) are atomic.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::delta::TaskDeltaAnnotations;
use crate::document::{CommitSummary, DocCommit, Document, NewCommit, NewDocument};
use crate::error::CoreError;
use crate::page_range::{self, PageRange};
use crate::store::AnnotationStore;
use crate::task::{NewTask, Task, TaskFilter, TaskStatus};
use crate::types::DbId;

#[derive(Debug, Default)]
struct Tables {
    next_id: DbId,
    documents: BTreeMap<DbId, Document>,
    commits: BTreeMap<DbId, DocCommit>,
    tasks: BTreeMap<DbId, Task>,
    /// user id -> role
    users: BTreeMap<DbId, String>,
}

impl Tables {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn active_ranges(&self, document_id: DbId) -> Vec<PageRange> {
        self.tasks
            .values()
            .filter(|t| t.document_id == document_id && t.status == TaskStatus::Active)
            .map(|t| t.page_range)
            .collect()
    }

    /// Apply `f` to an active task, stamping `updated_at`.
    fn update_active<F>(&mut self, id: DbId, f: F) -> Option<Task>
    where
        F: FnOnce(&mut Task),
    {
        let task = self.tasks.get_mut(&id)?;
        if task.status != TaskStatus::Active {
            return None;
        }
        f(task);
        task.updated_at = Utc::now();
        Some(task.clone())
    }
}

/// Arena-backed store: every table is a map keyed by id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with `role`, returning the new id.
    pub async fn add_user(&self, role: &str) -> DbId {
        let mut tables = self.tables.lock().await;
        let id = tables.allocate_id();
        tables.users.insert(id, role.to_string());
        id
    }
}

impl AnnotationStore for MemoryStore {
    async fn get_document(&self, id: DbId) -> Result<Option<Document>, CoreError> {
        Ok(self.tables.lock().await.documents.get(&id).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<Document>, CoreError> {
        Ok(self.tables.lock().await.documents.values().cloned().collect())
    }

    async fn create_document(&self, input: &NewDocument) -> Result<Document, CoreError> {
        input.validate()?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let doc = Document {
            id: tables.allocate_id(),
            name: input.name.clone(),
            total_pages: input.total_pages,
            head_commit_id: None,
            file_ref: input.file_ref.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.documents.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn user_exists(&self, id: DbId) -> Result<bool, CoreError> {
        Ok(self.tables.lock().await.users.contains_key(&id))
    }

    async fn get_commit(&self, id: DbId) -> Result<Option<DocCommit>, CoreError> {
        Ok(self.tables.lock().await.commits.get(&id).cloned())
    }

    async fn list_commits(&self, document_id: DbId) -> Result<Vec<CommitSummary>, CoreError> {
        let tables = self.tables.lock().await;
        let doc = tables.documents.get(&document_id).ok_or(CoreError::NotFound {
            entity: "Document",
            id: document_id,
        })?;

        // Walk the chain from the head back to the root.
        let mut history = Vec::new();
        let mut cursor = doc.head_commit_id;
        while let Some(id) = cursor {
            let commit = tables.commits.get(&id).ok_or_else(|| {
                CoreError::Internal(format!("Commit chain of document {document_id} is broken at {id}"))
            })?;
            history.push(commit.summary());
            cursor = commit.prev_commit_id;
        }
        Ok(history)
    }

    async fn append_commit(&self, input: NewCommit) -> Result<DocCommit, CoreError> {
        let mut tables = self.tables.lock().await;

        let head = tables
            .documents
            .get(&input.document_id)
            .ok_or(CoreError::NotFound {
                entity: "Document",
                id: input.document_id,
            })?
            .head_commit_id;
        if head != input.expected_head {
            return Err(CoreError::Conflict(format!(
                "Document {} head moved while committing; reload and retry",
                input.document_id
            )));
        }

        let task = tables.tasks.get(&input.task_id).ok_or(CoreError::NotFound {
            entity: "Task",
            id: input.task_id,
        })?;
        let completed = task.status.transition(TaskStatus::Completed)?;
        if task.delta_annotations != input.deltas {
            return Err(CoreError::Conflict(format!(
                "Task {} deltas changed while committing; reload and retry",
                input.task_id
            )));
        }

        let now = Utc::now();
        let commit = DocCommit {
            id: tables.allocate_id(),
            document_id: input.document_id,
            task_id: Some(input.task_id),
            created_at: now,
            doc_annotations: input.snapshot,
            prev_commit_id: head,
        };
        tables.commits.insert(commit.id, commit.clone());

        if let Some(doc) = tables.documents.get_mut(&input.document_id) {
            doc.head_commit_id = Some(commit.id);
            doc.updated_at = now;
        }
        if let Some(task) = tables.tasks.get_mut(&input.task_id) {
            task.status = completed;
            task.completed_at = Some(now);
            task.updated_at = now;
        }

        Ok(commit)
    }

    async fn create_task(&self, input: NewTask) -> Result<Task, CoreError> {
        let mut tables = self.tables.lock().await;
        let doc = tables
            .documents
            .get(&input.document_id)
            .ok_or(CoreError::NotFound {
                entity: "Document",
                id: input.document_id,
            })?;
        let (total_pages, head) = (doc.total_pages, doc.head_commit_id);

        let active = tables.active_ranges(input.document_id);
        page_range::validate_range(&input.page_range, total_pages, &active)?;

        let now = Utc::now();
        let task = Task {
            id: tables.allocate_id(),
            document_id: input.document_id,
            user_id: input.user_id,
            page_range: input.page_range,
            description: input.description,
            status: TaskStatus::Active,
            created_at: now,
            updated_at: now,
            completed_at: None,
            base_commit_id: head,
            comments: String::new(),
            marked_complete: false,
            delta_annotations: TaskDeltaAnnotations::empty(),
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: DbId) -> Result<Option<Task>, CoreError> {
        Ok(self.tables.lock().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>, CoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn update_task_deltas(
        &self,
        id: DbId,
        deltas: &TaskDeltaAnnotations,
    ) -> Result<Option<Task>, CoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.update_active(id, |t| t.delta_annotations = deltas.clone()))
    }

    async fn update_task_comments(
        &self,
        id: DbId,
        comments: &str,
    ) -> Result<Option<Task>, CoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.tasks.get_mut(&id).map(|t| {
            t.comments = comments.to_string();
            t.updated_at = Utc::now();
            t.clone()
        }))
    }

    async fn set_task_marked_complete(
        &self,
        id: DbId,
        marked_complete: bool,
    ) -> Result<Option<Task>, CoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.tasks.get_mut(&id).map(|t| {
            t.marked_complete = marked_complete;
            t.updated_at = Utc::now();
            t.clone()
        }))
    }

    async fn dismiss_task(&self, id: DbId) -> Result<Option<Task>, CoreError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.update_active(id, |t| {
            t.status = TaskStatus::Dismissed;
            t.completed_at = Some(Utc::now());
        }))
    }

    async fn delete_task(&self, id: DbId) -> Result<bool, CoreError> {
        let mut tables = self.tables.lock().await;
        match tables.tasks.get(&id) {
            Some(task) if task.status == TaskStatus::Active => {
                tables.tasks.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
