//! Documents and the per-document commit chain.
//!
//! Commits form a singly-linked list per document through `prev_commit_id`;
//! the document's `head_commit_id` points at the newest one. Commits are
//! stored in a table keyed by id, never as an object graph.

use serde::{Deserialize, Serialize};

use crate::annotation::DocAnnotations;
use crate::delta::TaskDeltaAnnotations;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Maximum allowed length for a document name.
pub const MAX_DOCUMENT_NAME_LENGTH: usize = 255;

/// An uploaded PDF document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DbId,
    pub name: String,
    pub total_pages: i32,
    /// Newest commit; `None` until the first task is committed.
    pub head_commit_id: Option<DbId>,
    /// Reference to the source PDF in blob storage.
    pub file_ref: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for registering a document.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
    pub name: String,
    pub total_pages: i32,
    pub file_ref: String,
}

impl NewDocument {
    pub fn validate(&self) -> Result<(), CoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation(
                "Document name must not be empty".to_string(),
            ));
        }
        if self.name.len() > MAX_DOCUMENT_NAME_LENGTH {
            return Err(CoreError::Validation(format!(
                "Document name must not exceed {MAX_DOCUMENT_NAME_LENGTH} characters, got {}",
                self.name.len()
            )));
        }
        if self.total_pages < 1 {
            return Err(CoreError::Validation(format!(
                "Document must have at least one page, got {}",
                self.total_pages
            )));
        }
        if self.file_ref.trim().is_empty() {
            return Err(CoreError::Validation(
                "Document file reference must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// An immutable full-document annotation snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocCommit {
    pub id: DbId,
    pub document_id: DbId,
    /// Task whose commit produced this snapshot.
    pub task_id: Option<DbId>,
    pub created_at: Timestamp,
    pub doc_annotations: DocAnnotations,
    /// Previous head; `None` for the root commit.
    pub prev_commit_id: Option<DbId>,
}

impl DocCommit {
    pub fn summary(&self) -> CommitSummary {
        CommitSummary {
            id: self.id,
            document_id: self.document_id,
            task_id: self.task_id,
            created_at: self.created_at,
            prev_commit_id: self.prev_commit_id,
            annotation_count: self.doc_annotations.annotation_count(),
            relation_count: self.doc_annotations.relation_count(),
        }
    }
}

/// Commit metadata without the snapshot body, used in history listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub id: DbId,
    pub document_id: DbId,
    pub task_id: Option<DbId>,
    pub created_at: Timestamp,
    pub prev_commit_id: Option<DbId>,
    pub annotation_count: usize,
    pub relation_count: usize,
}

/// A commit to append to a document's chain.
///
/// `expected_head` is the head the snapshot was merged against and `deltas`
/// the task deltas merged into it. The store rejects the append with a
/// conflict if the head has moved or the task's stored deltas differ.
#[derive(Debug, Clone)]
pub struct NewCommit {
    pub document_id: DbId,
    pub task_id: DbId,
    pub expected_head: Option<DbId>,
    pub deltas: TaskDeltaAnnotations,
    pub snapshot: DocAnnotations,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
