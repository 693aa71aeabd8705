//! Tasks and the task state machine.
//!
//! ```text
//! active ──commit──▶ completed
//!    └────dismiss──▶ dismissed
//! ```
//!
//! Both end states are terminal. Delta edits and deletion are only legal
//! while a task is active.

use serde::{Deserialize, Serialize};

use crate::delta::TaskDeltaAnnotations;
use crate::error::CoreError;
use crate::page_range::PageRange;
use crate::types::{DbId, Timestamp};

/// Maximum allowed length for a task description, unless configured otherwise.
pub const DEFAULT_MAX_DESCRIPTION_LENGTH: usize = 2000;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Task lifecycle status. Discriminants match the `task_statuses` seed rows.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active = 1,
    Completed = 2,
    Dismissed = 3,
}

/// Operations gated by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOperation {
    Commit,
    Dismiss,
    Delete,
    EditDeltas,
    EditComments,
    MarkComplete,
}

impl TaskOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Dismiss => "dismiss",
            Self::Delete => "delete",
            Self::EditDeltas => "edit annotations of",
            Self::EditComments => "edit comments of",
            Self::MarkComplete => "mark complete",
        }
    }
}

impl TaskStatus {
    /// Return the database status ID.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Parse from the database status ID.
    pub fn from_id(id: i16) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::Active),
            2 => Ok(Self::Completed),
            3 => Ok(Self::Dismissed),
            other => Err(CoreError::Internal(format!(
                "Unknown task status id {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Dismissed => "dismissed",
        }
    }

    /// Whether `op` is legal in this state.
    ///
    /// Comments and the annotator's "marked complete" flag stay editable in
    /// every state; everything else needs an active task.
    pub fn allows(self, op: TaskOperation) -> bool {
        match op {
            TaskOperation::EditComments | TaskOperation::MarkComplete => true,
            TaskOperation::Commit
            | TaskOperation::Dismiss
            | TaskOperation::Delete
            | TaskOperation::EditDeltas => self == Self::Active,
        }
    }

    /// Return a conflict error unless `op` is legal in this state.
    pub fn ensure_allows(self, op: TaskOperation) -> Result<(), CoreError> {
        if self.allows(op) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Cannot {} task: task is already completed or dismissed (status: {})",
                op.as_str(),
                self.as_str()
            )))
        }
    }

    /// Move to `target`, returning the new state or a conflict error.
    pub fn transition(self, target: TaskStatus) -> Result<TaskStatus, CoreError> {
        let op = match target {
            Self::Completed => TaskOperation::Commit,
            Self::Dismissed => TaskOperation::Dismiss,
            Self::Active => {
                return Err(CoreError::Conflict(format!(
                    "Cannot move a {} task back to active",
                    self.as_str()
                )))
            }
        };
        self.ensure_allows(op)?;
        Ok(target)
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// An annotation task assigned to one user over a page range of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: DbId,
    pub document_id: DbId,
    pub user_id: DbId,
    /// 1-based inclusive page range.
    pub page_range: PageRange,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    /// Document head at creation; the base of the task's working view.
    pub base_commit_id: Option<DbId>,
    pub comments: String,
    /// Annotator's own "I'm done" flag, independent of `status`.
    pub marked_complete: bool,
    pub delta_annotations: TaskDeltaAnnotations,
}

/// A task ready to be inserted. Built by the workflow after validation.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub document_id: DbId,
    pub user_id: DbId,
    pub page_range: PageRange,
    pub description: String,
}

/// Optional filters for listing tasks.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TaskFilter {
    pub user_id: Option<DbId>,
    #[serde(alias = "doc_id")]
    pub document_id: Option<DbId>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.user_id.map_or(true, |u| u == task.user_id)
            && self.document_id.map_or(true, |d| d == task.document_id)
    }
}

/// Validate a free-text task description.
pub fn validate_description(description: &str, max_len: usize) -> Result<(), CoreError> {
    if description.len() > max_len {
        return Err(CoreError::Validation(format!(
            "Task description must not exceed {max_len} characters, got {}",
            description.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
