//! Task delta model: pending create / modify / delete edits of one task.

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, RelationGroup};
use crate::error::CoreError;
use crate::page_range::PageRange;

/// Lifecycle tag of a single delta entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaStatus {
    Created,
    Modified,
    Deleted,
}

impl DeltaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }
}

/// An annotation edit: the full annotation plus what happened to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnnotation {
    #[serde(flatten)]
    pub annotation: Annotation,
    pub status: DeltaStatus,
}

/// A relation edit: the full relation plus what happened to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRelationGroup {
    #[serde(flatten)]
    pub relation: RelationGroup,
    pub status: DeltaStatus,
}

/// The complete pending edit set of one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDeltaAnnotations {
    #[serde(default)]
    pub annotations: Vec<TaskAnnotation>,
    #[serde(default)]
    pub relations: Vec<TaskRelationGroup>,
}

impl TaskDeltaAnnotations {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Total number of delta entries (annotations and relations).
    pub fn len(&self) -> usize {
        self.annotations.len() + self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.relations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Limits applied to a delta set before it is stored on a task.
#[derive(Debug, Clone, Copy)]
pub struct DeltaLimits {
    /// Maximum number of delta entries (annotations + relations).
    pub max_entries: usize,
    /// When set, every annotation delta must lie on a page of this 0-based range.
    pub pages: Option<PageRange>,
}

/// Validate a delta set against `limits`.
///
/// Identifiers must be non-empty. Annotation pages must be non-negative and,
/// when `limits.pages` is set, inside that range.
pub fn validate_deltas(
    deltas: &TaskDeltaAnnotations,
    limits: &DeltaLimits,
) -> Result<(), CoreError> {
    if deltas.len() > limits.max_entries {
        return Err(CoreError::Validation(format!(
            "Delta set has {} entries, maximum is {}",
            deltas.len(),
            limits.max_entries
        )));
    }

    for (i, delta) in deltas.annotations.iter().enumerate() {
        let ann = &delta.annotation;
        if ann.id.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "annotations[{i}] has an empty id"
            )));
        }
        if ann.page < 0 {
            return Err(CoreError::Validation(format!(
                "annotation '{}' has negative page index {}",
                ann.id, ann.page
            )));
        }
        if let Some(pages) = limits.pages {
            if !pages.is_within(ann.page) {
                return Err(CoreError::InvalidRange(format!(
                    "annotation '{}' is on page {} which is outside the task's pages {}",
                    ann.id,
                    ann.page + 1,
                    PageRange::new(pages.start + 1, pages.end + 1)
                )));
            }
        }
    }

    for (i, delta) in deltas.relations.iter().enumerate() {
        if delta.relation.id.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "relations[{i}] has an empty id"
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
