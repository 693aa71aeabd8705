//! Page ranges and the page-range allocator rules.
//!
//! Tasks are assigned an inclusive, 1-based page range. At most one *active*
//! task may cover any given page of a document; completed and dismissed tasks
//! never block a range.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An inclusive page range `[start, end]`.
///
/// Ranges received from clients are 1-based. Annotation page indices are
/// 0-based, so the merge engine works on [`PageRange::to_zero_based`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: i32,
    pub end: i32,
}

impl PageRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Two inclusive ranges `[a,b]` and `[c,d]` overlap iff `a <= d && c <= b`.
    ///
    /// Touching at a single shared page counts as an overlap.
    pub fn overlaps(&self, other: &PageRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Whether `page` lies within the range (both ends inclusive).
    pub fn is_within(&self, page: i32) -> bool {
        self.start <= page && page <= self.end
    }

    /// Shift a 1-based range to the 0-based page indices used by annotations.
    pub fn to_zero_based(self) -> PageRange {
        PageRange {
            start: self.start - 1,
            end: self.end - 1,
        }
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate the static bounds of a 1-based range against a document.
///
/// Rules, checked in order: `start >= 1`, `start <= end`, `end <= total_pages`.
pub fn validate_bounds(range: &PageRange, total_pages: i32) -> Result<(), CoreError> {
    if range.start < 1 {
        return Err(CoreError::InvalidRange(format!(
            "invalid page range {range}: start page must be at least 1"
        )));
    }
    if range.start > range.end {
        return Err(CoreError::InvalidRange(format!(
            "invalid page range {range}: start page is after end page"
        )));
    }
    if range.end > total_pages {
        return Err(CoreError::InvalidRange(format!(
            "invalid page range {range}: document has only {total_pages} pages"
        )));
    }
    Ok(())
}

/// Validate a new task range for a document.
///
/// `active_ranges` must hold the ranges of every other *active* task on the
/// same document, read from a consistent snapshot. Callers that persist the
/// task must hold that snapshot until the insert lands.
pub fn validate_range<'a, I>(
    range: &PageRange,
    total_pages: i32,
    active_ranges: I,
) -> Result<(), CoreError>
where
    I: IntoIterator<Item = &'a PageRange>,
{
    validate_bounds(range, total_pages)?;

    if let Some(taken) = active_ranges.into_iter().find(|r| r.overlaps(range)) {
        return Err(CoreError::InvalidRange(format!(
            "range {range} overlaps an active task covering pages {taken}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
