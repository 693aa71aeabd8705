//! Delta merge engine.
//!
//! Combines a base snapshot with a task's deltas and optionally scopes the
//! result to a page range. Pure and deterministic: the same inputs always
//! produce the same snapshot.

use crate::annotation::DocAnnotations;
use crate::delta::{DeltaStatus, TaskDeltaAnnotations};
use crate::page_range::PageRange;

/// Apply `deltas` to `base`, then restrict to `pages` (0-based) if given.
///
/// - `created` and `modified` both insert-or-replace by identifier; the last
///   entry for an id wins within one pass.
/// - `deleted` removes the entry if present.
///
/// Relations left referencing a missing annotation are always dropped, with
/// or without a page range. Without a range every page is kept, which is what
/// the commit path needs.
pub fn combine(
    base: &DocAnnotations,
    deltas: &TaskDeltaAnnotations,
    pages: Option<PageRange>,
) -> DocAnnotations {
    let merged = apply_deltas(base.clone(), deltas);
    restrict(merged, pages)
}

/// Apply every annotation delta, then every relation delta, in list order.
pub fn apply_deltas(base: DocAnnotations, deltas: &TaskDeltaAnnotations) -> DocAnnotations {
    let with_annotations = deltas.annotations.iter().fold(base, |doc, delta| {
        match delta.status {
            DeltaStatus::Created | DeltaStatus::Modified => {
                doc.with_annotation(delta.annotation.clone())
            }
            DeltaStatus::Deleted => doc.without_annotation(&delta.annotation.id),
        }
    });

    deltas
        .relations
        .iter()
        .fold(with_annotations, |doc, delta| match delta.status {
            DeltaStatus::Created | DeltaStatus::Modified => {
                doc.with_relation(delta.relation.clone())
            }
            DeltaStatus::Deleted => doc.without_relation(&delta.relation.id),
        })
}

/// Keep annotations on `pages` (all pages when `None`), then keep only the
/// relations whose every source and target survived.
pub fn restrict(doc: DocAnnotations, pages: Option<PageRange>) -> DocAnnotations {
    match pages {
        Some(range) => doc.retain_annotations(|a| range.is_within(a.page)),
        None => doc.retain_annotations(|_| true),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::fixtures::{annotation, relation};
    use crate::annotation::Annotation;
    use crate::delta::{TaskAnnotation, TaskRelationGroup};

    fn ann_delta(ann: Annotation, status: DeltaStatus) -> TaskAnnotation {
        TaskAnnotation {
            annotation: ann,
            status,
        }
    }

    fn base_doc() -> DocAnnotations {
        DocAnnotations::from_parts(
            vec![annotation("a1", 1), annotation("a2", 10)],
            vec![relation("r1", &["a1"], &["a2"])],
        )
    }

    #[test]
    fn empty_deltas_leave_base_unchanged() {
        let base = base_doc();
        assert_eq!(combine(&base, &TaskDeltaAnnotations::empty(), None), base);
    }

    #[test]
    fn combine_does_not_touch_base() {
        let base = base_doc();
        let deltas = TaskDeltaAnnotations {
            annotations: vec![ann_delta(annotation("a1", 1), DeltaStatus::Deleted)],
            relations: vec![],
        };
        let _ = combine(&base, &deltas, None);
        assert_eq!(base, base_doc());
    }

    #[test]
    fn created_annotation_kept_inside_range() {
        let deltas = TaskDeltaAnnotations {
            annotations: vec![ann_delta(annotation("new", 3), DeltaStatus::Created)],
            relations: vec![],
        };
        // Pages [1,5] are indices [0,4].
        let inside = combine(
            &DocAnnotations::empty(),
            &deltas,
            Some(PageRange::new(1, 5).to_zero_based()),
        );
        assert!(inside.contains_annotation("new"));

        // Pages [5,9] are indices [4,8].
        let outside = combine(
            &DocAnnotations::empty(),
            &deltas,
            Some(PageRange::new(5, 9).to_zero_based()),
        );
        assert!(!outside.contains_annotation("new"));
    }

    #[test]
    fn filtering_drops_dangling_relation() {
        let doc = combine(&base_doc(), &TaskDeltaAnnotations::empty(), Some(PageRange::new(1, 1)));
        assert!(doc.contains_annotation("a1"));
        assert!(!doc.contains_annotation("a2"));
        assert_eq!(doc.relation_count(), 0);
    }

    #[test]
    fn modified_replaces_existing() {
        let mut changed = annotation("a1", 1);
        changed.text = Some("renamed".to_string());
        let deltas = TaskDeltaAnnotations {
            annotations: vec![ann_delta(changed, DeltaStatus::Modified)],
            relations: vec![],
        };
        let doc = combine(&base_doc(), &deltas, None);
        assert_eq!(doc.annotation("a1").unwrap().text.as_deref(), Some("renamed"));
        assert_eq!(doc.annotation_count(), 2);
    }

    #[test]
    fn modified_on_absent_id_inserts() {
        let deltas = TaskDeltaAnnotations {
            annotations: vec![ann_delta(annotation("ghost", 2), DeltaStatus::Modified)],
            relations: vec![],
        };
        let doc = combine(&DocAnnotations::empty(), &deltas, None);
        assert!(doc.contains_annotation("ghost"));
    }

    #[test]
    fn duplicate_created_last_wins() {
        let deltas = TaskDeltaAnnotations {
            annotations: vec![
                ann_delta(annotation("dup", 1), DeltaStatus::Created),
                ann_delta(annotation("dup", 2), DeltaStatus::Created),
            ],
            relations: vec![],
        };
        let doc = combine(&DocAnnotations::empty(), &deltas, None);
        assert_eq!(doc.annotation_count(), 1);
        assert_eq!(doc.annotation("dup").unwrap().page, 2);
    }

    #[test]
    fn deleting_annotation_drops_its_relations_on_commit_path() {
        let deltas = TaskDeltaAnnotations {
            annotations: vec![ann_delta(annotation("a2", 10), DeltaStatus::Deleted)],
            relations: vec![],
        };
        let doc = combine(&base_doc(), &deltas, None);
        assert!(doc.contains_annotation("a1"));
        assert!(!doc.contains_annotation("a2"));
        assert!(doc.relation("r1").is_none());
        assert!(doc.dangling_relations().is_empty());
    }

    #[test]
    fn relation_deltas_apply_after_annotations() {
        let deltas = TaskDeltaAnnotations {
            annotations: vec![ann_delta(annotation("a3", 1), DeltaStatus::Created)],
            relations: vec![
                TaskRelationGroup {
                    relation: relation("r2", &["a1"], &["a3"]),
                    status: DeltaStatus::Created,
                },
                TaskRelationGroup {
                    relation: relation("r1", &["a1"], &["a2"]),
                    status: DeltaStatus::Deleted,
                },
            ],
        };
        let doc = combine(&base_doc(), &deltas, None);
        assert!(doc.relation("r2").is_some());
        assert!(doc.relation("r1").is_none());
    }

    #[test]
    fn unfiltered_commit_keeps_pages_outside_task_range() {
        let deltas = TaskDeltaAnnotations {
            annotations: vec![ann_delta(annotation("a3", 0), DeltaStatus::Created)],
            relations: vec![],
        };
        let doc = combine(&base_doc(), &deltas, None);
        assert_eq!(doc.annotation_count(), 3);
        assert!(doc.contains_annotation("a2"));
    }

    #[test]
    fn combine_is_deterministic() {
        let deltas = TaskDeltaAnnotations {
            annotations: vec![
                ann_delta(annotation("a3", 2), DeltaStatus::Created),
                ann_delta(annotation("a1", 1), DeltaStatus::Deleted),
            ],
            relations: vec![],
        };
        let first = combine(&base_doc(), &deltas, Some(PageRange::new(0, 4)));
        let second = combine(&base_doc(), &deltas, Some(PageRange::new(0, 4)));
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
