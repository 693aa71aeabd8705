//! Annotation and relation model plus the document annotation snapshot.
//!
//! A [`DocAnnotations`] snapshot is a pair of maps keyed by identifier. All
//! operations on it are value-in/value-out; nothing mutates a shared snapshot.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Ontology references
// ---------------------------------------------------------------------------

/// Ontology class an annotation is tagged with, carried inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntoClass {
    pub id: String,
    pub text: String,
    pub base_iri: String,
    pub iri: String,
    pub label: String,
    pub color: String,
}

/// Ontology property a relation is tagged with, carried inline.
///
/// Empty `domain` / `range` lists mean the property is unconstrained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntoProperty {
    pub id: String,
    pub text: String,
    pub base_iri: String,
    pub iri: String,
    pub label: String,
    #[serde(default)]
    pub domain: Vec<String>,
    #[serde(default)]
    pub range: Vec<String>,
}

// ---------------------------------------------------------------------------
// Annotations and relations
// ---------------------------------------------------------------------------

/// Spatial bounds of an annotation on its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Reference to a token extracted from the PDF structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    pub page_index: i32,
    pub token_index: i32,
}

/// A single annotated region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    /// 0-based page index.
    pub page: i32,
    pub onto_class: OntoClass,
    pub created_at: Timestamp,
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<TokenRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A relation from one group of annotations to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationGroup {
    pub id: String,
    pub created_at: Timestamp,
    pub source_ids: Vec<String>,
    pub target_ids: Vec<String>,
    pub onto_property: OntoProperty,
}

impl RelationGroup {
    /// Every annotation id the relation references, sources first.
    pub fn referenced_ids(&self) -> impl Iterator<Item = &str> {
        self.source_ids
            .iter()
            .chain(self.target_ids.iter())
            .map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A complete (annotations, relations) snapshot of a document.
///
/// Entries are keyed by identifier. Equality ignores ordering; iteration
/// follows insertion order so views stay stable for clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotWire", into = "SnapshotWire")]
pub struct DocAnnotations {
    annotations: IndexMap<String, Annotation>,
    relations: IndexMap<String, RelationGroup>,
}

/// Wire shape: `{ "annotations": [..], "relations": [..] }`.
#[derive(Serialize, Deserialize)]
struct SnapshotWire {
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(default)]
    relations: Vec<RelationGroup>,
}

impl From<SnapshotWire> for DocAnnotations {
    fn from(wire: SnapshotWire) -> Self {
        Self::from_parts(wire.annotations, wire.relations)
    }
}

impl From<DocAnnotations> for SnapshotWire {
    fn from(doc: DocAnnotations) -> Self {
        Self {
            annotations: doc.annotations.into_values().collect(),
            relations: doc.relations.into_values().collect(),
        }
    }
}

impl DocAnnotations {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from lists. Later entries win on duplicate ids.
    pub fn from_parts(
        annotations: impl IntoIterator<Item = Annotation>,
        relations: impl IntoIterator<Item = RelationGroup>,
    ) -> Self {
        Self {
            annotations: annotations.into_iter().map(|a| (a.id.clone(), a)).collect(),
            relations: relations.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values()
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationGroup> {
        self.relations.values()
    }

    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.annotations.get(id)
    }

    pub fn relation(&self, id: &str) -> Option<&RelationGroup> {
        self.relations.get(id)
    }

    pub fn contains_annotation(&self, id: &str) -> bool {
        self.annotations.contains_key(id)
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.relations.is_empty()
    }

    /// Insert or replace an annotation, keeping the position of a replaced entry.
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.insert(annotation.id.clone(), annotation);
        self
    }

    /// Remove an annotation by id. Absent ids are ignored.
    pub fn without_annotation(mut self, id: &str) -> Self {
        self.annotations.shift_remove(id);
        self
    }

    /// Insert or replace a relation, keeping the position of a replaced entry.
    pub fn with_relation(mut self, relation: RelationGroup) -> Self {
        self.relations.insert(relation.id.clone(), relation);
        self
    }

    /// Remove a relation by id. Absent ids are ignored.
    pub fn without_relation(mut self, id: &str) -> Self {
        self.relations.shift_remove(id);
        self
    }

    /// Keep only annotations matching `keep`, then only relations whose every
    /// source and target id is still present.
    pub fn retain_annotations<F>(self, mut keep: F) -> Self
    where
        F: FnMut(&Annotation) -> bool,
    {
        let annotations: IndexMap<String, Annotation> = self
            .annotations
            .into_iter()
            .filter(|(_, a)| keep(a))
            .collect();

        let relations = self
            .relations
            .into_iter()
            .filter(|(_, r)| r.referenced_ids().all(|id| annotations.contains_key(id)))
            .collect();

        Self {
            annotations,
            relations,
        }
    }

    /// Ids of relations referencing at least one missing annotation.
    pub fn dangling_relations(&self) -> Vec<&str> {
        self.relations
            .values()
            .filter(|r| r.referenced_ids().any(|id| !self.annotations.contains_key(id)))
            .map(|r| r.id.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

/// Small constructors shared by unit tests across the workspace.
pub mod fixtures {
    use super::*;

    pub fn onto_class() -> OntoClass {
        OntoClass {
            id: "c1".to_string(),
            text: "Component".to_string(),
            base_iri: "http://example.org/onto#".to_string(),
            iri: "http://example.org/onto#Component".to_string(),
            label: "Component".to_string(),
            color: "#ff8800".to_string(),
        }
    }

    pub fn onto_property() -> OntoProperty {
        OntoProperty {
            id: "p1".to_string(),
            text: "partOf".to_string(),
            base_iri: "http://example.org/onto#".to_string(),
            iri: "http://example.org/onto#partOf".to_string(),
            label: "partOf".to_string(),
            domain: Vec::new(),
            range: Vec::new(),
        }
    }

    /// Annotation `id` on 0-based `page`.
    pub fn annotation(id: &str, page: i32) -> Annotation {
        Annotation {
            id: id.to_string(),
            page,
            onto_class: onto_class(),
            created_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            bounds: Bounds {
                left: 10.0,
                top: 20.0,
                right: 110.0,
                bottom: 40.0,
            },
            tokens: None,
            text: Some(format!("text of {id}")),
        }
    }

    pub fn relation(id: &str, sources: &[&str], targets: &[&str]) -> RelationGroup {
        RelationGroup {
            id: id.to_string(),
            created_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            source_ids: sources.iter().map(|s| s.to_string()).collect(),
            target_ids: targets.iter().map(|s| s.to_string()).collect(),
            onto_property: onto_property(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
