//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the database row and,
//! where the row differs from the domain type, a conversion into
//! `annotask_core`.

pub mod doc_commit;
pub mod document;
pub mod task;
