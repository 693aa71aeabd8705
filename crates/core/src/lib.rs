//! Domain core for the annotation task service.
//!
//! Everything in this crate is pure computation over in-memory values except
//! [`memory::MemoryStore`], which keeps its tables behind a single async lock.
//! The database and HTTP layers depend on this crate, never the reverse.

pub mod annotation;
pub mod authz;
pub mod delta;
pub mod document;
pub mod error;
pub mod memory;
pub mod merge;
pub mod page_range;
pub mod roles;
pub mod store;
pub mod task;
pub mod types;
