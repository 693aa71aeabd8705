//! Repository layer: one zero-sized struct per table, async functions taking
//! a pool (or a connection, when the call must join a transaction).

pub mod doc_commit_repo;
pub mod document_repo;
pub mod task_repo;
pub mod user_repo;

pub use doc_commit_repo::DocCommitRepo;
pub use document_repo::DocumentRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
