//! Ownership and privilege checks for task mutation.
//!
//! Orthogonal to the task state machine: a caller must pass both.

use crate::error::CoreError;
use crate::roles::ROLE_ADMIN;
use crate::types::DbId;

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: String,
}

impl Actor {
    pub fn new(user_id: DbId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }

    /// Whether the caller holds an elevated role.
    pub fn is_privileged(&self) -> bool {
        is_privileged(&self.role)
    }
}

/// Whether `role` is an elevated (admin-equivalent) role.
pub fn is_privileged(role: &str) -> bool {
    role == ROLE_ADMIN
}

/// Whether `actor` may mutate a task assigned to `assignee_id`.
pub fn can_mutate_task(assignee_id: DbId, actor: &Actor) -> bool {
    actor.user_id == assignee_id || actor.is_privileged()
}

/// Return `Forbidden` unless `actor` may mutate a task assigned to `assignee_id`.
pub fn ensure_can_mutate_task(assignee_id: DbId, actor: &Actor) -> Result<(), CoreError> {
    if can_mutate_task(assignee_id, actor) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only the assigned annotator or an admin may modify this task".to_string(),
        ))
    }
}

/// Return `Forbidden` unless `actor` holds an elevated role.
pub fn ensure_privileged(actor: &Actor) -> Result<(), CoreError> {
    if actor.is_privileged() {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Admin role required".to_string()))
    }
}
