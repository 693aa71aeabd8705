//! Repository for the `users` table.
//!
//! Accounts are provisioned by the identity service; this crate only checks
//! that an assignee exists.

use annotask_core::types::DbId;
use sqlx::PgPool;

pub struct UserRepo;

impl UserRepo {
    /// Whether a user with this ID exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
