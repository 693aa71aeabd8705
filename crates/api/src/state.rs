use std::sync::Arc;

use annotask_db::PgStore;

use crate::config::ServerConfig;
use crate::engine::TaskWorkflow;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference-counted and the rest sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: annotask_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Task workflow engine over the PostgreSQL store.
    pub workflow: Arc<TaskWorkflow<PgStore>>,
}

impl AppState {
    pub fn new(pool: annotask_db::DbPool, config: ServerConfig) -> Self {
        let workflow = TaskWorkflow::new(PgStore::new(pool.clone()), config.workflow.clone());
        Self {
            pool,
            config: Arc::new(config),
            workflow: Arc::new(workflow),
        }
    }
}
