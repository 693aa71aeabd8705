pub mod documents;
pub mod health;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /documents                                   list, register (admin)
/// /documents/{id}                              get
/// /documents/{id}/commits                      history, newest first
/// /documents/{id}/annotations                  head snapshot
/// /documents/commits/{commit_id}               commit metadata
/// /documents/commits/{commit_id}/annotations   commit snapshot
///
/// /tasks                                       list (?user_id=&doc_id=), create (admin)
/// /tasks/me                                    caller's tasks
/// /tasks/{id}                                  get, delete (admin)
/// /tasks/{id}/doc-annotations                  combined view
/// /tasks/{id}/task-annotations                 get, replace deltas
/// /tasks/{id}/comments                         set comments
/// /tasks/{id}/complete                         set completion flag
/// /tasks/{id}/commit                           commit (admin)
/// /tasks/{id}/dismiss                          dismiss (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/documents", documents::router())
        .nest("/tasks", tasks::router())
}
