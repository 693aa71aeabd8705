use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Task routes mounted at `/tasks`.
///
/// ```text
/// GET    /                        -> list_tasks
/// POST   /                        -> create_task (admin only)
/// GET    /me                      -> my_tasks
/// GET    /{id}                    -> get_task
/// DELETE /{id}                    -> delete_task (admin only)
/// GET    /{id}/doc-annotations    -> get_doc_annotations
/// GET    /{id}/task-annotations   -> get_task_annotations
/// PUT    /{id}/task-annotations   -> update_task_annotations
/// POST   /{id}/comments           -> set_comments
/// POST   /{id}/complete           -> set_complete
/// POST   /{id}/commit             -> commit_task (admin only)
/// POST   /{id}/dismiss            -> dismiss_task (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/me", get(tasks::my_tasks))
        .route("/{id}", get(tasks::get_task).delete(tasks::delete_task))
        .route("/{id}/doc-annotations", get(tasks::get_doc_annotations))
        .route(
            "/{id}/task-annotations",
            get(tasks::get_task_annotations).put(tasks::update_task_annotations),
        )
        .route("/{id}/comments", post(tasks::set_comments))
        .route("/{id}/complete", post(tasks::set_complete))
        .route("/{id}/commit", post(tasks::commit_task))
        .route("/{id}/dismiss", post(tasks::dismiss_task))
}
