use axum::routing::get;
use axum::Router;

use crate::handlers::documents;
use crate::state::AppState;

/// Document routes mounted at `/documents`.
///
/// ```text
/// GET    /                                  -> list_documents
/// POST   /                                  -> create_document (admin only)
/// GET    /{id}                              -> get_document
/// GET    /{id}/commits                      -> list_commits
/// GET    /{id}/annotations                  -> get_document_annotations
/// GET    /commits/{commit_id}               -> get_commit
/// GET    /commits/{commit_id}/annotations   -> get_commit_annotations
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/{id}", get(documents::get_document))
        .route("/{id}/commits", get(documents::list_commits))
        .route("/{id}/annotations", get(documents::get_document_annotations))
        .route("/commits/{commit_id}", get(documents::get_commit))
        .route(
            "/commits/{commit_id}/annotations",
            get(documents::get_commit_annotations),
        )
}
