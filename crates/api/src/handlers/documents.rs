//! Handlers for the `/documents` resource and its commit history.

use annotask_core::annotation::DocAnnotations;
use annotask_core::document::{CommitSummary, Document, NewDocument};
use annotask_core::types::DbId;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/documents
pub async fn list_documents(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Document>>>> {
    let documents = state.workflow.list_documents().await?;
    Ok(Json(DataResponse { data: documents }))
}

/// POST /api/v1/documents
///
/// Registers an uploaded PDF by its blob reference. Admin only.
pub async fn create_document(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<NewDocument>,
) -> AppResult<(StatusCode, Json<DataResponse<Document>>)> {
    let document = state.workflow.create_document(&input).await?;
    tracing::debug!(document_id = document.id, admin_id = admin.user_id, "Document created via API");
    Ok((StatusCode::CREATED, Json(DataResponse { data: document })))
}

/// GET /api/v1/documents/{id}
pub async fn get_document(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Document>>> {
    let document = state.workflow.get_document(id).await?;
    Ok(Json(DataResponse { data: document }))
}

/// GET /api/v1/documents/{id}/commits
///
/// Commit history without snapshot bodies, newest first.
pub async fn list_commits(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<CommitSummary>>>> {
    let commits = state.workflow.list_commits(id).await?;
    Ok(Json(DataResponse { data: commits }))
}

/// GET /api/v1/documents/{id}/annotations
///
/// The snapshot at the document's head; empty before the first commit.
pub async fn get_document_annotations(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DocAnnotations>>> {
    let annotations = state.workflow.document_annotations(id).await?;
    Ok(Json(DataResponse { data: annotations }))
}

/// GET /api/v1/documents/commits/{commit_id}
pub async fn get_commit(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(commit_id): Path<DbId>,
) -> AppResult<Json<DataResponse<CommitSummary>>> {
    let commit = state.workflow.get_commit(commit_id).await?;
    Ok(Json(DataResponse {
        data: commit.summary(),
    }))
}

/// GET /api/v1/documents/commits/{commit_id}/annotations
pub async fn get_commit_annotations(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(commit_id): Path<DbId>,
) -> AppResult<Json<DataResponse<DocAnnotations>>> {
    let annotations = state.workflow.commit_annotations(commit_id).await?;
    Ok(Json(DataResponse { data: annotations }))
}
