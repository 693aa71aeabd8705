//! Handlers for the `/tasks` resource.
//!
//! Lifecycle operations (create, commit, dismiss, delete) are admin only.
//! Delta, comment, and completion-flag edits are open to the assignee and
//! admins; the workflow enforces that.

use annotask_core::annotation::DocAnnotations;
use annotask_core::delta::TaskDeltaAnnotations;
use annotask_core::document::DocCommit;
use annotask_core::task::{Task, TaskFilter};
use annotask_core::types::DbId;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::engine::NewTaskInput;
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /tasks/{id}/comments`.
#[derive(Debug, Deserialize)]
pub struct SetCommentsRequest {
    pub comments: String,
}

/// Request body for `POST /tasks/{id}/complete`.
#[derive(Debug, Deserialize)]
pub struct SetCompleteRequest {
    pub complete: bool,
}

/// GET /api/v1/tasks?user_id=&doc_id=
pub async fn list_tasks(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let tasks = state.workflow.list_tasks(filter).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// POST /api/v1/tasks
pub async fn create_task(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<NewTaskInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Task>>)> {
    let task = state.workflow.create_task(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// GET /api/v1/tasks/me
///
/// Tasks assigned to the caller.
pub async fn my_tasks(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let filter = TaskFilter {
        user_id: Some(user.user_id),
        document_id: None,
    };
    let tasks = state.workflow.list_tasks(filter).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = state.workflow.get_task(id).await?;
    Ok(Json(DataResponse { data: task }))
}

/// DELETE /api/v1/tasks/{id}
///
/// Only active tasks can be deleted; returns 409 otherwise.
pub async fn delete_task(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.workflow.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/tasks/{id}/doc-annotations
///
/// The document as the task sees it: base snapshot plus the task's deltas,
/// restricted to the task's pages.
pub async fn get_doc_annotations(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DocAnnotations>>> {
    let annotations = state.workflow.combined_annotations(id).await?;
    Ok(Json(DataResponse { data: annotations }))
}

/// GET /api/v1/tasks/{id}/task-annotations
pub async fn get_task_annotations(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TaskDeltaAnnotations>>> {
    let deltas = state.workflow.task_deltas(id).await?;
    Ok(Json(DataResponse { data: deltas }))
}

/// PUT /api/v1/tasks/{id}/task-annotations
pub async fn update_task_annotations(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(deltas): Json<TaskDeltaAnnotations>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = state
        .workflow
        .replace_deltas(id, &user.actor(), deltas)
        .await?;
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks/{id}/comments
pub async fn set_comments(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<SetCommentsRequest>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = state
        .workflow
        .set_comments(id, &user.actor(), &body.comments)
        .await?;
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks/{id}/complete
///
/// Sets the annotator's completion flag; does not commit the task.
pub async fn set_complete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<SetCompleteRequest>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = state
        .workflow
        .set_marked_complete(id, &user.actor(), body.complete)
        .await?;
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks/{id}/commit
///
/// Returns 201 with the new commit, 409 if the task is no longer active or
/// another commit landed concurrently.
pub async fn commit_task(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<DocCommit>>)> {
    let commit = state.workflow.commit_task(id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: commit })))
}

/// POST /api/v1/tasks/{id}/dismiss
pub async fn dismiss_task(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = state.workflow.dismiss_task(id).await?;
    Ok(Json(DataResponse { data: task }))
}
