use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskboard_core::{GroupedTasks, NewTask, PriorityUpdate, Task, TaskId, TaskPatch};
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::task::TaskService;
use crate::web::error::{ApiError, ApiJson, ApiPath, ErrorResponse};

#[derive(Clone, Debug)]
pub struct TaskState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}

/// Body of PATCH /api/tasks/{id}/status. The status is validated by the service,
/// so a missing or non-string status is rejected like an unknown one.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusRequest {
    /// One of `todo`, `inProgress`, `done`
    #[serde(default)]
    #[schema(value_type = String)]
    pub status: serde_json::Value,
}

impl StatusRequest {
    fn status_text(&self) -> String {
        match &self.status {
            serde_json::Value::String(status) => status.clone(),
            other => other.to_string(),
        }
    }
}

/// Body of POST /api/tasks/bulk-priority.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkPriorityRequest {
    pub updates: Vec<PriorityUpdate>,
}

/// Response of POST /api/tasks/bulk-priority.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkPriorityResponse {
    pub message: String,
    /// The tasks that were updated; unknown ids are left out
    pub tasks: Vec<Task>,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Handler for POST /api/tasks - Creates a task owned by the caller.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = NewTask,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Missing title or malformed fields", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let service = TaskService::new(&state.db);
    let task = service.create_task(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for GET /api/tasks - Returns the caller's tasks grouped by status.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks",
    responses(
        (status = 200, description = "Tasks grouped by status", body = GroupedTasks),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn get_tasks_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<GroupedTasks>, ApiError> {
    let service = TaskService::new(&state.db);
    let grouped = service.get_grouped_tasks(user.id).await?;
    Ok(Json(grouped))
}

/// Handler for GET /api/tasks/{id} - Returns one task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "The task", body = Task),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<Task>, ApiError> {
    let service = TaskService::new(&state.db);
    let task = service.get_task(user.id, id).await?;
    Ok(Json(task))
}

/// Handler for PUT /api/tasks/{id} - Applies a partial update.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = TaskPatch,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Malformed fields", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(payload): ApiJson<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let service = TaskService::new(&state.db);
    let task = service.update_task(user.id, id, payload).await?;
    Ok(Json(task))
}

/// Handler for PATCH /api/tasks/{id}/status - Moves a task to another column.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}/status",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Status changed", body = Task),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn set_status_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(payload): ApiJson<StatusRequest>,
) -> Result<Json<Task>, ApiError> {
    let service = TaskService::new(&state.db);
    let task = service.set_status(user.id, id, &payload.status_text()).await?;
    Ok(Json(task))
}

/// Handler for DELETE /api/tasks/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<MessageResponse>, ApiError> {
    let service = TaskService::new(&state.db);
    service.delete_task(user.id, id).await?;
    Ok(Json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}

/// Handler for POST /api/tasks/bulk-priority - Best-effort batch of priority changes.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/tasks/bulk-priority",
    request_body = BulkPriorityRequest,
    responses(
        (status = 200, description = "Updated tasks; unknown ids are skipped", body = BulkPriorityResponse),
        (status = 400, description = "Malformed updates", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Tasks"
)]
pub async fn bulk_priority_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<BulkPriorityRequest>,
) -> Result<Json<BulkPriorityResponse>, ApiError> {
    let service = TaskService::new(&state.db);
    let tasks = service.bulk_set_priority(user.id, &payload.updates).await?;
    Ok(Json(BulkPriorityResponse {
        message: format!(
            "Updated priority of {} of {} tasks",
            tasks.len(),
            payload.updates.len()
        ),
        tasks,
    }))
}

/// Creates and returns the tasks API router. Expects `CurrentUser` to be set.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", post(create_task_handler).get(get_tasks_handler))
        .route("/tasks/bulk-priority", post(bulk_priority_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/tasks/{id}/status", patch(set_status_handler))
        .with_state(state)
}
