//! HTTP handlers for the task API.
//!
//! Each handler maps one request onto one store operation. Validation runs
//! before the store is touched; store failures surface as 500.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::dto::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
use super::error::ApiErrorResponse;
use crate::domain::TaskId;
use crate::infrastructure::TaskRepository;

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// The store is a trait object so that the backend chosen by
/// `RepositoryFactory` at startup can be plugged in.
#[derive(Clone)]
pub struct AppState {
    pub task_repository: Arc<dyn TaskRepository>,
}

impl AppState {
    #[must_use]
    pub fn new(task_repository: Arc<dyn TaskRepository>) -> Self {
        Self { task_repository }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppState")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .finish()
    }
}

/// Parses a path id; malformed ids name no task, so they are a 404.
fn parse_task_id(raw: &str) -> Result<TaskId, ApiErrorResponse> {
    raw.parse()
        .map_err(|_| ApiErrorResponse::not_found(format!("Task {raw} not found")))
}

fn task_not_found(id: &TaskId) -> ApiErrorResponse {
    ApiErrorResponse::not_found(format!("Task {id} not found"))
}

// =============================================================================
// GET /api/tasks
// =============================================================================

/// Lists every task, newest first.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let tasks = state.task_repository.list().await?;
    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

// =============================================================================
// POST /api/tasks
// =============================================================================

/// Creates a task.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Task title",
///   "description": "Optional description",
///   "status": "todo|in-progress|completed",
///   "priority": "low|medium|high",
///   "dueDate": "2024-12-31"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the stored task
/// - **400 Bad Request**: malformed JSON or validation error
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] for invalid bodies and store failures.
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiErrorResponse> {
    let Json(request) = payload?;
    let draft = request.validate()?;

    let task = state.task_repository.insert(draft).await?;
    tracing::debug!(task_id = %task.id, "Task created");

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

// =============================================================================
// GET /api/tasks/{id}
// =============================================================================

/// Fetches a single task.
///
/// # Errors
///
/// Returns 404 for unknown or malformed ids.
pub async fn get_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let id = parse_task_id(&raw_id)?;

    state
        .task_repository
        .find_by_id(&id)
        .await?
        .map(|task| Json(TaskResponse::from(task)))
        .ok_or_else(|| task_not_found(&id))
}

// =============================================================================
// PATCH /api/tasks/{id}
// =============================================================================

/// Partially updates a task and returns the stored result.
///
/// Only the keys present in the body are changed; `null` clears
/// `description` and `dueDate`.
///
/// # Errors
///
/// Returns 400 for invalid bodies and 404 for unknown ids.
pub async fn update_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let id = parse_task_id(&raw_id)?;
    let Json(request) = payload?;
    let patch = request.validate()?;

    let updated = state
        .task_repository
        .update(&id, patch)
        .await?
        .ok_or_else(|| task_not_found(&id))?;
    tracing::debug!(task_id = %updated.id, "Task updated");

    Ok(Json(TaskResponse::from(updated)))
}

// =============================================================================
// DELETE /api/tasks/{id}
// =============================================================================

/// Deletes a task.
///
/// # Errors
///
/// Returns 404 for unknown ids.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiErrorResponse> {
    let id = parse_task_id(&raw_id)?;

    if state.task_repository.delete(&id).await? {
        tracing::debug!(task_id = %id, "Task deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(task_not_found(&id))
    }
}

// =============================================================================
// GET /health
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
///
/// ```json
/// { "status": "healthy", "version": "0.1.0" }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, TaskStatus};
    use crate::infrastructure::InMemoryTaskRepository;
    use rstest::{fixture, rstest};

    #[fixture]
    fn state() -> AppState {
        AppState::new(Arc::new(InMemoryTaskRepository::new()))
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case("123")]
    fn test_parse_task_id_malformed_is_not_found(#[case] raw: &str) {
        let error = parse_task_id(raw).unwrap_err();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_then_get(state: AppState) {
        let request = CreateTaskRequest {
            title: "Handler task".to_string(),
            ..CreateTaskRequest::default()
        };

        let (status, Json(created)) = create_task(State(state.clone()), Ok(Json(request)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(fetched) = get_task(State(state), Path(created.id.to_string()))
            .await
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_rejects_blank_title_without_touching_store(state: AppState) {
        let request = CreateTaskRequest {
            title: "   ".to_string(),
            ..CreateTaskRequest::default()
        };

        let error = create_task(State(state.clone()), Ok(Json(request)))
            .await
            .unwrap_err();

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(state.task_repository.count().await.unwrap(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_unknown_task_is_not_found(state: AppState) {
        let request = UpdateTaskRequest {
            status: Some(TaskStatus::Completed),
            ..UpdateTaskRequest::default()
        };

        let error = update_task(
            State(state),
            Path(TaskId::generate().to_string()),
            Ok(Json(request)),
        )
        .await
        .unwrap_err();

        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_twice(state: AppState) {
        let task = state
            .task_repository
            .insert(NewTask::new("Delete me"))
            .await
            .unwrap();

        let first = delete_task(State(state.clone()), Path(task.id.to_string())).await;
        let second = delete_task(State(state), Path(task.id.to_string())).await;

        assert_eq!(first.unwrap(), StatusCode::NO_CONTENT);
        assert_eq!(second.unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_health_check() {
        let Json(health) = health_check().await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }
}
