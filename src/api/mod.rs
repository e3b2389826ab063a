//! HTTP API over the task store.
//!
//! This module contains the route table, request/response DTOs, handlers
//! and error rendering.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use dto::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use handlers::{
    AppState, HealthResponse, create_task, delete_task, get_task, health_check, list_tasks,
    update_task,
};
pub use routes::create_router;
