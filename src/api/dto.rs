//! Data Transfer Objects for API requests and responses.
//!
//! Request bodies are validated here and converted into the domain's
//! [`NewTask`] and [`TaskPatch`].

use serde::{Deserialize, Deserializer, Serialize};

use super::error::{FieldError, ValidationError};
use crate::domain::{DueDate, NewTask, Priority, Task, TaskId, TaskPatch, TaskStatus, Timestamp};

/// Longest accepted title, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Longest accepted description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

// =============================================================================
// Task DTOs
// =============================================================================

/// Request DTO for creating a new task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Missing and blank titles are both reported as "Title is required".
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<DueDate>,
}

impl CreateTaskRequest {
    /// Validates the request and converts it into a draft.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> Result<NewTask, ValidationError> {
        let mut errors = ValidationError::default();

        let title = errors.collect(validate_title(&self.title));
        let description = errors.collect(
            self.description
                .as_deref()
                .map_or(Ok(None), validate_description),
        );

        match (title, description) {
            (Some(title), Some(description)) if errors.is_empty() => Ok(NewTask {
                title,
                description,
                status: self.status.unwrap_or_default(),
                priority: self.priority.unwrap_or_default(),
                due_date: self.due_date,
            }),
            _ => Err(errors),
        }
    }
}

/// Request DTO for partially updating a task.
///
/// For `description` and `dueDate` an absent key leaves the field alone and
/// `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<DueDate>>,
}

impl UpdateTaskRequest {
    /// Validates the request and converts it into a patch.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> Result<TaskPatch, ValidationError> {
        let mut errors = ValidationError::default();

        let title = match self.title.as_deref() {
            Some(title) => errors.collect(validate_title(title)).map(Some),
            None => Some(None),
        };
        let description = match self.description {
            Some(Some(description)) => errors
                .collect(validate_description(&description))
                .map(Some),
            Some(None) => Some(Some(None)),
            None => Some(None),
        };

        match (title, description) {
            (Some(title), Some(description)) if errors.is_empty() => Ok(TaskPatch {
                title,
                description,
                status: self.status,
                priority: self.priority,
                due_date: self.due_date,
            }),
            _ => Err(errors),
        }
    }
}

/// Distinguishes a `null` value from an absent key.
///
/// Paired with `#[serde(default)]`: absent keys become `None`, present keys
/// (including `null`) become `Some(..)`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Response DTO for a task.
///
/// Also decoded by the HTTP client, so it is symmetric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDate>,
    pub created_at: Timestamp,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: task.created_at,
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

impl From<TaskResponse> for Task {
    fn from(response: TaskResponse) -> Self {
        Self {
            id: response.id,
            title: response.title,
            description: response.description,
            status: response.status,
            priority: response.priority,
            due_date: response.due_date,
            created_at: response.created_at,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a task title.
///
/// # Validation Rules
///
/// - Surrounding whitespace is trimmed
/// - Title must not be empty
/// - Title must not exceed 200 characters
///
/// # Errors
///
/// Returns the field error for `title`.
pub fn validate_title(title: &str) -> Result<String, FieldError> {
    let title = title.trim();

    if title.is_empty() {
        return Err(FieldError::new("title", "Title is required"));
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(FieldError::new(
            "title",
            format!("Title must not exceed {MAX_TITLE_LENGTH} characters"),
        ));
    }

    Ok(title.to_string())
}

/// Validates a task description.
///
/// A blank description is normalized to `None`.
///
/// # Errors
///
/// Returns the field error for `description` if it exceeds 5000 characters.
pub fn validate_description(description: &str) -> Result<Option<String>, FieldError> {
    let description = description.trim();

    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(FieldError::new(
            "description",
            format!("Description must not exceed {MAX_DESCRIPTION_LENGTH} characters"),
        ));
    }

    Ok((!description.is_empty()).then(|| description.to_string()))
}

// =============================================================================
// Tests
// =============================================================================
