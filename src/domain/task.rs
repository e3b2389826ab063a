//! Task domain model.
//!
//! This module contains the single persisted entity of the application,
//! its value objects, and the two change descriptions applied to it:
//! [`NewTask`] (a validated draft) and [`TaskPatch`] (a partial update).

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task.
///
/// Assigned by the store at creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new `TaskId` with a time-ordered UUID (v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseTaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| ParseTaskError::InvalidId(value.to_string()))
    }
}

/// A point in time, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    ///
    /// **Note**: This is an impure function (side effect: system clock).
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.to_rfc3339())
    }
}

/// A calendar due date without time-of-day semantics.
///
/// Serialized as `YYYY-MM-DD`. Deserialization also accepts a full RFC 3339
/// timestamp and keeps its calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DueDate(NaiveDate);

impl DueDate {
    /// Creates a `DueDate` from a `NaiveDate`.
    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Returns the inner `NaiveDate`.
    #[must_use]
    pub const fn as_date(&self) -> &NaiveDate {
        &self.0
    }

    /// Returns `true` if this date lies strictly before `today`.
    #[must_use]
    pub fn is_before(self, today: NaiveDate) -> bool {
        self.0 < today
    }
}

impl std::fmt::Display for DueDate {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DueDate {
    type Err = ParseTaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|datetime| datetime.date_naive()))
            .map(Self)
            .map_err(|_| ParseTaskError::InvalidDueDate(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// The workflow stage of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started yet.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
}

impl TaskStatus {
    /// All statuses in workflow order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Completed];

    /// Returns the position of the status in the workflow (`todo = 1`).
    #[must_use]
    pub const fn stage(self) -> u8 {
        match self {
            Self::Todo => 1,
            Self::InProgress => 2,
            Self::Completed => 3,
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseTaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ParseTaskError::InvalidStatus(value.to_string()))
    }
}

/// The priority level of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Severity 1.
    Low,
    /// Severity 2.
    #[default]
    Medium,
    /// Severity 3.
    High,
}

impl Priority {
    /// All priorities from least to most severe.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the numeric severity (`high = 3`).
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseTaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| ParseTaskError::InvalidPriority(value.to_string()))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.severity().cmp(&other.severity())
    }
}

/// Errors raised when parsing domain values from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseTaskError {
    #[error("invalid task id: '{0}'")]
    InvalidId(String),
    #[error("invalid status: '{0}'. Expected 'todo', 'in-progress' or 'completed'")]
    InvalidStatus(String),
    #[error("invalid priority: '{0}'. Expected 'low', 'medium' or 'high'")]
    InvalidPriority(String),
    #[error("invalid due date: '{0}'. Expected YYYY-MM-DD")]
    InvalidDueDate(String),
}

// =============================================================================
// Task
// =============================================================================

/// A persisted work item.
///
/// The serialized form is the document stored by the task store and the
/// body returned by the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Non-empty title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDate>,
    /// Store-assigned creation time.
    pub created_at: Timestamp,
}

impl Task {
    /// Materializes a validated draft into a task.
    ///
    /// This is a pure function; the store supplies `id` and `created_at`.
    #[must_use]
    pub fn create(id: TaskId, draft: NewTask, created_at: Timestamp) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            due_date: draft.due_date,
            created_at,
        }
    }

    /// Returns a new task with every field present in `patch` replaced.
    ///
    /// `id` and `created_at` are never touched.
    #[must_use]
    pub fn apply(self, patch: TaskPatch) -> Self {
        Self {
            title: patch.title.unwrap_or(self.title),
            description: patch.description.unwrap_or(self.description),
            status: patch.status.unwrap_or(self.status),
            priority: patch.priority.unwrap_or(self.priority),
            due_date: patch.due_date.unwrap_or(self.due_date),
            ..self
        }
    }

    /// Returns a new task with the given status.
    #[must_use]
    pub fn with_status(self, status: TaskStatus) -> Self {
        Self { status, ..self }
    }

    /// Returns a new task with the given priority.
    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    /// Returns a new task with the given due date.
    #[must_use]
    pub fn with_due_date(self, due_date: DueDate) -> Self {
        Self {
            due_date: Some(due_date),
            ..self
        }
    }
}

// =============================================================================
// Drafts and Patches
// =============================================================================

/// A validated, not yet persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDate>,
}

impl NewTask {
    /// Creates a draft with the given title and default status and priority.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            priority: Priority::default(),
            due_date: None,
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_status(self, status: TaskStatus) -> Self {
        Self { status, ..self }
    }

    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    #[must_use]
    pub fn with_due_date(self, due_date: DueDate) -> Self {
        Self {
            due_date: Some(due_date),
            ..self
        }
    }
}

/// A partial update of a task.
///
/// For the nullable fields (`description`, `due_date`) the outer `Option`
/// says whether the field is touched and the inner one whether it is set or
/// cleared. On the wire an absent key leaves the field alone and `null`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DueDate>>,
}

impl TaskPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..self
        }
    }

    #[must_use]
    pub fn with_description(self, description: Option<String>) -> Self {
        Self {
            description: Some(description),
            ..self
        }
    }

    #[must_use]
    pub fn with_due_date(self, due_date: Option<DueDate>) -> Self {
        Self {
            due_date: Some(due_date),
            ..self
        }
    }

    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(value: &str) -> DueDate {
        value.parse().unwrap()
    }

    fn test_task(title: &str) -> Task {
        Task::create(TaskId::generate(), NewTask::new(title), Timestamp::now())
    }

    // -------------------------------------------------------------------------
    // TaskId Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_task_id_generate_creates_unique_ids() {
        assert_ne!(TaskId::generate(), TaskId::generate());
    }

    #[rstest]
    fn test_task_id_round_trips_through_display() {
        let id = TaskId::generate();
        let parsed: TaskId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[rstest]
    fn test_task_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<TaskId>().is_err());
    }

    // -------------------------------------------------------------------------
    // Enum Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[case("todo", TaskStatus::Todo, 1)]
    #[case("in-progress", TaskStatus::InProgress, 2)]
    #[case("completed", TaskStatus::Completed, 3)]
    fn test_status_wire_values(#[case] wire: &str, #[case] status: TaskStatus, #[case] stage: u8) {
        assert_eq!(wire.parse::<TaskStatus>().unwrap(), status);
        assert_eq!(status.stage(), stage);
        assert_eq!(serde_json::to_value(status).unwrap(), wire);
    }

    #[rstest]
    #[case("low", Priority::Low, 1)]
    #[case("medium", Priority::Medium, 2)]
    #[case("high", Priority::High, 3)]
    fn test_priority_wire_values(#[case] wire: &str, #[case] priority: Priority, #[case] severity: u8) {
        assert_eq!(wire.parse::<Priority>().unwrap(), priority);
        assert_eq!(priority.severity(), severity);
        assert_eq!(serde_json::to_value(priority).unwrap(), wire);
    }

    #[rstest]
    #[case("pending")]
    #[case("in_progress")]
    #[case("")]
    fn test_status_rejects_unknown_values(#[case] wire: &str) {
        assert!(wire.parse::<TaskStatus>().is_err());
        assert!(serde_json::from_value::<TaskStatus>(serde_json::json!(wire)).is_err());
    }

    #[rstest]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[rstest]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
    }

    // -------------------------------------------------------------------------
    // DueDate Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_due_date_accepts_timestamp_and_keeps_date() {
        let due: DueDate = "2024-03-01T00:00:00.000Z".parse().unwrap();
        assert_eq!(due, date("2024-03-01"));
        assert_eq!(due.to_string(), "2024-03-01");
    }

    #[rstest]
    fn test_due_date_rejects_garbage() {
        assert!("03/01/2024".parse::<DueDate>().is_err());
    }

    #[rstest]
    fn test_due_date_is_before() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(date("2024-02-29").is_before(today));
        assert!(!date("2024-03-01").is_before(today));
    }

    // -------------------------------------------------------------------------
    // Task Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_task_create_copies_draft() {
        let draft = NewTask::new("Write report")
            .with_description("Quarterly")
            .with_priority(Priority::High)
            .with_due_date(date("2024-05-01"));
        let id = TaskId::generate();
        let task = Task::create(id.clone(), draft, Timestamp::now());

        assert_eq!(task.id, id);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description.as_deref(), Some("Quarterly"));
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, Some(date("2024-05-01")));
    }

    #[rstest]
    fn test_apply_empty_patch_is_identity() {
        let task = test_task("Unchanged").with_due_date(date("2024-01-01"));
        assert_eq!(task.clone().apply(TaskPatch::default()), task);
    }

    #[rstest]
    fn test_apply_patch_sets_and_clears_fields() {
        let task = test_task("Old")
            .with_due_date(date("2024-01-01"))
            .with_priority(Priority::Low);
        let id = task.id.clone();
        let created_at = task.created_at;

        let patch = TaskPatch::status(TaskStatus::Completed)
            .with_title("New")
            .with_due_date(None)
            .with_description(Some("Details".to_string()));
        let updated = task.apply(patch);

        assert_eq!(updated.id, id);
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.title, "New");
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.priority, Priority::Low);
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.description.as_deref(), Some("Details"));
    }

    #[rstest]
    fn test_patch_is_empty() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch::status(TaskStatus::Todo).is_empty());
    }

    // -------------------------------------------------------------------------
    // Serialization Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_task_json_shape() {
        let task = test_task("Shape").with_due_date(date("2024-01-01"));
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["title"], "Shape");
        assert_eq!(json["status"], "todo");
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["dueDate"], "2024-01-01");
        assert!(json["createdAt"].is_string());
        assert!(json.get("description").is_none());
    }

    #[rstest]
    fn test_patch_serializes_clear_as_null() {
        let patch = TaskPatch::default().with_due_date(None);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "dueDate": null }));
    }
}
