//! Task Form.
//!
//! Collects a draft, validates it locally and submits it through the
//! cache. Nothing invalid ever reaches the network.

use chrono::NaiveDate;
use thiserror::Error;

use super::api::TaskApi;
use super::cache::TaskCache;
use super::error::ClientError;
use crate::api::dto::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
use crate::domain::{DueDate, NewTask, Priority, Task, TaskPatch, TaskStatus};

/// Message shown when the server rejects or misses a submission.
pub const SUBMIT_FAILED: &str = "Failed to create task. Please try again.";

/// Today's date in the local time zone.
#[must_use]
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// =============================================================================
// Form Errors
// =============================================================================

/// A problem with one form field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Title must not exceed {MAX_TITLE_LENGTH} characters")]
    TitleTooLong,

    #[error("Description must not exceed {MAX_DESCRIPTION_LENGTH} characters")]
    DescriptionTooLong,

    #[error("Due date must be a valid date (YYYY-MM-DD)")]
    InvalidDueDate(String),

    #[error("Due date cannot be in the past")]
    DueDateInPast,

    #[error("Failed to create task. Please try again.")]
    SubmitFailed,
}

impl FormError {
    /// Name of the field the error is shown next to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::TitleRequired | Self::TitleTooLong => "title",
            Self::DescriptionTooLong => "description",
            Self::InvalidDueDate(_) | Self::DueDateInPast => "dueDate",
            Self::SubmitFailed => "submit",
        }
    }
}

fn validation_failure(errors: &[FormError]) -> ClientError {
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    ClientError::Validation(messages.join("; "))
}

fn parse_due_date(raw: &str) -> Result<Option<DueDate>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| FormError::InvalidDueDate(raw.to_string()))
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Trimmed title within the server's limits.
fn checked_title(raw: &str) -> Result<String, FormError> {
    let title = non_blank(raw).ok_or(FormError::TitleRequired)?;
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(FormError::TitleTooLong);
    }
    Ok(title)
}

/// Trimmed description within the server's limits; blank means absent.
fn checked_description(raw: &str) -> Result<Option<String>, FormError> {
    let description = non_blank(raw);
    if description
        .as_ref()
        .is_some_and(|description| description.chars().count() > MAX_DESCRIPTION_LENGTH)
    {
        return Err(FormError::DescriptionTooLong);
    }
    Ok(description)
}

// =============================================================================
// Task Draft
// =============================================================================

/// Raw contents of the create form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// `YYYY-MM-DD`, or empty for no due date.
    pub due_date: String,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            due_date: String::new(),
        }
    }
}

impl TaskDraft {
    /// Validates the draft against `today`.
    ///
    /// A due date equal to `today` is accepted.
    ///
    /// # Errors
    ///
    /// Returns every field error found, at most one per field.
    pub fn validate(&self, today: NaiveDate) -> Result<NewTask, Vec<FormError>> {
        let mut errors = Vec::new();

        let title = checked_title(&self.title)
            .map_err(|error| errors.push(error))
            .ok();
        let description = checked_description(&self.description)
            .map_err(|error| errors.push(error))
            .ok();

        let due_date = match parse_due_date(&self.due_date) {
            Ok(Some(due_date)) if due_date.is_before(today) => {
                errors.push(FormError::DueDateInPast);
                None
            }
            Ok(due_date) => due_date,
            Err(error) => {
                errors.push(error);
                None
            }
        };

        match (title, description) {
            (Some(title), Some(description)) if errors.is_empty() => Ok(NewTask {
                title,
                description,
                status: self.status,
                priority: self.priority,
                due_date,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Task Form
// =============================================================================

/// State of the create form.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    open: bool,
    draft: TaskDraft,
    errors: Vec<FormError>,
    submitting: bool,
}

impl TaskForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn open(&mut self) {
        self.open = true;
    }

    /// Hides the form. The draft is kept.
    pub const fn close(&mut self) {
        self.open = false;
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub const fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    pub const fn draft_mut(&mut self) -> &mut TaskDraft {
        &mut self.draft
    }

    #[must_use]
    pub fn errors(&self) -> &[FormError] {
        &self.errors
    }

    /// The error shown next to `field`, if any.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&FormError> {
        self.errors.iter().find(|error| error.field() == field)
    }

    /// Validates and submits the draft through `cache`.
    ///
    /// On success the form resets to the default draft and closes. On a
    /// failed create the draft is kept for a retry.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` without any network call if the
    /// draft is invalid, or the cache's error if the create fails.
    pub async fn submit<A: TaskApi>(
        &mut self,
        cache: &mut TaskCache<A>,
        today: NaiveDate,
    ) -> Result<Task, ClientError> {
        let draft = match self.draft.validate(today) {
            Ok(draft) => draft,
            Err(errors) => {
                let error = validation_failure(&errors);
                self.errors = errors;
                return Err(error);
            }
        };

        self.errors.clear();
        self.submitting = true;
        let result = cache.create(&draft).await;
        self.submitting = false;

        match result {
            Ok(task) => {
                self.draft = TaskDraft::default();
                self.open = false;
                Ok(task)
            }
            Err(error) => {
                self.errors = vec![FormError::SubmitFailed];
                Err(error)
            }
        }
    }
}

// =============================================================================
// Edit Draft
// =============================================================================

/// Raw contents of the in-place task editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: String,
}

impl From<&Task> for EditDraft {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status,
            priority: task.priority,
            due_date: task
                .due_date
                .map(|due_date| due_date.to_string())
                .unwrap_or_default(),
        }
    }
}

impl EditDraft {
    /// Converts the editor contents into a patch touching every field.
    ///
    /// An emptied description or due date clears it. Past due dates are
    /// allowed so that overdue tasks stay editable.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn to_patch(&self) -> Result<TaskPatch, Vec<FormError>> {
        let mut errors = Vec::new();

        let title = checked_title(&self.title)
            .map_err(|error| errors.push(error))
            .ok();
        let description = checked_description(&self.description)
            .map_err(|error| errors.push(error))
            .ok();

        let due_date = parse_due_date(&self.due_date).unwrap_or_else(|error| {
            errors.push(error);
            None
        });

        match (title, description) {
            (Some(title), Some(description)) if errors.is_empty() => Ok(TaskPatch {
                title: Some(title),
                description: Some(description),
                status: Some(self.status),
                priority: Some(self.priority),
                due_date: Some(due_date),
            }),
            _ => Err(errors),
        }
    }

    /// Like [`EditDraft::to_patch`], reporting failures as a `ClientError`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if any field is invalid.
    pub fn to_client_patch(&self) -> Result<TaskPatch, ClientError> {
        self.to_patch().map_err(|errors| validation_failure(&errors))
    }
}

// =============================================================================
// Tests
// =============================================================================
