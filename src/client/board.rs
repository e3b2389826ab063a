//! Task Board.
//!
//! Headless controller of the task screen: owns the cache, the view
//! controls, the create form and the pending delete confirmation, and turns
//! every action outcome into a [`Notice`].

use chrono::NaiveDate;

use super::api::TaskApi;
use super::cache::TaskCache;
use super::error::ClientError;
use super::form::{EditDraft, TaskForm};
use super::view::{
    EmptyState, MemoizedView, PriorityFilter, SortKey, StatusCounts, StatusFilter, ViewQuery,
    ViewSummary,
};
use crate::domain::{Task, TaskId, TaskPatch, TaskStatus};

// =============================================================================
// Notices
// =============================================================================

/// Kind of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Message produced by the outcome of a board action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.to_string(),
        }
    }
}

/// A delete waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: TaskId,
    pub title: String,
}

impl PendingDelete {
    /// Confirmation prompt.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "Are you sure you want to delete \"{}\"? This action cannot be undone.",
            self.title
        )
    }
}

// =============================================================================
// Task Board
// =============================================================================

/// The task screen without rendering.
#[derive(Debug)]
pub struct TaskBoard<A> {
    cache: TaskCache<A>,
    query: ViewQuery,
    view: MemoizedView,
    form: TaskForm,
    pending_delete: Option<PendingDelete>,
    notice: Option<Notice>,
}

impl<A: TaskApi> TaskBoard<A> {
    pub fn new(api: A) -> Self {
        Self {
            cache: TaskCache::new(api),
            query: ViewQuery::default(),
            view: MemoizedView::new(),
            form: TaskForm::new(),
            pending_delete: None,
            notice: None,
        }
    }

    pub const fn cache(&self) -> &TaskCache<A> {
        &self.cache
    }

    pub const fn form(&self) -> &TaskForm {
        &self.form
    }

    pub const fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub const fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    // =========================================================================
    // View
    // =========================================================================

    pub const fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.query = self.query.with_status(status);
    }

    pub fn set_priority_filter(&mut self, priority: PriorityFilter) {
        self.query = self.query.with_priority(priority);
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.query = self.query.with_sort(sort);
    }

    /// The filtered and sorted tasks for the current controls.
    pub fn visible_tasks(&mut self) -> &[Task] {
        self.view
            .view(self.cache.revision(), self.cache.tasks(), &self.query)
    }

    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::of(self.cache.tasks())
    }

    /// "Showing N of M tasks", or `None` while the collection is empty.
    pub fn summary(&mut self) -> Option<ViewSummary> {
        let total = self.cache.tasks().len();
        let visible = self.visible_tasks().len();
        (total > 0).then_some(ViewSummary { visible, total })
    }

    pub fn empty_state(&mut self) -> Option<EmptyState> {
        let total = self.cache.tasks().len();
        let visible = self.visible_tasks().len();
        EmptyState::of(total, visible)
    }

    /// Filter controls are only offered once there is something to filter.
    pub fn shows_filters(&self) -> bool {
        !self.cache.tasks().is_empty()
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Loads the collection. Failures show up as the cache error banner.
    ///
    /// # Errors
    ///
    /// Returns the cache's error.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.cache.load().await.map(|_| ())
    }

    /// Submits the create form.
    ///
    /// Validation failures stay inline on the form and produce no notice.
    ///
    /// # Errors
    ///
    /// Returns the form's error.
    pub async fn submit_form(&mut self, today: NaiveDate) -> Result<Task, ClientError> {
        let result = self.form.submit(&mut self.cache, today).await;
        match &result {
            Ok(_) => self.notice = Some(Notice::success("Task created successfully!")),
            Err(ClientError::Validation(_)) => {}
            Err(_) => self.notice = Some(Notice::error("Failed to create task")),
        }
        result
    }

    /// Applies a patch to one task.
    ///
    /// # Errors
    ///
    /// Returns the cache's error.
    pub async fn update_task(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ClientError> {
        let result = self.cache.update(id, patch).await;
        self.notice = Some(match &result {
            Ok(_) => Notice::success("Task updated successfully!"),
            Err(_) => Notice::error("Failed to update task"),
        });
        result
    }

    /// Moves a task to another workflow stage.
    ///
    /// # Errors
    ///
    /// Returns the cache's error.
    pub async fn change_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task, ClientError> {
        self.update_task(id, &TaskPatch::status(status)).await
    }

    /// Saves the in-place editor of a task.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` without any network call if the
    /// editor contents are invalid, otherwise the cache's error.
    pub async fn save_edit(&mut self, id: &TaskId, edit: &EditDraft) -> Result<Task, ClientError> {
        let patch = edit.to_client_patch()?;
        self.update_task(id, &patch).await
    }

    /// Asks for confirmation before deleting a task.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the task is not displayed.
    pub fn request_delete(&mut self, id: &TaskId) -> Result<&PendingDelete, ClientError> {
        let task = self
            .cache
            .get(id)
            .ok_or_else(|| ClientError::NotFound(format!("Task {id} is not in the local collection")))?;

        Ok(self.pending_delete.insert(PendingDelete {
            id: task.id.clone(),
            title: task.title.clone(),
        }))
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes the task awaiting confirmation. Does nothing if none is.
    ///
    /// The confirmation is closed whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the cache's error.
    pub async fn confirm_delete(&mut self) -> Result<(), ClientError> {
        let Some(pending) = self.pending_delete.take() else {
            return Ok(());
        };

        let result = self.cache.delete(&pending.id).await;
        self.notice = Some(match &result {
            Ok(()) => Notice::success("Task deleted successfully!"),
            Err(_) => Notice::error("Failed to delete task"),
        });
        result
    }
}

// =============================================================================
// Tests
// =============================================================================
