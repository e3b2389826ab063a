//! Task Collection Cache.
//!
//! A local, ordered mirror of the server's task collection. It is replaced
//! wholesale by [`TaskCache::load`] and patched by each successful mutation.
//! The server stays the source of truth.
//!
//! All operations take `&mut self`, so the owner serializes every mutation.
//! Share a cache between tasks with `tokio::sync::Mutex<TaskCache<_>>`.
//!
//! Ids deleted through the cache are remembered; a later `load` or `update`
//! response carrying such an id is ignored, so a slow response cannot bring
//! a deleted task back. An id is forgotten once a load no longer returns it.

use std::collections::HashSet;

use super::api::TaskApi;
use super::error::ClientError;
use crate::domain::{NewTask, Task, TaskId, TaskPatch};

pub const FETCH_FAILED: &str = "Failed to fetch tasks";
pub const CREATE_FAILED: &str = "Failed to create task";
pub const UPDATE_FAILED: &str = "Failed to update task";
pub const DELETE_FAILED: &str = "Failed to delete task";

/// Status of the collection as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No load has completed yet, or one is in progress.
    #[default]
    Loading,
    /// The last load succeeded.
    Ready,
    /// The last load failed; any earlier collection is still held.
    Error,
}

/// Client-side mirror of the task collection.
#[derive(Debug)]
pub struct TaskCache<A> {
    api: A,
    tasks: Vec<Task>,
    state: LoadState,
    error: Option<String>,
    deleted: HashSet<TaskId>,
    revision: u64,
}

impl<A: TaskApi> TaskCache<A> {
    /// Creates an empty cache in the `Loading` state.
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            state: LoadState::Loading,
            error: None,
            deleted: HashSet::new(),
            revision: 0,
        }
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The collection in its canonical order (newest created first).
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == *id)
    }

    pub const fn state(&self) -> LoadState {
        self.state
    }

    /// The last failure message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Change counter of the collection.
    ///
    /// Increases whenever the collection changes and stays put otherwise,
    /// so it can key memoized derivations.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[cfg(test)]
    fn remembered_deletions(&self) -> usize {
        self.deleted.len()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Fetches the full collection with exactly one call.
    ///
    /// On success the collection is replaced and the error cleared. On
    /// failure the previous collection is kept.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure after recording [`FETCH_FAILED`].
    pub async fn load(&mut self) -> Result<&[Task], ClientError> {
        self.state = LoadState::Loading;

        match self.api.list_tasks().await {
            Ok(tasks) => {
                self.deleted.retain(|id| tasks.iter().any(|task| task.id == *id));
                let tasks: Vec<Task> = tasks
                    .into_iter()
                    .filter(|task| !self.deleted.contains(&task.id))
                    .collect();
                self.replace(tasks);
                self.error = None;
                self.state = LoadState::Ready;
                Ok(&self.tasks)
            }
            Err(error) => {
                self.record_failure(FETCH_FAILED, &error);
                self.state = LoadState::Error;
                Err(error)
            }
        }
    }

    /// Creates a task and puts the server's copy at the front.
    ///
    /// A task with the same id is never held twice.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure after recording [`CREATE_FAILED`].
    pub async fn create(&mut self, draft: &NewTask) -> Result<Task, ClientError> {
        match self.api.create_task(draft).await {
            Ok(task) => {
                self.tasks.retain(|existing| existing.id != task.id);
                self.tasks.insert(0, task.clone());
                self.revision += 1;
                Ok(task)
            }
            Err(error) => {
                self.record_failure(CREATE_FAILED, &error);
                Err(error)
            }
        }
    }

    /// Updates a task and replaces the local entry with the server's copy.
    ///
    /// Never inserts: if the entry is gone by the time the response
    /// arrives, the response is dropped and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure, or `ClientError::NotFound` when the
    /// entry is absent locally, after recording [`UPDATE_FAILED`].
    pub async fn update(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ClientError> {
        let task = match self.api.update_task(id, patch).await {
            Ok(task) => task,
            Err(error) => {
                self.record_failure(UPDATE_FAILED, &error);
                return Err(error);
            }
        };

        let slot = if self.deleted.contains(id) {
            None
        } else {
            self.tasks.iter_mut().find(|existing| existing.id == *id)
        };

        if let Some(slot) = slot {
            if *slot != task {
                *slot = task.clone();
                self.revision += 1;
            }
            Ok(task)
        } else {
            tracing::warn!(task_id = %id, "Updated task is not in the local collection; response ignored");
            let error = ClientError::NotFound(format!("Task {id} is not in the local collection"));
            self.record_failure(UPDATE_FAILED, &error);
            Err(error)
        }
    }

    /// Deletes a task and removes the local entry.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure after recording [`DELETE_FAILED`]; the
    /// collection is left as it was.
    pub async fn delete(&mut self, id: &TaskId) -> Result<(), ClientError> {
        match self.api.delete_task(id).await {
            Ok(()) => {
                self.deleted.insert(id.clone());
                let before = self.tasks.len();
                self.tasks.retain(|task| task.id != *id);
                if self.tasks.len() != before {
                    self.revision += 1;
                }
                Ok(())
            }
            Err(error) => {
                self.record_failure(DELETE_FAILED, &error);
                Err(error)
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn replace(&mut self, tasks: Vec<Task>) {
        if self.tasks != tasks {
            self.tasks = tasks;
            self.revision += 1;
        }
    }

    fn record_failure(&mut self, message: &str, error: &ClientError) {
        tracing::warn!(%error, "{message}");
        self.error = Some(message.to_string());
    }
}

// =============================================================================
// Tests
// =============================================================================
