//! In-process [`TaskApi`] double for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::api::{ApiFuture, TaskApi};
use super::error::ClientError;
use crate::domain::{NewTask, Task, TaskId, TaskPatch};
use crate::infrastructure::{InMemoryTaskRepository, RepositoryError, TaskRepository};

/// Serves calls from an in-memory store, with switchable failures.
#[derive(Debug, Clone, Default)]
pub struct FakeTaskApi {
    repository: InMemoryTaskRepository,
    failure: Arc<Mutex<Option<ClientError>>>,
    keep_deleted: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl FakeTaskApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store behind the fake, for arranging server-side state.
    pub const fn repository(&self) -> &InMemoryTaskRepository {
        &self.repository
    }

    /// Makes every following call fail with `error` until cleared.
    pub fn fail_with(&self, error: Option<ClientError>) {
        *self.failure.lock().unwrap() = error;
    }

    /// Acknowledges deletes without removing anything, like a lagging replica.
    pub fn keep_deleted(&self, keep: bool) {
        self.keep_deleted.store(keep, Ordering::SeqCst);
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.failure.lock().unwrap().clone().map_or(Ok(()), Err)
    }
}

fn transport(error: RepositoryError) -> ClientError {
    ClientError::Transport(error.to_string())
}

impl TaskApi for FakeTaskApi {
    fn list_tasks(&self) -> ApiFuture<Vec<Task>> {
        let started = self.begin();
        let repository = self.repository.clone();
        Box::pin(async move {
            started?;
            repository.list().await.map_err(transport)
        })
    }

    fn create_task(&self, draft: &NewTask) -> ApiFuture<Task> {
        let started = self.begin();
        let repository = self.repository.clone();
        let draft = draft.clone();
        Box::pin(async move {
            started?;
            repository.insert(draft).await.map_err(transport)
        })
    }

    fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> ApiFuture<Task> {
        let started = self.begin();
        let repository = self.repository.clone();
        let id = id.clone();
        let patch = patch.clone();
        Box::pin(async move {
            started?;
            repository
                .update(&id, patch)
                .await
                .map_err(transport)?
                .ok_or_else(|| ClientError::NotFound(format!("Task {id} not found")))
        })
    }

    fn delete_task(&self, id: &TaskId) -> ApiFuture<()> {
        let started = self.begin();
        let repository = self.repository.clone();
        let keep_deleted = self.keep_deleted.load(Ordering::SeqCst);
        let id = id.clone();
        Box::pin(async move {
            started?;
            if keep_deleted {
                return Ok(());
            }
            if repository.delete(&id).await.map_err(transport)? {
                Ok(())
            } else {
                Err(ClientError::NotFound(format!("Task {id} not found")))
            }
        })
    }
}
