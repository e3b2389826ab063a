//! In-memory task store.
//!
//! Suitable for development and tests. The whole map sits behind a single
//! `tokio::sync::RwLock`; writers hold it for their complete
//! read-modify-write, so concurrent updates never interleave.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{NewTask, Task, TaskId, TaskPatch, Timestamp};
use crate::infrastructure::repository::{next_creation_time, sort_newest_first};
use crate::infrastructure::{StoreFuture, TaskRepository};

#[derive(Debug, Default)]
struct Storage {
    tasks: HashMap<TaskId, Task>,
    last_created_at: Option<Timestamp>,
}

/// In-memory implementation of `TaskRepository`.
///
/// Cloning yields a handle to the same storage.
///
/// # Example
///
/// ```ignore
/// let repository = InMemoryTaskRepository::new();
/// let task = repository.insert(NewTask::new("My Task")).await?;
/// let found = repository.find_by_id(&task.id).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    storage: Arc<RwLock<Storage>>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(clippy::significant_drop_tightening)]
impl TaskRepository for InMemoryTaskRepository {
    fn list(&self) -> StoreFuture<Vec<Task>> {
        let storage = Arc::clone(&self.storage);
        Box::pin(async move {
            let guard = storage.read().await;
            let mut tasks: Vec<Task> = guard.tasks.values().cloned().collect();
            drop(guard);

            sort_newest_first(&mut tasks);
            Ok(tasks)
        })
    }

    fn find_by_id(&self, id: &TaskId) -> StoreFuture<Option<Task>> {
        let storage = Arc::clone(&self.storage);
        let id = id.clone();
        Box::pin(async move {
            let guard = storage.read().await;
            Ok(guard.tasks.get(&id).cloned())
        })
    }

    fn insert(&self, draft: NewTask) -> StoreFuture<Task> {
        let storage = Arc::clone(&self.storage);
        Box::pin(async move {
            let mut guard = storage.write().await;

            let created_at = next_creation_time(guard.last_created_at, Timestamp::now());
            let task = Task::create(TaskId::generate(), draft, created_at);

            guard.last_created_at = Some(created_at);
            guard.tasks.insert(task.id.clone(), task.clone());
            Ok(task)
        })
    }

    fn update(&self, id: &TaskId, patch: TaskPatch) -> StoreFuture<Option<Task>> {
        let storage = Arc::clone(&self.storage);
        let id = id.clone();
        Box::pin(async move {
            let mut guard = storage.write().await;

            let Some(existing) = guard.tasks.remove(&id) else {
                return Ok(None);
            };
            let updated = existing.apply(patch);
            guard.tasks.insert(id, updated.clone());
            Ok(Some(updated))
        })
    }

    fn delete(&self, id: &TaskId) -> StoreFuture<bool> {
        let storage = Arc::clone(&self.storage);
        let id = id.clone();
        Box::pin(async move {
            let mut guard = storage.write().await;
            Ok(guard.tasks.remove(&id).is_some())
        })
    }

    fn count(&self) -> StoreFuture<u64> {
        let storage = Arc::clone(&self.storage);
        Box::pin(async move {
            let guard = storage.read().await;
            Ok(guard.tasks.len() as u64)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, TaskStatus};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_insert_assigns_id_and_defaults() {
        let repository = InMemoryTaskRepository::new();

        let task = repository.insert(NewTask::new("First")).await.unwrap();

        assert_eq!(task.title, "First");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(repository.count().await.unwrap(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_assigns_unique_ids_and_monotonic_timestamps() {
        let repository = InMemoryTaskRepository::new();

        let mut previous: Option<Task> = None;
        for index in 0..20 {
            let task = repository
                .insert(NewTask::new(format!("task {index}")))
                .await
                .unwrap();
            if let Some(previous) = previous {
                assert_ne!(previous.id, task.id);
                assert!(previous.created_at <= task.created_at);
            }
            previous = Some(task);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_is_newest_first() {
        let repository = InMemoryTaskRepository::new();
        let first = repository.insert(NewTask::new("first")).await.unwrap();
        let second = repository.insert(NewTask::new("second")).await.unwrap();

        let tasks = repository.list().await.unwrap();

        assert_eq!(tasks, vec![second, first]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_applies_patch() {
        let repository = InMemoryTaskRepository::new();
        let task = repository.insert(NewTask::new("before")).await.unwrap();

        let updated = repository
            .update(&task.id, TaskPatch::status(TaskStatus::Completed).with_title("after"))
            .await
            .unwrap()
            .expect("task should exist");

        assert_eq!(updated.title, "after");
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(
            repository.find_by_id(&task.id).await.unwrap(),
            Some(updated)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_unknown_id_returns_none() {
        let repository = InMemoryTaskRepository::new();

        let result = repository
            .update(&TaskId::generate(), TaskPatch::status(TaskStatus::Completed))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(repository.count().await.unwrap(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_reports_existence() {
        let repository = InMemoryTaskRepository::new();
        let task = repository.insert(NewTask::new("doomed")).await.unwrap();

        assert!(repository.delete(&task.id).await.unwrap());
        assert!(!repository.delete(&task.id).await.unwrap());
        assert!(repository.find_by_id(&task.id).await.unwrap().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_concurrent_updates_to_different_tasks_do_not_interfere() {
        let repository = InMemoryTaskRepository::new();
        let left = repository.insert(NewTask::new("left")).await.unwrap();
        let right = repository.insert(NewTask::new("right")).await.unwrap();

        let (left_result, right_result) = tokio::join!(
            repository.update(&left.id, TaskPatch::default().with_priority(Priority::High)),
            repository.update(&right.id, TaskPatch::status(TaskStatus::InProgress)),
        );

        let left_updated = left_result.unwrap().unwrap();
        let right_updated = right_result.unwrap().unwrap();
        assert_eq!(left_updated.priority, Priority::High);
        assert_eq!(left_updated.status, TaskStatus::Todo);
        assert_eq!(right_updated.status, TaskStatus::InProgress);
        assert_eq!(right_updated.priority, Priority::Medium);
    }
}
