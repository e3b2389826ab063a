//! Repository trait for the task store.
//!
//! Every method returns a boxed future so that the backend can be selected
//! at runtime and shared as `Arc<dyn TaskRepository>`.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{NewTask, Task, TaskId, TaskPatch, Timestamp};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
///
/// Unknown ids are not errors; they surface as `None` or `false`.
#[derive(Debug, Error, Clone)]
pub enum RepositoryError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Deferred result of a store operation.
pub type StoreFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

// =============================================================================
// Task Repository
// =============================================================================

/// Persistence boundary for tasks, keyed by [`TaskId`].
///
/// Implementations must make unknown ids distinguishable from success
/// (`Ok(None)` / `Ok(false)`) and must not let updates of different tasks
/// interfere with each other.
pub trait TaskRepository: Send + Sync {
    /// Lists every task, newest `created_at` first.
    fn list(&self) -> StoreFuture<Vec<Task>>;

    /// Finds a task by its ID.
    ///
    /// Returns `Ok(None)` if no task has this ID.
    fn find_by_id(&self, id: &TaskId) -> StoreFuture<Option<Task>>;

    /// Persists a new task, assigning its `id` and `created_at`.
    fn insert(&self, draft: NewTask) -> StoreFuture<Task>;

    /// Applies a partial update.
    ///
    /// Returns `Ok(None)` if no task has this ID, otherwise the stored result.
    fn update(&self, id: &TaskId, patch: TaskPatch) -> StoreFuture<Option<Task>>;

    /// Deletes a task by its ID.
    ///
    /// Returns `Ok(true)` if the task was deleted, `Ok(false)` if it didn't exist.
    fn delete(&self, id: &TaskId) -> StoreFuture<bool>;

    /// Counts all tasks.
    fn count(&self) -> StoreFuture<u64>;
}

/// Orders tasks newest first, breaking ties by descending id.
///
/// Ids are time-ordered, so the tie-break follows creation order too.
pub fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.id.cmp(&left.id))
    });
}

/// Returns a creation timestamp that is never earlier than `previous`.
///
/// Stores call this so that `created_at` is non-decreasing in creation
/// order even if the wall clock steps backwards.
#[must_use]
pub fn next_creation_time(previous: Option<Timestamp>, now: Timestamp) -> Timestamp {
    previous.map_or(now, |previous| previous.max(now))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rstest::rstest;

    #[rstest]
    fn test_repository_error_display() {
        let error = RepositoryError::SerializationError("bad status".to_string());
        assert_eq!(format!("{error}"), "Serialization error: bad status");

        let error = RepositoryError::DatabaseError("connection refused".to_string());
        assert_eq!(format!("{error}"), "Database error: connection refused");
    }

    #[rstest]
    fn test_next_creation_time_never_goes_backwards() {
        let later = Timestamp::now();
        let earlier = Timestamp::from_datetime(*later.as_datetime() - Duration::seconds(5));

        assert_eq!(next_creation_time(Some(later), earlier), later);
        assert_eq!(next_creation_time(Some(earlier), later), later);
        assert_eq!(next_creation_time(None, earlier), earlier);
    }

    #[rstest]
    fn test_sort_newest_first() {
        let base = Utc::now();
        let mut tasks: Vec<Task> = (0..3)
            .map(|offset| {
                Task::create(
                    TaskId::generate(),
                    NewTask::new(format!("task {offset}")),
                    Timestamp::from_datetime(base + Duration::seconds(offset)),
                )
            })
            .collect();

        sort_newest_first(&mut tasks);

        let titles: Vec<&str> = tasks.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["task 2", "task 1", "task 0"]);
    }
}
