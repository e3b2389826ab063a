//! `PostgreSQL` task store.
//!
//! Tasks are stored as JSON documents, one row per task. The `created_at`
//! column duplicates the document field so that listing can be ordered by
//! the database.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY,
//!     data JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE INDEX idx_tasks_created_at ON tasks(created_at DESC, id DESC);
//! CREATE TABLE task_clock (
//!     id BOOLEAN PRIMARY KEY DEFAULT TRUE CHECK (id),
//!     last_created_at TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! `task_clock` holds a single row: the latest `created_at` ever assigned.
//! It outlives deletes, so a new task is never stamped earlier than one
//! that has since been removed.

use chrono::{SubsecRound, Utc};
use sqlx::PgPool;

use crate::domain::{NewTask, Task, TaskId, TaskPatch, Timestamp};
use crate::infrastructure::repository::next_creation_time;
use crate::infrastructure::{RepositoryError, StoreFuture, TaskRepository};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id UUID PRIMARY KEY,
    data JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const CREATE_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at DESC, id DESC)";

const CREATE_CLOCK_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS task_clock (
    id BOOLEAN PRIMARY KEY DEFAULT TRUE CHECK (id),
    last_created_at TIMESTAMPTZ NOT NULL
)";

/// Latest creation time assigned so far, including deleted tasks.
const LATEST_CREATED_AT_SQL: &str = "SELECT GREATEST(
    (SELECT MAX(created_at) FROM tasks),
    (SELECT last_created_at FROM task_clock WHERE id)
)";

const ADVANCE_CLOCK_SQL: &str = "INSERT INTO task_clock (id, last_created_at) VALUES (TRUE, $1)
ON CONFLICT (id) DO UPDATE
SET last_created_at = GREATEST(task_clock.last_created_at, EXCLUDED.last_created_at)";

/// Advisory lock key serializing inserts so that `created_at` stays monotonic.
const INSERT_LOCK_KEY: i64 = 0x7461_736B;

// =============================================================================
// Helper Functions
// =============================================================================

fn database_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

fn serialization_error(error: serde_json::Error) -> RepositoryError {
    RepositoryError::SerializationError(error.to_string())
}

/// Decodes a stored document into a task.
fn decode_task(data: serde_json::Value) -> Result<Task, RepositoryError> {
    serde_json::from_value(data).map_err(serialization_error)
}

/// Encodes a task into the document stored in the `data` column.
fn encode_task(task: &Task) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(task).map_err(serialization_error)
}

/// Current time at the column's microsecond precision.
///
/// Keeps the document and the column in agreement.
fn database_now() -> Timestamp {
    Timestamp::from_datetime(Utc::now().trunc_subsecs(6))
}

// =============================================================================
// PostgreSQL Task Repository
// =============================================================================

/// `PostgreSQL` implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/tasks").await?;
/// let repository = PostgresTaskRepository::new(pool);
/// repository.ensure_schema().await?;
/// let task = repository.insert(NewTask::new("My Task")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new `PostgreSQL` task repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `tasks` and `task_clock` tables and the index if they do
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DatabaseError` if a statement fails.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        for statement in [CREATE_TABLE_SQL, CREATE_INDEX_SQL, CREATE_CLOCK_TABLE_SQL] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(database_error)?;
        }
        Ok(())
    }
}

impl TaskRepository for PostgresTaskRepository {
    fn list(&self) -> StoreFuture<Vec<Task>> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let rows: Vec<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM tasks ORDER BY created_at DESC, id DESC")
                    .fetch_all(&pool)
                    .await
                    .map_err(database_error)?;

            rows.into_iter().map(|(data,)| decode_task(data)).collect()
        })
    }

    fn find_by_id(&self, id: &TaskId) -> StoreFuture<Option<Task>> {
        let pool = self.pool.clone();
        let task_id = id.clone();

        Box::pin(async move {
            let row: Option<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM tasks WHERE id = $1")
                    .bind(task_id.as_uuid())
                    .fetch_optional(&pool)
                    .await
                    .map_err(database_error)?;

            row.map(|(data,)| decode_task(data)).transpose()
        })
    }

    fn insert(&self, draft: NewTask) -> StoreFuture<Task> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let mut transaction = pool.begin().await.map_err(database_error)?;

            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(INSERT_LOCK_KEY)
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            let (latest,): (Option<chrono::DateTime<Utc>>,) =
                sqlx::query_as(LATEST_CREATED_AT_SQL)
                    .fetch_one(&mut *transaction)
                    .await
                    .map_err(database_error)?;

            let created_at =
                next_creation_time(latest.map(Timestamp::from_datetime), database_now());
            let task = Task::create(TaskId::generate(), draft, created_at);
            let data = encode_task(&task)?;

            sqlx::query("INSERT INTO tasks (id, data, created_at) VALUES ($1, $2, $3)")
                .bind(task.id.as_uuid())
                .bind(&data)
                .bind(created_at.as_datetime())
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            sqlx::query(ADVANCE_CLOCK_SQL)
                .bind(created_at.as_datetime())
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            transaction.commit().await.map_err(database_error)?;
            Ok(task)
        })
    }

    fn update(&self, id: &TaskId, patch: TaskPatch) -> StoreFuture<Option<Task>> {
        let pool = self.pool.clone();
        let task_id = id.clone();

        Box::pin(async move {
            let mut transaction = pool.begin().await.map_err(database_error)?;

            let existing: Option<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM tasks WHERE id = $1 FOR UPDATE")
                    .bind(task_id.as_uuid())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(database_error)?;

            let Some((data,)) = existing else {
                return Ok(None);
            };

            let updated = decode_task(data)?.apply(patch);
            let data = encode_task(&updated)?;

            sqlx::query("UPDATE tasks SET data = $1 WHERE id = $2")
                .bind(&data)
                .bind(task_id.as_uuid())
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            transaction.commit().await.map_err(database_error)?;
            Ok(Some(updated))
        })
    }

    fn delete(&self, id: &TaskId) -> StoreFuture<bool> {
        let pool = self.pool.clone();
        let task_id = id.clone();

        Box::pin(async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(task_id.as_uuid())
                .execute(&pool)
                .await
                .map_err(database_error)?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn count(&self) -> StoreFuture<u64> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
                .fetch_one(&pool)
                .await
                .map_err(database_error)?;

            Ok(u64::try_from(count).unwrap_or_default())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
