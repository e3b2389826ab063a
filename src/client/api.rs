//! Remote task API as seen by the client.
//!
//! [`TaskApi`] is the seam between the cache and the network.
//! [`HttpTaskApi`] talks to the server over HTTP with `reqwest`.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::config::ClientConfig;
use super::error::ClientError;
use crate::api::{ApiError, TaskResponse};
use crate::domain::{NewTask, Task, TaskId, TaskPatch};

/// Deferred result of a remote call.
pub type ApiFuture<T> = BoxFuture<'static, Result<T, ClientError>>;

// =============================================================================
// Task API
// =============================================================================

/// The four remote operations the client relies on.
///
/// Each call resolves or fails exactly once; implementations do not retry.
pub trait TaskApi: Send + Sync {
    /// Fetches the whole collection in server order.
    fn list_tasks(&self) -> ApiFuture<Vec<Task>>;

    /// Creates a task and returns the stored representation.
    fn create_task(&self, draft: &NewTask) -> ApiFuture<Task>;

    /// Applies a partial update and returns the stored representation.
    fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> ApiFuture<Task>;

    /// Deletes a task.
    fn delete_task(&self, id: &TaskId) -> ApiFuture<()>;
}

impl<T: TaskApi + ?Sized> TaskApi for Arc<T> {
    fn list_tasks(&self) -> ApiFuture<Vec<Task>> {
        (**self).list_tasks()
    }

    fn create_task(&self, draft: &NewTask) -> ApiFuture<Task> {
        (**self).create_task(draft)
    }

    fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> ApiFuture<Task> {
        (**self).update_task(id, patch)
    }

    fn delete_task(&self, id: &TaskId) -> ApiFuture<()> {
        (**self).delete_task(id)
    }
}

// =============================================================================
// HTTP Task API
// =============================================================================

/// [`TaskApi`] over HTTP.
///
/// # Example
///
/// ```ignore
/// let api = HttpTaskApi::from_env()?;
/// let tasks = api.list_tasks().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    config: ClientConfig,
}

impl HttpTaskApi {
    /// Creates a client for the configured API root.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Creates a client configured from `TASK_API_BASE_URL` and
    /// `TASK_API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if either variable is invalid,
    /// or `ClientError::Transport` if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl TaskApi for HttpTaskApi {
    fn list_tasks(&self) -> ApiFuture<Vec<Task>> {
        let request = self.client.get(self.config.tasks_url());

        Box::pin(async move {
            let response = request.send().await?;
            let tasks: Vec<TaskResponse> = parse_response(response).await?;
            Ok(tasks.into_iter().map(Task::from).collect())
        })
    }

    fn create_task(&self, draft: &NewTask) -> ApiFuture<Task> {
        let request = self.client.post(self.config.tasks_url()).json(draft);

        Box::pin(async move {
            let response = request.send().await?;
            let task: TaskResponse = parse_response(response).await?;
            Ok(Task::from(task))
        })
    }

    fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> ApiFuture<Task> {
        let request = self.client.patch(self.config.task_url(id)).json(patch);

        Box::pin(async move {
            let response = request.send().await?;
            let task: TaskResponse = parse_response(response).await?;
            Ok(Task::from(task))
        })
    }

    fn delete_task(&self, id: &TaskId) -> ApiFuture<()> {
        let request = self.client.delete(self.config.task_url(id));

        Box::pin(async move {
            let response = request.send().await?;
            check_status(response).await?;
            Ok(())
        })
    }
}

// =============================================================================
// Response Handling
// =============================================================================

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = check_status(response).await?;
    response
        .json()
        .await
        .map_err(|error| ClientError::Transport(format!("invalid response body: {error}")))
}

/// Passes successful responses through and turns the rest into errors.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<ApiError>().await.ok();
    Err(status_error(status, body))
}

fn status_error(status: StatusCode, body: Option<ApiError>) -> ClientError {
    let (code, message) = body.map_or_else(
        || {
            (
                "UNKNOWN".to_string(),
                status
                    .canonical_reason()
                    .unwrap_or("Unexpected response")
                    .to_string(),
            )
        },
        |error| (error.code, error.message),
    );

    if status == StatusCode::NOT_FOUND {
        ClientError::NotFound(message)
    } else {
        ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        }
    }
}
