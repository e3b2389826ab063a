//! Client-side error taxonomy.

use thiserror::Error;

use super::config::ClientConfigError;

/// Failure of a client operation.
///
/// Every variant is recoverable; retrying the user action is always allowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Local input was rejected before any request was sent.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The task does not exist, on the server or in the local collection.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server could not be reached or its response could not be read.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ClientConfigError),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_display() {
        let error = ClientError::Api {
            status: 400,
            code: "VALIDATION_ERROR".to_string(),
            message: "Validation failed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "API error 400 (VALIDATION_ERROR): Validation failed"
        );
        assert_eq!(
            ClientError::NotFound("task 7".to_string()).to_string(),
            "Not found: task 7"
        );
    }
}
