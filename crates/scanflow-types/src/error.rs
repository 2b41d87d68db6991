use thiserror::Error;

/// Errors from chain store repository operations (trait definitions live
/// in scanflow-core, implementations in scanflow-infra).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Fatal conditions that abort a workflow run.
///
/// Every variant except the provider-level fallback inside the executor
/// short-circuits the run to a `{success: false, error}` result. Audit
/// logging failures are deliberately absent: they are recovered locally
/// and never surfaced as run failures.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("chain store unavailable: {0}")]
    Store(#[from] RepositoryError),

    #[error("no workflow start point found")]
    NoStartPoint,

    #[error("found {0} workflow start points, expected exactly 1")]
    MultipleStartPoints(usize),

    #[error("prompt {0} referenced by chain edge does not exist")]
    PromptNotFound(uuid::Uuid),

    #[error("all model providers failed for task '{task}'")]
    AllProvidersFailed { task: String },

    #[error("model returned an empty response")]
    EmptyModelResponse,

    #[error("model response was not a valid JSON object: {0}")]
    InvalidModelOutput(String),

    #[error("workflow exceeded the maximum of {max} steps")]
    MaxStepsExceeded { max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_workflow_error_display() {
        let err = WorkflowError::MaxStepsExceeded { max: 10 };
        assert_eq!(err.to_string(), "workflow exceeded the maximum of 10 steps");

        let err = WorkflowError::MultipleStartPoints(3);
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_store_error_wraps_repository_error() {
        let err: WorkflowError = RepositoryError::Connection.into();
        assert!(err.to_string().contains("database connection error"));
    }
}
