use tasklab_domain::UnknownActionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Any failure talking to GitLab. Network errors and remote rejections
    /// are deliberately not told apart.
    #[error("unknown connection error while {operation}: {message}")]
    RemoteUnavailable {
        operation: &'static str,
        message: String,
    },

    #[error(transparent)]
    UnknownOperation(#[from] UnknownActionError),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("task id '{0}' is not a GitLab issue iid")]
    InvalidTaskId(String),
}

impl ConnectorError {
    pub fn remote(operation: &'static str, error: anyhow::Error) -> Self {
        Self::RemoteUnavailable {
            operation,
            message: format!("{error:#}"),
        }
    }
}

pub type Result<T, E = ConnectorError> = std::result::Result<T, E>;
