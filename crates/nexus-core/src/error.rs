use thiserror::Error;

#[derive(Debug, Error)]
pub enum NexusError {
    #[error("not signed in: run 'nexus login' first")]
    NotSignedIn,

    #[error("{0}")]
    Validation(String),

    #[error("Account with this email already exists.")]
    EmailTaken,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("team member not found: {0}")]
    MemberNotFound(String),

    #[error("no project completion is awaiting confirmation")]
    NothingStaged,

    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("storage quota exceeded while writing '{0}'")]
    QuotaExceeded(String),

    #[error("storage error on '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NexusError {
    pub fn validation(msg: impl Into<String>) -> Self {
        NexusError::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, NexusError>;
