use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unknown agent '{name}': expected one of {expected}, or 'all'")]
    UnknownAgent { name: String, expected: String },

    #[error("--project and --user are mutually exclusive")]
    ConflictingLevel,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("invalid archive: {0}")]
    Archive(String),

    #[error("failed to stage archive")]
    Staging(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl InstallError {
    /// Errors caused by bad arguments rather than by the environment.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            InstallError::UnknownAgent { .. } | InstallError::ConflictingLevel
        )
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("archive exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Io(_) => true,
            FetchError::Status(code) => *code == 429 || *code >= 500,
            FetchError::TooLarge { .. } => false,
        }
    }
}

/// A filesystem failure attributed to a single agent destination.
#[derive(Debug, Error)]
#[error("failed to {action} {}: {source}", .path.display())]
pub struct DeployError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl DeployError {
    pub fn new(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;
