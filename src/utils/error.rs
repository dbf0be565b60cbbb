use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no extraction strategy matched")]
    NotFound,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request blocked with status {status}")]
    Blocked { status: u16 },

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Invalid format: {0:?}")]
    InvalidFormat(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Notification error: {notifier}: {message}")]
    Notification { notifier: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Per-item failures are recorded and skipped; everything else ends the run.
    pub fn is_item_scoped(&self) -> bool {
        matches!(
            self,
            AppError::Transport(_)
                | AppError::Blocked { .. }
                | AppError::Extraction(_)
                | AppError::InvalidFormat(_)
                | AppError::Http(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
