use thiserror::Error;

pub type ChecklistResult<T> = Result<T, ChecklistError>;

#[derive(Error, Debug)]
pub enum ChecklistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Already exists: {0}")]
    DuplicateIdentity(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChecklistError {
    /// Failures caused by the request itself rather than by storage or I/O.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ChecklistError::DuplicateIdentity(_)
                | ChecklistError::Auth(_)
                | ChecklistError::Forbidden(_)
                | ChecklistError::NotFound(_)
        )
    }
}
