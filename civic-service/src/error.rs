use document_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types. Services catch backend failures, log them, and
/// surface one of these instead of panicking across the caller boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("You must be signed in to perform this action")]
    AuthenticationRequired,

    #[error("You don't have permission to perform this action")]
    AuthorizationDenied,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                AppError::NotFound(format!("{}/{}", collection, id))
            }
            StoreError::Unavailable(msg) => AppError::BackendUnavailable(msg),
            StoreError::Serialization(err) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
