use std::fmt;

#[derive(Debug)]
pub enum AppError {
    // Remote catalog and transport
    Network(String),
    Parse(String),
    // Document store and identity
    NotFound(String),
    SelfReference,
    Unauthenticated,
    Unauthorized(String),
    Conflict(String),
    Validation(String),
    Database(String),
    // Multi-write and multi-source failures
    PartialWriteFailure { completed: String, failed: String },
    HydrateFailed { catalog: Box<AppError>, favorites: Box<AppError> },
    Configuration(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Parse(msg) => write!(f, "Parse error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::SelfReference => write!(f, "You can't add yourself"),
            AppError::Unauthenticated => write!(f, "Not authenticated"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::PartialWriteFailure { completed, failed } => write!(
                f,
                "Partial write failure: completed [{}] but failed [{}]",
                completed, failed
            ),
            AppError::HydrateFailed { catalog, favorites } => write!(
                f,
                "Hydrate failed: catalog ({}), favorites ({})",
                catalog, favorites
            ),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Message suitable for showing next to the action that failed.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(_) => "Could not reach the server".to_string(),
            AppError::Parse(_) => "The server sent an unexpected response".to_string(),
            AppError::NotFound(_) => "User not found".to_string(),
            AppError::SelfReference => "You can't add yourself".to_string(),
            AppError::Unauthenticated => "Not authenticated".to_string(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::PartialWriteFailure { .. } => {
                "The friendship was only partially updated, please try again".to_string()
            }
            AppError::HydrateFailed { .. } => "Could not load films or favorites".to_string(),
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                "Something went wrong".to_string()
            }
        }
    }

    /// True for failures where retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Database(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
