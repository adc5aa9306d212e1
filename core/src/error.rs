use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported unit conversion: {from} -> {to}")]
    UnsupportedUnit { from: String, to: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid ride: {0}")]
    InvalidRide(String),

    #[error("Corrupt data in {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn unsupported_unit(from: impl ToString, to: impl ToString) -> Self {
        Error::UnsupportedUnit {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Corrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors the user can fix by changing their input.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedUnit { .. } | Error::NotFound(_) | Error::Validation(_)
        )
    }
}
