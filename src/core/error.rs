use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TallyError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("invalid date format in {field}: {reason}")]
    InvalidDateFormat { field: String, reason: String },
    #[error("dates are not in correct chronological order")]
    ChronologicalOrder,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("cannot decode record: {0}")]
    DecodeError(String),
    #[error("{0}")]
    NotFound(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl TallyError {
    /// True for errors caused by the request itself rather than the backends.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TallyError::InvalidRequest(_)
                | TallyError::InvalidDateFormat { .. }
                | TallyError::ChronologicalOrder
                | TallyError::NotFound(_)
        )
    }
}

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        TallyError::IoError(err.to_string())
    }
}

impl From<redis::RedisError> for TallyError {
    fn from(err: redis::RedisError) -> Self {
        TallyError::StorageUnavailable(err.to_string())
    }
}

impl From<mongodb::error::Error> for TallyError {
    fn from(err: mongodb::error::Error) -> Self {
        TallyError::StorageUnavailable(err.to_string())
    }
}
