use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors surfaced by the comparison core.
///
/// None of these are fatal: every variant is turned into an [`AppResponse`]
/// at the FFI boundary and handed back to the user as a message.
///
/// [`AppResponse`]: crate::app_response::AppResponse
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComparisonError {
    /// The durable store could not be opened, read or written.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// An update targeted an id that no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input was rejected as a whole; state is untouched.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<lmdb::Error> for ComparisonError {
    fn from(err: lmdb::Error) -> Self {
        match err {
            lmdb::Error::MapFull => {
                ComparisonError::Storage("store is full (map size exceeded)".to_string())
            }
            lmdb::Error::Corrupted => {
                ComparisonError::Storage("store is corrupted".to_string())
            }
            lmdb::Error::Other(code) => {
                ComparisonError::Storage(format!("system error code {code}"))
            }
            _ => ComparisonError::Storage(err.to_string()),
        }
    }
}

impl From<SerdeError> for ComparisonError {
    fn from(err: SerdeError) -> Self {
        ComparisonError::Serialization(format!("JSON error: {err}"))
    }
}

impl From<std::io::Error> for ComparisonError {
    fn from(err: std::io::Error) -> Self {
        ComparisonError::Storage(format!("IO error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ComparisonError>;
