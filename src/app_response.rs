use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::error::ComparisonError;

/// Envelope returned across the FFI boundary, serialized as JSON.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl From<ComparisonError> for AppResponse {
    fn from(err: ComparisonError) -> Self {
        match err {
            ComparisonError::Storage(msg) => AppResponse::DatabaseError(msg),
            ComparisonError::Serialization(msg) => AppResponse::SerializationError(msg),
            ComparisonError::NotFound(msg) => AppResponse::NotFound(msg),
            ComparisonError::Validation(msg) => AppResponse::ValidationError(msg),
            ComparisonError::BadRequest(msg) => AppResponse::BadRequest(msg),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AppResponse::Ok(_))
    }
}
