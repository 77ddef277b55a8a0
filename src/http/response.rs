//! Response bodies and the `/api/data` error type.

use std::any::Any;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SUCCESS_MESSAGE: &str = "Data retrieved successfully!";
pub const SIMULATED_ERROR_MESSAGE: &str = "Simulated internal service error";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Successful body of `GET /api/data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPayload {
    pub message: String,
    pub value: u32,
}

impl DataPayload {
    pub fn new(value: u32) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            value,
        }
    }
}

/// Error body returned with a 500.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Ways a data request can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// The injected failure.
    #[error("{}", SIMULATED_ERROR_MESSAGE)]
    Simulated,

    /// Anything else, typically a panic in the handler body.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl DataError {
    /// Build from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        DataError::Unexpected(detail)
    }

    /// Exception type recorded on the failing span.
    pub fn kind(&self) -> &'static str {
        match self {
            DataError::Simulated => "DataError::Simulated",
            DataError::Unexpected(_) => "DataError::Unexpected",
        }
    }

    /// Message that may be shown to the client.
    ///
    /// The simulated error is passed through verbatim; unexpected failures
    /// are always reduced to a generic message.
    pub fn client_message(&self) -> &'static str {
        match self {
            DataError::Simulated => SIMULATED_ERROR_MESSAGE,
            DataError::Unexpected(_) => UNEXPECTED_ERROR_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let json = serde_json::to_value(DataPayload::new(7)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "Data retrieved successfully!", "value": 7})
        );
    }

    #[test]
    fn test_health_shape() {
        let json = serde_json::to_value(HealthStatus::healthy()).unwrap();
        assert_eq!(json, serde_json::json!({"status": "healthy"}));
    }

    #[test]
    fn test_unexpected_error_hides_detail() {
        let err = DataError::from_panic(Box::new("index out of bounds"));
        assert_eq!(err, DataError::Unexpected("index out of bounds".into()));
        assert_eq!(err.client_message(), "An unexpected error occurred");
    }

    #[test]
    fn test_panic_payload_variants() {
        let owned = DataError::from_panic(Box::new(String::from("owned")));
        assert_eq!(owned, DataError::Unexpected("owned".into()));
        let other = DataError::from_panic(Box::new(42u8));
        assert_eq!(other, DataError::Unexpected("non-string panic payload".into()));
    }

    #[test]
    fn test_simulated_error_message() {
        assert_eq!(DataError::Simulated.to_string(), "Simulated internal service error");
        assert_eq!(
            DataError::Simulated.client_message(),
            "Simulated internal service error"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(DataError::Simulated.kind(), "DataError::Simulated");
        assert_eq!(DataError::Unexpected("x".into()).kind(), "DataError::Unexpected");
    }
}
