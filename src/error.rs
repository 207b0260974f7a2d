//! Error types for myai
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for myai operations
///
/// The three kinds the user ever sees are request failures (backend or
/// network), storage failures (local persistence) and parse failures
/// (malformed persisted state or imported files). None of them is fatal
/// to a running session.
#[derive(Error, Debug)]
pub enum MyAiError {
    /// Backend request failed (non-2xx status or transport failure)
    #[error("Request error{}: {message}", status_suffix(.status))]
    Request {
        /// HTTP status when the server answered, `None` for network failures
        status: Option<u16>,
        /// Server supplied detail or transport error text
        message: String,
    },

    /// Local persistence failed (serialization, quota, database)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed persisted JSON or imported document
    #[error("Parse error: {0}")]
    Parse(String),

    /// User input rejected before any state change
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Embedded key-value store errors
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
}

impl MyAiError {
    /// Build a request error for a non-2xx response
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Request {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status carried by a request error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

/// Result type alias for myai operations
///
/// Uses `anyhow::Error` so callers can attach context; match on the kind
/// with `err.downcast_ref::<MyAiError>()`.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_display_with_status() {
        let error = MyAiError::status(500, "Internal Server Error");
        assert_eq!(
            error.to_string(),
            "Request error (HTTP 500): Internal Server Error"
        );
    }

    #[test]
    fn test_request_error_display_without_status() {
        let error = MyAiError::Request {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(error.to_string(), "Request error: connection refused");
        assert_eq!(error.http_status(), None);
    }

    #[test]
    fn test_http_status_accessor() {
        let error = MyAiError::status(422, "Prompt cannot be empty");
        assert_eq!(error.http_status(), Some(422));
        assert_eq!(MyAiError::Storage("full".into()).http_status(), None);
    }

    #[test]
    fn test_storage_error_display() {
        let error = MyAiError::Storage("quota exceeded".to_string());
        assert_eq!(error.to_string(), "Storage error: quota exceeded");
    }

    #[test]
    fn test_parse_error_display() {
        let error = MyAiError::Parse("expected array".to_string());
        assert_eq!(error.to_string(), "Parse error: expected array");
    }

    #[test]
    fn test_config_error_display() {
        let error = MyAiError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: MyAiError = io_error.into();
        assert!(matches!(error, MyAiError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: MyAiError = json_error.into();
        assert!(matches!(error, MyAiError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: MyAiError = yaml_error.into();
        assert!(matches!(error, MyAiError::Yaml(_)));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let result: Result<()> = Err(MyAiError::status(503, "unavailable").into());
        let err = result.unwrap_err();
        let kind = err.downcast_ref::<MyAiError>().expect("MyAiError");
        assert_eq!(kind.http_status(), Some(503));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MyAiError>();
    }
}
