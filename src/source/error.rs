//! Error types for data sources.

use thiserror::Error;

/// Errors that can occur when fetching dashboard data.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Failed to parse response or dump.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Service answered with a non-success status.
    #[error("Service returned status {0}")]
    Status(u16),

    /// Query rejected before it was sent.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Reading a dump file failed.
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::Connection(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::Status(status.as_u16())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(SourceError::Status(503).to_string(), "Service returned status 503");
        assert_eq!(SourceError::Timeout.to_string(), "Request timed out");
    }

    #[test]
    fn test_json_errors_are_parse_errors() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(SourceError::from(err), SourceError::Parse(_)));
    }
}
