//! Trace and session persistence errors.

use thiserror::Error;

use super::ErrorKind;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot log trace entry with empty session id")]
    MissingSessionId,

    #[error("Invalid session id for trace file: {0:?}")]
    InvalidSessionId(String),
}

impl TraceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TraceError::MissingSessionId | TraceError::InvalidSessionId(_) => {
                ErrorKind::Configuration
            }
            TraceError::Io(_) | TraceError::Serialization(_) => ErrorKind::Storage,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid session id: {0:?}")]
    InvalidId(String),
}

impl SessionStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionStoreError::InvalidId(_) => ErrorKind::Configuration,
            SessionStoreError::Io(_) | SessionStoreError::Serialization(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_error_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = TraceError::from(io_err);
        assert!(err.to_string().contains("IO error"));
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_trace_error_missing_session() {
        assert_eq!(
            TraceError::MissingSessionId.kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_trace_error_invalid_session() {
        let err = TraceError::InvalidSessionId("../escaped".to_string());
        assert!(err.to_string().contains("../escaped"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_session_store_error_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err = SessionStoreError::Serialization(json_err);
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_session_store_invalid_id() {
        let err = SessionStoreError::InvalidId("../etc".to_string());
        assert!(err.to_string().contains("../etc"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
