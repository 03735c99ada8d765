//! Runner lifecycle and admission errors.

use thiserror::Error;

use super::{AgentError, CallbackError, ErrorKind, TraceError};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Runner already started")]
    AlreadyStarted,

    #[error("Runner is not running")]
    NotRunning,

    #[error("Runner stopped while emitting")]
    Stopped,

    #[error("Failed to emit event: queue full or blocked (capacity {capacity}, waited {waited_ms}ms)")]
    QueueSaturated { capacity: usize, waited_ms: u64 },

    #[error("Trace logger is not configured")]
    TraceUnavailable,

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Callback(#[from] CallbackError),

    #[error(transparent)]
    Trace(#[from] TraceError),
}

impl RunnerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunnerError::AlreadyStarted | RunnerError::NotRunning | RunnerError::Stopped => {
                ErrorKind::Lifecycle
            }
            RunnerError::QueueSaturated { .. } => ErrorKind::Capacity,
            RunnerError::TraceUnavailable => ErrorKind::Configuration,
            RunnerError::Agent(e) => e.kind(),
            RunnerError::Callback(e) => e.kind(),
            RunnerError::Trace(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_saturated_is_capacity() {
        let err = RunnerError::QueueSaturated {
            capacity: 1,
            waited_ms: 1000,
        };
        assert!(err.to_string().contains("queue full or blocked"));
        assert_eq!(err.kind(), ErrorKind::Capacity);
        assert!(err.kind().is_retryable());
    }

    #[test]
    fn test_lifecycle_errors() {
        assert_eq!(RunnerError::AlreadyStarted.kind(), ErrorKind::Lifecycle);
        assert_eq!(RunnerError::NotRunning.kind(), ErrorKind::Lifecycle);
        assert_eq!(RunnerError::Stopped.kind(), ErrorKind::Lifecycle);
    }

    #[test]
    fn test_trace_unavailable() {
        let err = RunnerError::TraceUnavailable;
        assert_eq!(err.to_string(), "Trace logger is not configured");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_agent_error_passthrough() {
        let err = RunnerError::from(AgentError::DuplicateAgent("a".to_string()));
        assert_eq!(err.to_string(), "Agent already registered: a");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
