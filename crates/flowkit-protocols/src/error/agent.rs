//! Agent registration and execution errors.

use thiserror::Error;

use super::ErrorKind;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent handler not found: {0}")]
    HandlerNotFound(String),

    #[error("Agent already registered: {0}")]
    DuplicateAgent(String),

    #[error("Agent name cannot be empty")]
    InvalidAgentName,

    #[error("No agents configured for {0} orchestration")]
    NoAgents(String),

    #[error("Agent execution failed: {agent}: {message}")]
    ExecutionFailed { agent: String, message: String },

    #[error("Agent {agent} timed out after {timeout_ms}ms")]
    Timeout { agent: String, timeout_ms: u64 },

    #[error("Agent {agent} panicked: {message}")]
    Panicked { agent: String, message: String },

    #[error("Dispatch was cancelled")]
    Cancelled,

    #[error("Collaborative dispatch failed: {}", .failures.join("; "))]
    Collaboration { failures: Vec<String> },
}

impl AgentError {
    /// Convenience constructor for handler implementations.
    pub fn execution(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            agent: agent.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::HandlerNotFound(_) => ErrorKind::Lookup,
            AgentError::DuplicateAgent(_)
            | AgentError::InvalidAgentName
            | AgentError::NoAgents(_) => ErrorKind::Configuration,
            AgentError::ExecutionFailed { .. }
            | AgentError::Timeout { .. }
            | AgentError::Panicked { .. }
            | AgentError::Collaboration { .. } => ErrorKind::Execution,
            AgentError::Cancelled => ErrorKind::Lifecycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_not_found() {
        let err = AgentError::HandlerNotFound("writer".to_string());
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("writer"));
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[test]
    fn test_execution_failed() {
        let err = AgentError::execution("writer", "model unavailable");
        assert_eq!(
            err.to_string(),
            "Agent execution failed: writer: model unavailable"
        );
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn test_timeout_message() {
        let err = AgentError::Timeout {
            agent: "slow".to_string(),
            timeout_ms: 1500,
        };
        assert!(err.to_string().contains("1500ms"));
    }

    #[test]
    fn test_collaboration_joins_failures() {
        let err = AgentError::Collaboration {
            failures: vec!["a: boom".to_string(), "b: timeout".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Collaborative dispatch failed: a: boom; b: timeout"
        );
    }

    #[test]
    fn test_configuration_kinds() {
        assert_eq!(
            AgentError::DuplicateAgent("a".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(AgentError::InvalidAgentName.kind(), ErrorKind::Configuration);
        assert_eq!(AgentError::Cancelled.kind(), ErrorKind::Lifecycle);
    }
}
