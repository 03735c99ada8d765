//! Classification of agent failures, used to route them to error handlers
//! and to decide whether a dispatch is worth retrying.

use serde::{Deserialize, Serialize};

use super::AgentError;

/// What went wrong, independent of which agent failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Timeout,
    Llm,
    Network,
    Auth,
    Resource,
    Unknown,
}

/// Keywords matched against failure text, in priority order.
const KEYWORDS: &[(ErrorCategory, &[&str])] = &[
    (ErrorCategory::Validation, &["validation", "invalid", "required", "missing"]),
    (ErrorCategory::Timeout, &["timeout", "timed out", "deadline", "cancel"]),
    (ErrorCategory::Llm, &["llm", "openai", "azure", "model", "completion"]),
    (ErrorCategory::Network, &["network", "connection", "dial", "http"]),
    (ErrorCategory::Auth, &["auth", "unauthorized", "forbidden", "token"]),
    (ErrorCategory::Resource, &["memory", "resource", "limit", "quota"]),
];

impl ErrorCategory {
    /// Categorize free-form failure text. Matching is case-insensitive and
    /// the first category with a matching keyword wins.
    pub fn from_message(message: &str) -> Self {
        let message = message.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| message.contains(w)))
            .map(|(category, _)| *category)
            .unwrap_or(ErrorCategory::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Llm => "llm",
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Resource => "resource",
            ErrorCategory::Unknown => "unknown",
        }
    }

    /// Stable code carried in failure event metadata.
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "VALIDATION_ERROR",
            ErrorCategory::Timeout => "TIMEOUT_ERROR",
            ErrorCategory::Llm => "LLM_ERROR",
            ErrorCategory::Network => "NETWORK_ERROR",
            ErrorCategory::Auth => "AUTH_ERROR",
            ErrorCategory::Resource => "RESOURCE_ERROR",
            ErrorCategory::Unknown => "UNKNOWN_ERROR",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ErrorCategory::Validation | ErrorCategory::Llm | ErrorCategory::Unknown => {
                Severity::Medium
            }
            ErrorCategory::Timeout | ErrorCategory::Network => Severity::High,
            ErrorCategory::Auth | ErrorCategory::Resource => Severity::Critical,
        }
    }

    /// Failures that may clear up if the same dispatch is tried again.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorCategory::Timeout | ErrorCategory::Network | ErrorCategory::Llm
        )
    }

    /// Next step for a failure that has already been retried `retry_count`
    /// times out of `max_retries`.
    pub fn recovery_action(self, retry_count: u32, max_retries: u32) -> RecoveryAction {
        let exhausted = retry_count >= max_retries;
        match self {
            ErrorCategory::Auth | ErrorCategory::Resource => RecoveryAction::Escalate,
            ErrorCategory::Validation => RecoveryAction::Terminate,
            ErrorCategory::Timeout | ErrorCategory::Network | ErrorCategory::Llm => {
                if exhausted {
                    RecoveryAction::Fallback
                } else {
                    RecoveryAction::Retry
                }
            }
            ErrorCategory::Unknown => {
                if exhausted {
                    RecoveryAction::Escalate
                } else {
                    RecoveryAction::Retry
                }
            }
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suggested handling, carried on failure events for the error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    Retry,
    Fallback,
    Escalate,
    Terminate,
}

impl RecoveryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RecoveryAction::Retry => "retry",
            RecoveryAction::Fallback => "fallback",
            RecoveryAction::Escalate => "escalate",
            RecoveryAction::Terminate => "terminate",
        }
    }
}

impl std::fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AgentError {
    /// Category used for failure routing. Structural errors map directly;
    /// handler-reported failures are categorized by their message.
    pub fn category(&self) -> ErrorCategory {
        match self {
            AgentError::HandlerNotFound(_)
            | AgentError::DuplicateAgent(_)
            | AgentError::InvalidAgentName
            | AgentError::NoAgents(_) => ErrorCategory::Validation,
            AgentError::Timeout { .. } | AgentError::Cancelled => ErrorCategory::Timeout,
            AgentError::Panicked { .. } => ErrorCategory::Unknown,
            AgentError::ExecutionFailed { message, .. } => ErrorCategory::from_message(message),
            AgentError::Collaboration { failures } => {
                ErrorCategory::from_message(&failures.join("; "))
            }
        }
    }
}
