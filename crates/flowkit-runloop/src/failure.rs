//! Classifying dispatch failures and routing them to error handler agents.

use std::collections::HashMap;

use flowkit_protocols::{keys, AgentError, ErrorCategory, Event, RecoveryAction, Severity};

use crate::config::RunnerConfig;

/// Conventional name for the catch-all error handler agent.
pub const DEFAULT_ERROR_HANDLER: &str = "error-handler";

/// Metadata keys set on failure events.
pub mod failure_keys {
    pub const ERROR: &str = "error";
    pub const FAILED_AGENT: &str = "failed_agent";
    pub const ORIGINAL_EVENT_ID: &str = "original_event_id";
    pub const ERROR_CODE: &str = "error_code";
    pub const ERROR_CATEGORY: &str = "error_category";
    pub const SEVERITY: &str = "severity";
    pub const RECOVERY_ACTION: &str = "recovery_action";
    pub const RETRY_COUNT: &str = flowkit_protocols::keys::RETRY_COUNT;
}

/// A dispatch failure after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureInfo {
    pub category: ErrorCategory,
    pub severity: Severity,
    pub retry_count: u32,
    pub recovery_action: RecoveryAction,
}

impl FailureInfo {
    pub fn classify(error: &AgentError, retry_count: u32, max_retries: u32) -> Self {
        let category = error.category();
        Self {
            category,
            severity: category.severity(),
            retry_count,
            recovery_action: category.recovery_action(retry_count, max_retries),
        }
    }
}

/// Which agent receives a failure.
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorRouting {
    fallback: Option<String>,
    by_severity: HashMap<Severity, String>,
    by_category: HashMap<ErrorCategory, String>,
}

impl ErrorRouting {
    pub(crate) fn from_config(config: &RunnerConfig) -> Self {
        Self {
            fallback: config.error_handler.clone(),
            by_severity: config.severity_handlers.clone(),
            by_category: config.category_handlers.clone(),
        }
    }

    /// Severity handlers win over category handlers, which win over the
    /// fallback. `None` means failures are only logged.
    pub(crate) fn handler_for(&self, info: &FailureInfo) -> Option<&str> {
        self.by_severity
            .get(&info.severity)
            .or_else(|| self.by_category.get(&info.category))
            .or(self.fallback.as_ref())
            .map(String::as_str)
    }
}

/// Event telling `handler` that `agent` failed on `event`.
///
/// Carries the failed event's data, the session, and the classification in
/// metadata; the source agent is the one that failed.
pub(crate) fn failure_event(
    event: &Event,
    handler: &str,
    agent: &str,
    session_id: &str,
    error: &AgentError,
    info: &FailureInfo,
) -> Event {
    let mut failure = Event::new(handler, event.data(), Default::default())
        .with_session(session_id)
        .with_metadata(keys::STATUS, "error")
        .with_metadata(failure_keys::ERROR, error.to_string())
        .with_metadata(failure_keys::FAILED_AGENT, agent)
        .with_metadata(failure_keys::ORIGINAL_EVENT_ID, event.id())
        .with_metadata(failure_keys::ERROR_CODE, info.category.code())
        .with_metadata(failure_keys::ERROR_CATEGORY, info.category.as_str())
        .with_metadata(failure_keys::SEVERITY, info.severity.as_str())
        .with_metadata(failure_keys::RECOVERY_ACTION, info.recovery_action.as_str())
        .with_metadata(failure_keys::RETRY_COUNT, info.retry_count.to_string());
    failure.set_source_agent_id(agent);
    failure
}
