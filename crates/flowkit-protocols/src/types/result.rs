//! Outcome of a single agent invocation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::rfc3339_nanos;
use super::state::State;

/// Result of one `AgentHandler::run` call.
///
/// Fields are private so a result cannot change after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_state: Option<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(with = "rfc3339_nanos")]
    start_time: DateTime<Utc>,
    #[serde(with = "rfc3339_nanos")]
    end_time: DateTime<Utc>,
    duration: Duration,
}

impl AgentResult {
    /// A successful result finishing now.
    pub fn success(output_state: State) -> Self {
        let now = Utc::now();
        Self::finished(Some(output_state), None, now, now)
    }

    /// A successful result with no output state.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self::finished(None, None, now, now)
    }

    /// A failed result finishing now.
    pub fn failed(error: impl Into<String>) -> Self {
        let now = Utc::now();
        Self::finished(None, Some(error.into()), now, now)
    }

    /// Build a result with explicit timing; duration is derived from the
    /// two timestamps and clamps to zero if the clock went backwards.
    pub fn finished(
        output_state: Option<State>,
        error: Option<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let duration = (end_time - start_time).to_std().unwrap_or_default();
        Self {
            output_state,
            error,
            start_time,
            end_time,
            duration,
        }
    }

    /// Copy of this result re-stamped with the given interval.
    pub fn timed(self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self::finished(self.output_state, self.error, start_time, end_time)
    }

    /// Copy of this result carrying an error message.
    pub fn with_error(self, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..self
        }
    }

    pub fn output_state(&self) -> Option<&State> {
        self.output_state.as_ref()
    }

    /// Consume the result and take its output state.
    pub fn into_output_state(self) -> Option<State> {
        self.output_state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_result() {
        let result = AgentResult::success(State::new().with("k", 1));
        assert!(result.is_success());
        assert_eq!(result.output_state().unwrap().get("k"), Some(json!(1)));
        assert!(result.end_time() >= result.start_time());
    }

    #[test]
    fn test_failed_result() {
        let result = AgentResult::failed("boom");
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("boom"));
        assert!(result.output_state().is_none());
    }

    #[test]
    fn test_duration_from_timestamps() {
        let start = Utc::now();
        let end = start + chrono::Duration::milliseconds(250);
        let result = AgentResult::empty().timed(start, end);
        assert_eq!(result.duration(), Duration::from_millis(250));

        let backwards = AgentResult::empty().timed(end, start);
        assert_eq!(backwards.duration(), Duration::ZERO);
    }

    #[test]
    fn test_with_error_keeps_output() {
        let result = AgentResult::success(State::new().with("k", 1)).with_error("late failure");
        assert_eq!(result.error(), Some("late failure"));
        assert!(result.output_state().is_some());
    }

    #[test]
    fn test_result_serialization() {
        let result = AgentResult::success(State::new().with("k", "v"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["output_state"]["data"]["k"], json!("v"));
        assert!(json.get("error").is_none());

        let back: AgentResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.start_time(), result.start_time());
        assert!(back.is_success());
    }
}
