//! Execution trace protocol.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TraceError;
use crate::hook::{CallbackArgs, HookPoint};
use crate::types::{keys, rfc3339_nanos, AgentResult, State};

/// One record of a hook firing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    #[serde(with = "rfc3339_nanos")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub session_id: String,
    pub event_id: String,
    pub hook: HookPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_result: Option<AgentResult>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_agent_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_agent_id: String,
}

impl TraceEntry {
    /// Snapshot the arguments of a callback invocation.
    ///
    /// The agent result is only recorded for agent-run hooks.
    pub fn from_args(args: &CallbackArgs) -> Self {
        let agent_result = if args.hook.is_agent_hook() {
            args.agent_result.clone()
        } else {
            None
        };
        Self {
            timestamp: Utc::now(),
            session_id: args.session_id(),
            event_id: args.event.id().to_string(),
            hook: args.hook,
            agent_id: args.agent_id.clone(),
            state: Some(args.state.clone()),
            error: args.error.clone(),
            agent_result,
            target_agent_id: args.event.target_agent_id().to_string(),
            source_agent_id: args.event.source_agent_id().to_string(),
        }
    }

    /// Session key this entry is filed under.
    pub fn session_key(&self) -> &str {
        if self.session_id.is_empty() {
            keys::DEFAULT_SESSION
        } else {
            &self.session_id
        }
    }
}

/// Sink for trace entries, keyed by session.
#[async_trait]
pub trait TraceLogger: Send + Sync {
    /// Append an entry.
    async fn log(&self, entry: TraceEntry) -> Result<(), TraceError>;

    /// Entries of a session ordered by timestamp; empty for unknown sessions.
    async fn get_trace(&self, session_id: &str) -> Result<Vec<TraceEntry>, TraceError>;

    /// Flush and release resources.
    async fn close(&self) -> Result<(), TraceError> {
        Ok(())
    }
}

/// Stable sort by timestamp, keeping insertion order for ties.
pub fn sort_entries(entries: &mut [TraceEntry]) {
    entries.sort_by_key(|e| e.timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;

    #[test]
    fn test_entry_from_event_hook() {
        let event = Event::to("writer").with_session("s1");
        let args = CallbackArgs::new(HookPoint::AfterEventHandling, event.clone(), State::new())
            .with_result(AgentResult::empty());
        let entry = TraceEntry::from_args(&args);

        assert_eq!(entry.session_id, "s1");
        assert_eq!(entry.event_id, event.id());
        assert_eq!(entry.target_agent_id, "writer");
        assert!(entry.agent_result.is_none());
    }

    #[test]
    fn test_entry_from_agent_hook_keeps_result() {
        let args = CallbackArgs::new(HookPoint::AfterAgentRun, Event::to("a"), State::new())
            .with_agent("a")
            .with_result(AgentResult::empty());
        let entry = TraceEntry::from_args(&args);
        assert!(entry.agent_result.is_some());
        assert_eq!(entry.agent_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_session_key_default() {
        let args = CallbackArgs::new(HookPoint::BeforeEventHandling, Event::to("a"), State::new());
        let mut entry = TraceEntry::from_args(&args);
        entry.session_id.clear();
        assert_eq!(entry.session_key(), "default_session");
    }

    #[test]
    fn test_timestamp_nanosecond_format() {
        let args = CallbackArgs::new(HookPoint::BeforeEventHandling, Event::to("a"), State::new());
        let entry = TraceEntry::from_args(&args);
        let json = serde_json::to_value(&entry).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        // 2024-01-01T00:00:00.123456789Z
        let fraction = ts.split('.').nth(1).unwrap();
        assert_eq!(fraction.len(), 10);
        assert!(fraction.ends_with('Z'));
    }

    #[test]
    fn test_sort_entries_stable() {
        let args = CallbackArgs::new(HookPoint::BeforeEventHandling, Event::to("a"), State::new());
        let base = TraceEntry::from_args(&args);
        let mut late = base.clone();
        late.timestamp = base.timestamp + chrono::Duration::seconds(1);
        late.event_id = "late".into();
        let mut tie = base.clone();
        tie.event_id = "tie".into();

        let mut entries = vec![late, base.clone(), tie];
        sort_entries(&mut entries);
        let ids: Vec<_> = entries.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec![base.event_id.as_str(), "tie", "late"]);
    }
}
