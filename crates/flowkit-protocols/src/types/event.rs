//! Events routed through the runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{keys, rfc3339_nanos, Data, Metadata};

/// A routed message with a target agent and a payload.
///
/// The id is assigned at creation and never changes. The data and metadata
/// accessors hand out copies; the only way to mutate an event is through its
/// setters, which require exclusive access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    id: String,
    #[serde(with = "rfc3339_nanos")]
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    target_agent_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    source_agent_id: String,
    #[serde(default)]
    data: Data,
    #[serde(default)]
    metadata: Metadata,
}

impl Event {
    /// Create an event addressed to `target_agent_id`.
    pub fn new(target_agent_id: impl Into<String>, data: Data, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            target_agent_id: target_agent_id.into(),
            source_agent_id: String::new(),
            data,
            metadata,
        }
    }

    /// Create an event with empty payload and metadata.
    pub fn to(target_agent_id: impl Into<String>) -> Self {
        Self::new(target_agent_id, Data::new(), Metadata::new())
    }

    /// Builder-style data insertion.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Builder-style metadata insertion.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Builder-style session id.
    pub fn with_session(self, session_id: impl Into<String>) -> Self {
        self.with_metadata(keys::SESSION_ID, session_id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn target_agent_id(&self) -> &str {
        &self.target_agent_id
    }

    pub fn source_agent_id(&self) -> &str {
        &self.source_agent_id
    }

    /// Copy of the payload.
    pub fn data(&self) -> Data {
        self.data.clone()
    }

    /// Copy of the metadata.
    pub fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    /// Look up a single payload value.
    pub fn data_value(&self, key: &str) -> Option<serde_json::Value> {
        self.data.get(key).cloned()
    }

    /// Look up a single metadata value.
    pub fn metadata_value(&self, key: &str) -> Option<String> {
        self.metadata.get(key).cloned()
    }

    /// The session this event belongs to, if tagged.
    pub fn session_id(&self) -> Option<String> {
        self.metadata_value(keys::SESSION_ID).filter(|s| !s.is_empty())
    }

    /// Retries recorded in the metadata; missing or malformed counts as 0.
    pub fn retry_count(&self) -> u32 {
        self.metadata
            .get(keys::RETRY_COUNT)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub fn set_target_agent_id(&mut self, id: impl Into<String>) {
        self.target_agent_id = id.into();
    }

    pub fn set_source_agent_id(&mut self, id: impl Into<String>) {
        self.source_agent_id = id.into();
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }
}
