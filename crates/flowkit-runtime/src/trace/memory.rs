//! In-memory trace logger.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use flowkit_protocols::{keys, sort_entries, TraceEntry, TraceError, TraceLogger};

/// Keeps every entry in memory, grouped by session.
#[derive(Default)]
pub struct InMemoryTraceLogger {
    traces: RwLock<HashMap<String, Vec<TraceEntry>>>,
}

impl InMemoryTraceLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions with at least one entry.
    pub fn sessions(&self) -> Vec<String> {
        self.traces.read().keys().cloned().collect()
    }
}

#[async_trait]
impl TraceLogger for InMemoryTraceLogger {
    async fn log(&self, mut entry: TraceEntry) -> Result<(), TraceError> {
        let key = entry.session_key().to_string();
        entry.session_id = key.clone();
        self.traces.write().entry(key).or_default().push(entry);
        Ok(())
    }

    async fn get_trace(&self, session_id: &str) -> Result<Vec<TraceEntry>, TraceError> {
        let key = if session_id.is_empty() {
            keys::DEFAULT_SESSION
        } else {
            session_id
        };
        let mut entries = self.traces.read().get(key).cloned().unwrap_or_default();
        sort_entries(&mut entries);
        Ok(entries)
    }
}
