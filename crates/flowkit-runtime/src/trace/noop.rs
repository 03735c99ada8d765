use async_trait::async_trait;

use flowkit_protocols::{TraceEntry, TraceError, TraceLogger};

/// Discards every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpTraceLogger;

#[async_trait]
impl TraceLogger for NoOpTraceLogger {
    async fn log(&self, _entry: TraceEntry) -> Result<(), TraceError> {
        Ok(())
    }

    async fn get_trace(&self, _session_id: &str) -> Result<Vec<TraceEntry>, TraceError> {
        Ok(Vec::new())
    }
}
