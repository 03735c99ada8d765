//! Hook callbacks that write trace entries.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use flowkit_core::CallbackRegistry;
use flowkit_protocols::{
    Callback, CallbackArgs, CallbackError, HookPoint, State, TraceEntry, TraceLogger,
};

/// Name the trace callbacks are registered under.
pub const TRACE_CALLBACK_NAME: &str = "trace-logger";

/// Logs one [`TraceEntry`] per invocation and leaves the state unchanged.
pub struct TraceCallback {
    logger: Arc<dyn TraceLogger>,
}

impl TraceCallback {
    pub fn new(logger: Arc<dyn TraceLogger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Callback for TraceCallback {
    async fn call(
        &self,
        _ctx: &CancellationToken,
        args: CallbackArgs,
    ) -> Result<Option<State>, CallbackError> {
        self.logger
            .log(TraceEntry::from_args(&args))
            .await
            .map_err(|e| CallbackError::custom(e.to_string()))?;
        Ok(None)
    }
}

/// Register a trace callback for every concrete hook.
///
/// Nothing is registered under the wildcard, so each invocation logs once.
pub fn register_trace_callbacks(
    registry: &CallbackRegistry,
    logger: Arc<dyn TraceLogger>,
) -> Result<(), CallbackError> {
    let callback: Arc<dyn Callback> = Arc::new(TraceCallback::new(logger));
    for hook in HookPoint::CONCRETE {
        registry.register(hook, TRACE_CALLBACK_NAME, callback.clone())?;
    }
    Ok(())
}

/// Remove the callbacks added by [`register_trace_callbacks`].
pub fn unregister_trace_callbacks(registry: &CallbackRegistry) {
    for hook in HookPoint::CONCRETE {
        registry.unregister(hook, TRACE_CALLBACK_NAME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::InMemoryTraceLogger;
    use flowkit_protocols::{AgentResult, Event};

    #[tokio::test]
    async fn test_registers_every_concrete_hook() {
        let registry = CallbackRegistry::new();
        register_trace_callbacks(&registry, Arc::new(InMemoryTraceLogger::new())).unwrap();
        for hook in HookPoint::CONCRETE {
            assert_eq!(registry.names(hook), vec![TRACE_CALLBACK_NAME]);
        }
        assert_eq!(registry.len(HookPoint::AllHooks), 0);

        // A second registration collides on the name.
        assert!(register_trace_callbacks(&registry, Arc::new(InMemoryTraceLogger::new())).is_err());

        unregister_trace_callbacks(&registry);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_callbacks_log_entries() {
        let registry = CallbackRegistry::new();
        let logger = Arc::new(InMemoryTraceLogger::new());
        register_trace_callbacks(&registry, logger.clone()).unwrap();

        let event = Event::to("writer").with_session("s1");
        let ctx = CancellationToken::new();
        registry
            .invoke(
                &ctx,
                CallbackArgs::new(HookPoint::BeforeEventHandling, event.clone(), State::new()),
            )
            .await;
        registry
            .invoke(
                &ctx,
                CallbackArgs::new(HookPoint::AfterAgentRun, event.clone(), State::new())
                    .with_agent("writer")
                    .with_result(AgentResult::empty()),
            )
            .await;

        let trace = logger.get_trace("s1").await.unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].hook, HookPoint::BeforeEventHandling);
        assert_eq!(trace[1].agent_id.as_deref(), Some("writer"));
        assert!(trace[1].agent_result.is_some());
        assert!(trace.iter().all(|e| e.event_id == event.id()));
    }

    #[tokio::test]
    async fn test_logger_failure_reported_as_callback_error() {
        let registry = CallbackRegistry::new();
        let temp = tempfile::TempDir::new().unwrap();
        // A regular file where the trace directory should be.
        let blocker = temp.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();
        let logger = Arc::new(crate::trace::FileTraceLogger::new(blocker));
        register_trace_callbacks(&registry, logger).unwrap();

        let (_, err) = registry
            .invoke(
                &CancellationToken::new(),
                CallbackArgs::new(
                    HookPoint::BeforeEventHandling,
                    Event::to("a").with_session("s"),
                    State::new(),
                ),
            )
            .await;
        assert!(matches!(err, Some(CallbackError::Failed { .. })));
    }
}
