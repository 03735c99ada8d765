//! The single dispatch loop behind a [`Runner`](crate::Runner).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use flowkit_core::{route_target, CallbackRegistry, Orchestrator};
use flowkit_protocols::{
    keys, AgentError, AgentResult, CallbackArgs, Event, HookPoint, SessionStore, State,
};

use crate::config::RetryConfig;
use crate::failure::{failure_event, ErrorRouting, FailureInfo};
use crate::metrics::RunnerMetrics;

pub(crate) struct Dispatcher {
    pub(crate) orchestrator: Arc<dyn Orchestrator>,
    pub(crate) callbacks: Arc<CallbackRegistry>,
    pub(crate) session_store: Option<Arc<dyn SessionStore>>,
    pub(crate) routing: ErrorRouting,
    pub(crate) retry: RetryConfig,
    /// Weak so the loop never keeps its own queue open.
    pub(crate) queue: mpsc::WeakSender<Event>,
    pub(crate) metrics: Arc<RunnerMetrics>,
}

impl Dispatcher {
    /// Handle events in queue order until the queue is closed and drained,
    /// or `ctx` is cancelled.
    pub(crate) async fn run(self, ctx: CancellationToken, mut rx: mpsc::Receiver<Event>) {
        debug!("Dispatch loop started");
        loop {
            let event = tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    info!(pending = rx.len(), "Dispatch loop cancelled");
                    break;
                }
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.handle(&ctx, event).await;
        }
        debug!("Dispatch loop exited");
    }

    async fn handle(&self, ctx: &CancellationToken, mut event: Event) {
        let session_id = ensure_session_id(&mut event);
        let span = tracing::debug_span!(
            "event",
            event_id = %event.id(),
            session_id = %session_id,
        );
        self.process(ctx, event, session_id).instrument(span).await;
        self.metrics.record_processed();
    }

    async fn process(&self, ctx: &CancellationToken, mut event: Event, session_id: String) {
        let stored = self.load_session(ctx, &session_id).await;
        let incoming = State::from_event(&event);
        let initial = match &stored {
            Some(stored) => {
                let seeded = stored.clone();
                seeded.merge(&incoming);
                seeded
            }
            None => incoming,
        };

        let (current, _) = self
            .callbacks
            .invoke(
                ctx,
                CallbackArgs::new(HookPoint::BeforeEventHandling, event.clone(), initial),
            )
            .await;

        let agent = route_target(&event);
        debug!(agent = %agent, "Dispatching event");
        let outcome = self.dispatch_with_retry(ctx, &mut event).await;

        let mut args = match &outcome {
            Ok(result) => {
                let state = result.output_state().cloned().unwrap_or_else(|| current.clone());
                CallbackArgs::new(HookPoint::AfterEventHandling, event.clone(), state)
                    .with_result(result.clone())
            }
            Err(e) => CallbackArgs::new(HookPoint::AfterEventHandling, event.clone(), current)
                .with_error(e.to_string()),
        };
        if !agent.is_empty() {
            args = args.with_agent(agent.clone());
        }
        self.callbacks.invoke(ctx, args).await;

        match outcome {
            Ok(result) => self.on_success(ctx, &event, &agent, &session_id, stored, result).await,
            Err(e) => self.on_failure(&event, &agent, &session_id, e),
        }
    }

    /// Dispatch `event`, re-dispatching transient failures with backoff
    /// while its `retry_count` is below the configured budget. Each retry
    /// bumps the count in the event's metadata.
    async fn dispatch_with_retry(
        &self,
        ctx: &CancellationToken,
        event: &mut Event,
    ) -> Result<AgentResult, AgentError> {
        loop {
            let error = match self.orchestrator.dispatch(ctx, event).await {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };
            let retry_count = event.retry_count();
            let transient =
                error.category().is_transient() && !matches!(error, AgentError::Cancelled);
            if !transient || retry_count >= self.retry.max_retries || ctx.is_cancelled() {
                return Err(error);
            }

            let delay = self.retry.delay_for_attempt(retry_count);
            warn!(
                attempt = retry_count + 1,
                max_retries = self.retry.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient dispatch failure, retrying"
            );
            tokio::select! {
                _ = ctx.cancelled() => return Err(error),
                _ = tokio::time::sleep(delay) => {}
            }
            event.set_metadata(keys::RETRY_COUNT, (retry_count + 1).to_string());
            self.metrics.record_retry();
        }
    }

    async fn on_success(
        &self,
        ctx: &CancellationToken,
        event: &Event,
        agent: &str,
        session_id: &str,
        stored: Option<State>,
        result: AgentResult,
    ) {
        debug!(agent = %agent, "Dispatch succeeded");
        let Some(output) = result.into_output_state() else {
            return;
        };

        if let Some(store) = &self.session_store {
            let session = stored.unwrap_or_default();
            session.merge(&output);
            if let Err(e) = store.save_session(ctx, session_id, &session).await {
                warn!(session_id = %session_id, error = %e, "Failed to save session");
            }
        }

        if let Some(next) = follow_up_event(event, agent, session_id, &output) {
            self.enqueue(next, "follow-up");
        }
    }

    fn on_failure(&self, event: &Event, agent: &str, session_id: &str, error: AgentError) {
        self.metrics.record_dispatch_failure();
        let info = FailureInfo::classify(&error, event.retry_count(), self.retry.max_retries);
        warn!(
            agent = %agent,
            error = %error,
            category = %info.category,
            severity = %info.severity,
            recovery = %info.recovery_action,
            retry_count = info.retry_count,
            "Dispatch failed"
        );

        let Some(handler) = self.routing.handler_for(&info) else {
            return;
        };
        if handler == agent {
            warn!(agent = %agent, "Error handler failed, not sending it its own failure");
            return;
        }
        self.enqueue(
            failure_event(event, handler, agent, session_id, &error, &info),
            "failure",
        );
    }

    async fn load_session(&self, ctx: &CancellationToken, session_id: &str) -> Option<State> {
        let store = self.session_store.as_ref()?;
        match store.get_session(ctx, session_id).await {
            Ok(state) => state,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Failed to load session");
                None
            }
        }
    }

    /// Enqueue an event produced by the loop itself. Never waits: this task
    /// is the only consumer of the queue.
    fn enqueue(&self, event: Event, kind: &str) {
        let Some(queue) = self.queue.upgrade() else {
            warn!(event_id = %event.id(), kind, "Runner is stopping, dropping event");
            self.metrics.record_dropped_follow_up();
            return;
        };
        match queue.try_send(event) {
            Ok(()) => {
                self.metrics.record_follow_up();
            }
            Err(TrySendError::Full(event)) => {
                warn!(event_id = %event.id(), kind, "Queue full, dropping event");
                self.metrics.record_dropped_follow_up();
            }
            Err(TrySendError::Closed(event)) => {
                warn!(event_id = %event.id(), kind, "Queue closed, dropping event");
                self.metrics.record_dropped_follow_up();
            }
        }
    }
}

/// Use the event id as session id when the event carries none.
fn ensure_session_id(event: &mut Event) -> String {
    match event.session_id().filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => {
            let id = event.id().to_string();
            warn!(event_id = %id, "Event has no session id, using its event id");
            event.set_metadata(keys::SESSION_ID, id.clone());
            id
        }
    }
}

/// Event for the agent named by `route_to` in the output metadata.
///
/// A `route_to` equal to the incoming event's is inherited rather than
/// requested and produces nothing. The routing key itself is not copied.
pub(crate) fn follow_up_event(
    event: &Event,
    agent: &str,
    session_id: &str,
    output: &State,
) -> Option<Event> {
    let route = output.get_meta(keys::ROUTE_TO).filter(|r| !r.is_empty())?;
    if event.metadata_value(keys::ROUTE_TO).as_deref() == Some(route.as_str()) {
        return None;
    }

    let mut metadata = output.meta();
    metadata.remove(keys::ROUTE_TO);
    metadata.insert(keys::SESSION_ID.to_string(), session_id.to_string());
    metadata.insert(keys::STATUS.to_string(), "success".to_string());

    let mut next = Event::new(route, output.data(), metadata);
    next.set_source_agent_id(agent);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_session_id_falls_back_to_event_id() {
        let mut event = Event::to("a");
        let id = ensure_session_id(&mut event);
        assert_eq!(id, event.id());
        assert_eq!(event.session_id().as_deref(), Some(event.id()));

        let mut event = Event::to("a").with_session("s1");
        assert_eq!(ensure_session_id(&mut event), "s1");
    }

    #[test]
    fn test_follow_up_requires_route() {
        let event = Event::to("a").with_session("s1");
        assert!(follow_up_event(&event, "a", "s1", &State::new().with("k", 1)).is_none());

        let output = State::new().with("k", 1).with_meta(keys::ROUTE_TO, "");
        assert!(follow_up_event(&event, "a", "s1", &output).is_none());
    }

    #[test]
    fn test_follow_up_copies_output() {
        let event = Event::to("a").with_session("s1");
        let output = State::new()
            .with("draft", "text")
            .with_meta(keys::ROUTE_TO, "b")
            .with_meta("trace", "x");
        let next = follow_up_event(&event, "a", "s1", &output).unwrap();

        assert_eq!(next.target_agent_id(), "b");
        assert_eq!(next.source_agent_id(), "a");
        assert_eq!(next.data_value("draft"), Some(serde_json::json!("text")));
        assert_eq!(next.session_id().as_deref(), Some("s1"));
        assert_eq!(next.metadata_value(keys::STATUS).as_deref(), Some("success"));
        assert_eq!(next.metadata_value("trace").as_deref(), Some("x"));
        assert!(next.metadata_value(keys::ROUTE_TO).is_none());
        assert_ne!(next.id(), event.id());
    }

    #[test]
    fn test_inherited_route_is_ignored() {
        let event = Event::to("a").with_metadata(keys::ROUTE_TO, "a");
        let output = State::from_event(&event);
        assert!(follow_up_event(&event, "a", "s1", &output).is_none());
    }
}
