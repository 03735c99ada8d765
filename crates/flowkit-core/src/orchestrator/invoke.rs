//! Single-agent invocation shared by every orchestration strategy.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flowkit_protocols::{
    AgentError, AgentHandler, AgentResult, CallbackArgs, Event, HookPoint, State,
};

use crate::callback::CallbackRegistry;
use crate::panic::panic_message;
use crate::registry::AgentRegistry;

/// Owns the handlers and the callback registry of one orchestrator and runs
/// a handler bracketed by the agent-run hooks.
pub struct AgentInvoker {
    agents: AgentRegistry,
    callbacks: Arc<CallbackRegistry>,
    stopped: AtomicBool,
}

impl AgentInvoker {
    pub fn new(callbacks: Arc<CallbackRegistry>) -> Self {
        Self {
            agents: AgentRegistry::new(),
            callbacks,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn register(&self, name: &str, handler: Arc<dyn AgentHandler>) -> Result<(), AgentError> {
        self.agents.register(name, handler)?;
        info!(agent = %name, "Registered agent");
        Ok(())
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn callbacks(&self) -> Arc<CallbackRegistry> {
        self.callbacks.clone()
    }

    /// Drop all handlers. Only the first call has an effect.
    pub fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        let count = self.agents.len();
        self.agents.clear();
        info!(agents = count, "Orchestrator stopped");
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Run one agent.
    ///
    /// `BeforeAgentRun` may replace the input state. On success
    /// `AfterAgentRun` sees the timed result and may replace its output
    /// state; on failure `AgentError` sees a result carrying the message.
    /// A handler that returns a result with an error set counts as failed.
    pub async fn invoke(
        &self,
        ctx: &CancellationToken,
        agent: &str,
        event: &Event,
        state: State,
        timeout: Option<Duration>,
    ) -> Result<AgentResult, AgentError> {
        let handler = self.agents.resolve(agent)?;
        if ctx.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let before = CallbackArgs::new(HookPoint::BeforeAgentRun, event.clone(), state)
            .with_agent(agent);
        let (state, _) = self.callbacks.invoke(ctx, before).await;

        debug!(agent = %agent, event_id = %event.id(), "Running agent");
        let child = ctx.child_token();
        let start = Utc::now();
        let run = AssertUnwindSafe(handler.run(&child, event, state.clone())).catch_unwind();
        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(caught) => flatten(agent, caught),
                Err(_) => {
                    child.cancel();
                    Err(AgentError::Timeout {
                        agent: agent.to_string(),
                        timeout_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => flatten(agent, run.await),
        };
        let end = Utc::now();

        let outcome = outcome.and_then(|result| match result.error() {
            Some(message) => Err(AgentError::execution(agent, message)),
            None => Ok(result),
        });

        match outcome {
            Ok(result) => {
                let result = result.timed(start, end);
                let hook_state = result.output_state().cloned().unwrap_or_else(|| state.clone());
                let after = CallbackArgs::new(HookPoint::AfterAgentRun, event.clone(), hook_state)
                    .with_agent(agent)
                    .with_result(result.clone());
                let (after_state, _) = self.callbacks.invoke(ctx, after).await;

                debug!(
                    agent = %agent,
                    duration_ms = result.duration().as_millis() as u64,
                    "Agent finished"
                );
                if result.output_state().is_some() {
                    Ok(AgentResult::finished(Some(after_state), None, start, end))
                } else {
                    Ok(result)
                }
            }
            Err(err) => {
                warn!(agent = %agent, event_id = %event.id(), error = %err, "Agent failed");
                let message = err.to_string();
                let failed = AgentResult::finished(None, Some(message.clone()), start, end);
                let args = CallbackArgs::new(HookPoint::AgentError, event.clone(), state)
                    .with_agent(agent)
                    .with_error(message)
                    .with_result(failed);
                self.callbacks.invoke(ctx, args).await;
                Err(normalize(agent, err))
            }
        }
    }
}

fn flatten(
    agent: &str,
    caught: Result<Result<AgentResult, AgentError>, Box<dyn std::any::Any + Send>>,
) -> Result<AgentResult, AgentError> {
    match caught {
        Ok(outcome) => outcome,
        Err(payload) => Err(AgentError::Panicked {
            agent: agent.to_string(),
            message: panic_message(payload),
        }),
    }
}

/// Handler failures surface as `ExecutionFailed`; timeouts, panics and
/// cancellation keep their own variants.
fn normalize(agent: &str, err: AgentError) -> AgentError {
    match err {
        AgentError::ExecutionFailed { .. }
        | AgentError::Timeout { .. }
        | AgentError::Panicked { .. }
        | AgentError::Cancelled => err,
        other => AgentError::execution(agent, other.to_string()),
    }
}
