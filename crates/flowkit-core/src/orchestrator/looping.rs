//! Repeated single-agent refinement.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use flowkit_protocols::{keys, AgentError, AgentHandler, AgentResult, Event, State};

use super::route::route_target;
use super::{AgentInvoker, OrchestrationMode, Orchestrator};
use crate::callback::CallbackRegistry;

/// Re-runs one agent on its own output until it sets `loop_completed` to
/// `true` or `max_iterations` runs have happened.
///
/// The agent is the first configured one, or the event's route target when
/// none is configured.
pub struct LoopOrchestrator {
    invoker: AgentInvoker,
    agent: Option<String>,
    max_iterations: usize,
}

impl LoopOrchestrator {
    pub fn new(callbacks: Arc<CallbackRegistry>, agent: Option<String>, max_iterations: usize) -> Self {
        Self {
            invoker: AgentInvoker::new(callbacks),
            agent,
            max_iterations: max_iterations.max(1),
        }
    }
}

fn loop_completed(state: &State) -> bool {
    matches!(state.get(keys::LOOP_COMPLETED), Some(serde_json::Value::Bool(true)))
}

#[async_trait]
impl Orchestrator for LoopOrchestrator {
    fn mode(&self) -> OrchestrationMode {
        OrchestrationMode::Loop
    }

    fn register_agent(&self, name: &str, handler: Arc<dyn AgentHandler>) -> Result<(), AgentError> {
        self.invoker.register(name, handler)
    }

    async fn dispatch(
        &self,
        ctx: &CancellationToken,
        event: &Event,
    ) -> Result<AgentResult, AgentError> {
        let agent = self.agent.clone().unwrap_or_else(|| route_target(event));
        let start = Utc::now();
        let mut state = State::from_event(event);

        for iteration in 1..=self.max_iterations {
            let result = self
                .invoker
                .invoke(ctx, &agent, event, state.clone(), None)
                .await?;
            if let Some(output) = result.into_output_state() {
                state = output;
            }
            if loop_completed(&state) {
                debug!(agent = %agent, iteration, "Loop completed");
                break;
            }
            if iteration == self.max_iterations {
                debug!(agent = %agent, iteration, "Loop reached max iterations");
            }
        }

        Ok(AgentResult::finished(Some(state), None, start, Utc::now()))
    }

    fn callback_registry(&self) -> Arc<CallbackRegistry> {
        self.invoker.callbacks()
    }

    async fn stop(&self) {
        self.invoker.stop();
    }
}
