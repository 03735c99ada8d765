//! Fixed-order chains.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use flowkit_protocols::{AgentError, AgentHandler, AgentResult, Event, State};

use super::{AgentInvoker, OrchestrationMode, Orchestrator};
use crate::callback::CallbackRegistry;

/// Runs `agents` in order, feeding each agent's output state to the next.
///
/// Stops at the first failure. An agent that returns no output state passes
/// its input through unchanged.
pub(crate) async fn run_chain(
    invoker: &AgentInvoker,
    ctx: &CancellationToken,
    agents: &[String],
    event: &Event,
    mut state: State,
) -> Result<State, AgentError> {
    for (position, agent) in agents.iter().enumerate() {
        debug!(agent = %agent, position, total = agents.len(), "Sequential step");
        let result = invoker
            .invoke(ctx, agent, event, state.clone(), None)
            .await?;
        if let Some(output) = result.into_output_state() {
            state = output;
        }
    }
    Ok(state)
}

pub struct SequentialOrchestrator {
    invoker: AgentInvoker,
    agents: Vec<String>,
}

impl SequentialOrchestrator {
    pub fn new(callbacks: Arc<CallbackRegistry>, agents: Vec<String>) -> Self {
        Self {
            invoker: AgentInvoker::new(callbacks),
            agents,
        }
    }
}

#[async_trait]
impl Orchestrator for SequentialOrchestrator {
    fn mode(&self) -> OrchestrationMode {
        OrchestrationMode::Sequential
    }

    fn register_agent(&self, name: &str, handler: Arc<dyn AgentHandler>) -> Result<(), AgentError> {
        self.invoker.register(name, handler)
    }

    async fn dispatch(
        &self,
        ctx: &CancellationToken,
        event: &Event,
    ) -> Result<AgentResult, AgentError> {
        if self.agents.is_empty() {
            return Err(AgentError::NoAgents(self.mode().to_string()));
        }
        let start = Utc::now();
        let state = run_chain(&self.invoker, ctx, &self.agents, event, State::from_event(event))
            .await?;
        Ok(AgentResult::finished(Some(state), None, start, Utc::now()))
    }

    fn callback_registry(&self) -> Arc<CallbackRegistry> {
        self.invoker.callbacks()
    }

    async fn stop(&self) {
        self.invoker.stop();
    }
}
