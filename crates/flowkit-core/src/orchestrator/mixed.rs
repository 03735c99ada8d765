//! Parallel group followed by a chain.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use flowkit_protocols::{AgentError, AgentHandler, AgentResult, Event, State};

use super::collaborative::run_fan_out;
use super::sequential::run_chain;
use super::{AgentInvoker, OrchestrationMode, Orchestrator};
use crate::callback::CallbackRegistry;

pub struct MixedOrchestrator {
    invoker: Arc<AgentInvoker>,
    collaborative_agents: Vec<String>,
    sequential_agents: Vec<String>,
    agent_timeout: Duration,
}

impl MixedOrchestrator {
    pub fn new(
        callbacks: Arc<CallbackRegistry>,
        collaborative_agents: Vec<String>,
        sequential_agents: Vec<String>,
        agent_timeout: Duration,
    ) -> Self {
        Self {
            invoker: Arc::new(AgentInvoker::new(callbacks)),
            collaborative_agents,
            sequential_agents,
            agent_timeout,
        }
    }
}

#[async_trait]
impl Orchestrator for MixedOrchestrator {
    fn mode(&self) -> OrchestrationMode {
        OrchestrationMode::Mixed
    }

    fn register_agent(&self, name: &str, handler: Arc<dyn AgentHandler>) -> Result<(), AgentError> {
        self.invoker.register(name, handler)
    }

    async fn dispatch(
        &self,
        ctx: &CancellationToken,
        event: &Event,
    ) -> Result<AgentResult, AgentError> {
        if self.collaborative_agents.is_empty() && self.sequential_agents.is_empty() {
            return Err(AgentError::NoAgents(self.mode().to_string()));
        }
        let start = Utc::now();
        let mut state = State::from_event(event);

        if !self.collaborative_agents.is_empty() {
            info!(agents = self.collaborative_agents.len(), "Mixed dispatch: collaborative phase");
            state = run_fan_out(
                &self.invoker,
                ctx,
                &self.collaborative_agents,
                event,
                state,
                self.agent_timeout,
            )
            .await?;
        }

        if !self.sequential_agents.is_empty() {
            info!(agents = self.sequential_agents.len(), "Mixed dispatch: sequential phase");
            state = run_chain(&self.invoker, ctx, &self.sequential_agents, event, state).await?;
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
