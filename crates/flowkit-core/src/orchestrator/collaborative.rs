//! Parallel fan-out with merged results.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flowkit_protocols::{AgentError, AgentHandler, AgentResult, Event, State};

use super::{AgentInvoker, OrchestrationMode, Orchestrator};
use crate::callback::CallbackRegistry;

/// Runs every agent in `agents` on its own task, each bounded by `timeout`.
///
/// Successful output states are merged on top of `state` in completion
/// order, so the last agent to finish wins on conflicting keys. Failed agents
/// are logged and skipped; the fan-out only fails with `Collaboration` when
/// no agent succeeded.
pub(crate) async fn run_fan_out(
    invoker: &Arc<AgentInvoker>,
    ctx: &CancellationToken,
    agents: &[String],
    event: &Event,
    state: State,
    timeout: Duration,
) -> Result<State, AgentError> {
    let mut join_set: JoinSet<(String, Result<AgentResult, AgentError>)> = JoinSet::new();
    for agent in agents {
        let invoker = invoker.clone();
        let ctx = ctx.clone();
        let agent = agent.clone();
        let event = event.clone();
        let input = state.clone();
        join_set.spawn(async move {
            let outcome = invoker
                .invoke(&ctx, &agent, &event, input, Some(timeout))
                .await;
            (agent, outcome)
        });
    }

    let merged = state;
    let mut failures = Vec::new();
    let mut succeeded = 0usize;
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((agent, Ok(result))) => {
                debug!(agent = %agent, "Collaborative agent finished");
                if let Some(output) = result.output_state() {
                    merged.merge(output);
                }
                succeeded += 1;
            }
            Ok((agent, Err(e))) => {
                warn!(agent = %agent, error = %e, "Collaborative agent failed");
                failures.push(format!("{agent}: {e}"));
            }
            Err(e) => {
                warn!(error = %e, "Collaborative task aborted");
                failures.push(format!("task: {e}"));
            }
        }
    }

    info!(
        total = agents.len(),
        succeeded,
        failed = failures.len(),
        "Collaborative dispatch completed"
    );

    if succeeded > 0 {
        if !failures.is_empty() {
            warn!(failures = ?failures, "Collaborative dispatch partially failed");
        }
        Ok(merged)
    } else {
        Err(AgentError::Collaboration { failures })
    }
}

/// Agents for a fan-out: the configured list, or every registered agent in
/// name order when none were configured.
pub(crate) fn participants(invoker: &AgentInvoker, configured: &[String]) -> Vec<String> {
    if !configured.is_empty() {
        return configured.to_vec();
    }
    let mut ids = invoker.agents().list_ids();
    ids.sort();
    ids
}

pub struct CollaborativeOrchestrator {
    invoker: Arc<AgentInvoker>,
    agents: Vec<String>,
    agent_timeout: Duration,
}

impl CollaborativeOrchestrator {
    pub fn new(
        callbacks: Arc<CallbackRegistry>,
        agents: Vec<String>,
        agent_timeout: Duration,
    ) -> Self {
        Self {
            invoker: Arc::new(AgentInvoker::new(callbacks)),
            agents,
            agent_timeout,
        }
    }
}

#[async_trait]
impl Orchestrator for CollaborativeOrchestrator {
    fn mode(&self) -> OrchestrationMode {
        OrchestrationMode::Collaborative
    }

    fn register_agent(&self, name: &str, handler: Arc<dyn AgentHandler>) -> Result<(), AgentError> {
        self.invoker.register(name, handler)
    }

    async fn dispatch(
        &self,
        ctx: &CancellationToken,
        event: &Event,
    ) -> Result<AgentResult, AgentError> {
        let agents = participants(&self.invoker, &self.agents);
        if agents.is_empty() {
            return Err(AgentError::NoAgents(self.mode().to_string()));
        }
        let start = Utc::now();
        let merged = run_fan_out(
            &self.invoker,
            ctx,
            &agents,
            event,
            State::from_event(event),
            self.agent_timeout,
        )
        .await?;
        Ok(AgentResult::finished(Some(merged), None, start, Utc::now()))
    }

    fn callback_registry(&self) -> Arc<CallbackRegistry> {
        self.invoker.callbacks()
    }

    async fn stop(&self) {
        self.invoker.stop();
    }
}
