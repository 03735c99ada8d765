//! Event-to-agent orchestration.
//!
//! An [`Orchestrator`] owns a set of named handlers and decides which of them
//! an event reaches. Every strategy runs agents through [`AgentInvoker`], so
//! the agent-run hooks fire the same way regardless of mode.

mod collaborative;
mod config;
mod invoke;
mod looping;
mod mixed;
mod route;
mod sequential;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use flowkit_protocols::{AgentError, AgentHandler, AgentResult, Event};

use crate::callback::CallbackRegistry;

pub use collaborative::CollaborativeOrchestrator;
pub use config::{OrchestrationMode, OrchestratorConfig};
pub use invoke::AgentInvoker;
pub use looping::LoopOrchestrator;
pub use mixed::MixedOrchestrator;
pub use route::{route_target, RouteOrchestrator};
pub use sequential::SequentialOrchestrator;

/// Routes events to registered agent handlers.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    fn mode(&self) -> OrchestrationMode;

    /// Register a handler. Fails if the name is already taken.
    fn register_agent(&self, name: &str, handler: Arc<dyn AgentHandler>) -> Result<(), AgentError>;

    /// Deliver an event and return the aggregated result.
    async fn dispatch(
        &self,
        ctx: &CancellationToken,
        event: &Event,
    ) -> Result<AgentResult, AgentError>;

    fn callback_registry(&self) -> Arc<CallbackRegistry>;

    /// Release the registered handlers. Repeated calls are no-ops.
    async fn stop(&self);
}

/// Build the orchestrator described by `config`, sharing `callbacks`.
pub fn build_orchestrator(
    config: &OrchestratorConfig,
    callbacks: Arc<CallbackRegistry>,
) -> Arc<dyn Orchestrator> {
    match config.mode {
        OrchestrationMode::Route => Arc::new(RouteOrchestrator::new(callbacks)),
        OrchestrationMode::Sequential => Arc::new(SequentialOrchestrator::new(
            callbacks,
            config.agents.clone(),
        )),
        OrchestrationMode::Collaborative => Arc::new(CollaborativeOrchestrator::new(
            callbacks,
            config.agents.clone(),
            config.agent_timeout(),
        )),
        OrchestrationMode::Loop => Arc::new(LoopOrchestrator::new(
            callbacks,
            config.agents.first().cloned(),
            config.max_iterations,
        )),
        OrchestrationMode::Mixed => Arc::new(MixedOrchestrator::new(
            callbacks,
            config.collaborative_agents.clone(),
            config.sequential_agents.clone(),
            config.agent_timeout(),
        )),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
