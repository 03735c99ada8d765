//! Single-target routing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use flowkit_protocols::{keys, AgentError, AgentHandler, AgentResult, Event, State};

use super::{AgentInvoker, OrchestrationMode, Orchestrator};
use crate::callback::CallbackRegistry;

/// Sends each event to exactly one agent: the `route_to` metadata value if
/// present, otherwise the event's target.
pub struct RouteOrchestrator {
    invoker: AgentInvoker,
}

impl RouteOrchestrator {
    pub fn new(callbacks: Arc<CallbackRegistry>) -> Self {
        Self {
            invoker: AgentInvoker::new(callbacks),
        }
    }
}

/// Agent an event is addressed to.
pub fn route_target(event: &Event) -> String {
    event
        .metadata_value(keys::ROUTE_TO)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| event.target_agent_id().to_string())
}

#[async_trait]
impl Orchestrator for RouteOrchestrator {
    fn mode(&self) -> OrchestrationMode {
        OrchestrationMode::Route
    }

    fn register_agent(&self, name: &str, handler: Arc<dyn AgentHandler>) -> Result<(), AgentError> {
        self.invoker.register(name, handler)
    }

    async fn dispatch(
        &self,
        ctx: &CancellationToken,
        event: &Event,
    ) -> Result<AgentResult, AgentError> {
        let target = route_target(event);
        self.invoker
            .invoke(ctx, &target, event, State::from_event(event), None)
            .await
    }

    fn callback_registry(&self) -> Arc<CallbackRegistry> {
        self.invoker.callbacks()
    }

    async fn stop(&self) {
        self.invoker.stop();
    }
}
