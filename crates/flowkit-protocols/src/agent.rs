//! Agent handler protocol.
//!
//! Handlers are the execution units the orchestrator routes events to.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::types::{AgentResult, Event, State};

/// Core trait for agent handlers.
///
/// `state` is the handler's own copy; return the state it produced inside the
/// [`AgentResult`]. Long-running handlers should watch `ctx` and bail out with
/// [`AgentError::Cancelled`] once it fires.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    async fn run(
        &self,
        ctx: &CancellationToken,
        event: &Event,
        state: State,
    ) -> Result<AgentResult, AgentError>;
}

/// Adapter turning an async closure into an [`AgentHandler`].
pub struct FnAgent<F> {
    f: F,
}

impl<F> FnAgent<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> AgentHandler for FnAgent<F>
where
    F: Fn(CancellationToken, Event, State) -> Fut + Send + Sync,
    Fut: Future<Output = Result<AgentResult, AgentError>> + Send,
{
    async fn run(
        &self,
        ctx: &CancellationToken,
        event: &Event,
        state: State,
    ) -> Result<AgentResult, AgentError> {
        (self.f)(ctx.clone(), event.clone(), state).await
    }
}

/// Wrap an async closure as a shareable handler.
pub fn agent_fn<F, Fut>(f: F) -> Arc<dyn AgentHandler>
where
    F: Fn(CancellationToken, Event, State) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AgentResult, AgentError>> + Send + 'static,
{
    Arc::new(FnAgent::new(f))
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
