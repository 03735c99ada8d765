//! Hook points and the callback protocol.
//!
//! Callbacks are attached to a [`HookPoint`] and receive a [`CallbackArgs`]
//! describing the current moment of dispatch. A callback may replace the
//! state flowing through the chain by returning `Some(state)`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::CallbackError;
use crate::types::{AgentResult, Event, State};

/// Lifecycle points at which callbacks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPoint {
    BeforeEventHandling,
    AfterEventHandling,
    BeforeAgentRun,
    AfterAgentRun,
    AgentError,
    /// Wildcard: callbacks registered here run on every invocation.
    AllHooks,
}

impl HookPoint {
    /// Every hook except the wildcard.
    pub const CONCRETE: [HookPoint; 5] = [
        HookPoint::BeforeEventHandling,
        HookPoint::AfterEventHandling,
        HookPoint::BeforeAgentRun,
        HookPoint::AfterAgentRun,
        HookPoint::AgentError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::BeforeEventHandling => "BeforeEventHandling",
            HookPoint::AfterEventHandling => "AfterEventHandling",
            HookPoint::BeforeAgentRun => "BeforeAgentRun",
            HookPoint::AfterAgentRun => "AfterAgentRun",
            HookPoint::AgentError => "AgentError",
            HookPoint::AllHooks => "AllHooks",
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, HookPoint::AllHooks)
    }

    /// Whether this hook brackets a single agent run.
    pub fn is_agent_hook(&self) -> bool {
        matches!(
            self,
            HookPoint::BeforeAgentRun | HookPoint::AfterAgentRun | HookPoint::AgentError
        )
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments passed to every callback.
#[derive(Debug, Clone)]
pub struct CallbackArgs {
    pub hook: HookPoint,
    pub event: Event,
    pub state: State,
    pub agent_id: Option<String>,
    pub error: Option<String>,
    pub agent_result: Option<AgentResult>,
}

impl CallbackArgs {
    pub fn new(hook: HookPoint, event: Event, state: State) -> Self {
        Self {
            hook,
            event,
            state,
            agent_id: None,
            error: None,
            agent_result: None,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_result(mut self, result: AgentResult) -> Self {
        self.agent_result = Some(result);
        self
    }

    /// Session the event belongs to, falling back to the event id.
    pub fn session_id(&self) -> String {
        self.event
            .session_id()
            .unwrap_or_else(|| self.event.id().to_string())
    }
}

/// A named interceptor invoked at a hook point.
///
/// Return `Ok(Some(state))` to replace the state seen by later callbacks,
/// `Ok(None)` to leave it unchanged.
#[async_trait]
pub trait Callback: Send + Sync {
    async fn call(
        &self,
        ctx: &CancellationToken,
        args: CallbackArgs,
    ) -> Result<Option<State>, CallbackError>;
}

/// Adapter turning an async closure into a [`Callback`].
pub struct FnCallback<F> {
    f: F,
}

impl<F> FnCallback<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Callback for FnCallback<F>
where
    F: Fn(CancellationToken, CallbackArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<State>, CallbackError>> + Send,
{
    async fn call(
        &self,
        ctx: &CancellationToken,
        args: CallbackArgs,
    ) -> Result<Option<State>, CallbackError> {
        (self.f)(ctx.clone(), args).await
    }
}

/// Wrap an async closure as a shareable callback.
pub fn callback_fn<F, Fut>(f: F) -> Arc<dyn Callback>
where
    F: Fn(CancellationToken, CallbackArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<State>, CallbackError>> + Send + 'static,
{
    Arc::new(FnCallback::new(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_display() {
        assert_eq!(HookPoint::BeforeAgentRun.to_string(), "BeforeAgentRun");
        assert_eq!(HookPoint::AllHooks.to_string(), "AllHooks");
    }

    #[test]
    fn test_concrete_hooks_exclude_wildcard() {
        assert_eq!(HookPoint::CONCRETE.len(), 5);
        assert!(!HookPoint::CONCRETE.iter().any(|h| h.is_wildcard()));
        assert!(HookPoint::AllHooks.is_wildcard());
    }

    #[test]
    fn test_agent_hooks() {
        assert!(HookPoint::BeforeAgentRun.is_agent_hook());
        assert!(HookPoint::AgentError.is_agent_hook());
        assert!(!HookPoint::AfterEventHandling.is_agent_hook());
    }

    #[test]
    fn test_hook_serialization() {
        let json = serde_json::to_string(&HookPoint::AfterAgentRun).unwrap();
        assert_eq!(json, "\"AfterAgentRun\"");
    }

    #[test]
    fn test_args_session_fallback() {
        let event = Event::to("a");
        let args = CallbackArgs::new(HookPoint::BeforeEventHandling, event.clone(), State::new());
        assert_eq!(args.session_id(), event.id());

        let args = CallbackArgs::new(
            HookPoint::BeforeEventHandling,
            Event::to("a").with_session("s1"),
            State::new(),
        )
        .with_agent("a")
        .with_error("boom");
        assert_eq!(args.session_id(), "s1");
        assert_eq!(args.agent_id.as_deref(), Some("a"));
        assert_eq!(args.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_callback_fn_replaces_state() {
        let cb = callback_fn(|_ctx, args: CallbackArgs| async move {
            Ok(Some(args.state.with("seen", true)))
        });
        let args = CallbackArgs::new(HookPoint::AllHooks, Event::to("a"), State::new());
        let out = cb.call(&CancellationToken::new(), args).await.unwrap();
        assert_eq!(out.unwrap().get("seen"), Some(serde_json::json!(true)));
    }
}
