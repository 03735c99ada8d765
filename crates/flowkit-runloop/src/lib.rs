//! # Flowkit RunLoop
//!
//! The [`Runner`] accepts events through a bounded queue and hands them, one
//! at a time and in order, to an [`Orchestrator`](flowkit_core::Orchestrator):
//!
//! ```text
//! emit ──► queue ──► BeforeEventHandling ──► dispatch ──► AfterEventHandling
//!                                               │
//!                          follow-up / failure events re-enter the queue
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use flowkit_core::{build_orchestrator, CallbackRegistry, OrchestratorConfig};
//! use flowkit_protocols::{agent_fn, AgentResult, CancellationToken, Event};
//! use flowkit_runloop::Runner;
//!
//! async fn example() -> Result<(), flowkit_protocols::RunnerError> {
//!     let orchestrator = build_orchestrator(
//!         &OrchestratorConfig::default(),
//!         Arc::new(CallbackRegistry::new()),
//!     );
//!     let runner = Runner::new(orchestrator)?;
//!     runner.register_agent(
//!         "echo",
//!         agent_fn(|_ctx, _event, state| async move { Ok(AgentResult::success(state)) }),
//!     )?;
//!
//!     runner.start(CancellationToken::new())?;
//!     runner.emit(Event::to("echo").with_session("s1")).await?;
//!     runner.stop().await
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod failure;
pub mod metrics;
pub mod runner;
pub mod state;

pub use config::{RetryConfig, RunnerConfig};
pub use failure::{failure_keys, FailureInfo, DEFAULT_ERROR_HANDLER};
pub use metrics::{MetricsSnapshot, RunnerMetrics};
pub use runner::{Runner, RunnerBuilder};
pub use state::RunnerState;
