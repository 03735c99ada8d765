//! # Flowkit Protocols
//!
//! Data model and protocol traits shared by the flowkit crates.
//! Contains only interface definitions and value types.
//!
//! ## Core Traits
//!
//! - [`AgentHandler`] - Execution unit an event is routed to
//! - [`Callback`] - Interceptor attached to a [`HookPoint`]
//! - [`TraceLogger`] - Sink for execution trace entries
//! - [`SessionStore`] - Per-session state persistence

pub mod agent;
pub mod error;
pub mod hook;
pub mod session;
pub mod trace;
pub mod types;

pub use agent::{agent_fn, AgentHandler, FnAgent};
pub use error::{
    AgentError, CallbackError, ErrorCategory, ErrorKind, RecoveryAction, RunnerError,
    SessionStoreError, Severity, TraceError,
};
pub use hook::{callback_fn, Callback, CallbackArgs, FnCallback, HookPoint};
pub use session::{is_path_safe_id, SessionStore};
pub use trace::{sort_entries, TraceEntry, TraceLogger};
pub use types::*;

/// Re-exported so handler implementations need not depend on tokio-util.
pub use tokio_util::sync::CancellationToken;
