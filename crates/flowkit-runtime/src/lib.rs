//! # Flowkit Runtime
//!
//! Persistence collaborators used by the runner.
//!
//! - [`trace`] - trace loggers (memory, file, no-op) and their hook callbacks
//! - [`MemorySessionStore`] / [`FileSessionStore`] - per-session state

pub mod session;
pub mod session_store;
pub mod trace;

pub use session::Session;
pub use session_store::{FileSessionStore, MemorySessionStore};
pub use trace::{
    register_trace_callbacks, unregister_trace_callbacks, FileTraceLogger, InMemoryTraceLogger,
    NoOpTraceLogger, TraceCallback, DEFAULT_MAX_OPEN_TRACES, TRACE_CALLBACK_NAME,
};
