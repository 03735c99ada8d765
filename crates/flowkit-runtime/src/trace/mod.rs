//! Trace logger backends and the callbacks that feed them.

mod callbacks;
mod file;
mod memory;
mod noop;

pub use callbacks::{register_trace_callbacks, unregister_trace_callbacks, TraceCallback, TRACE_CALLBACK_NAME};
pub use file::{FileTraceLogger, DEFAULT_MAX_OPEN_TRACES};
pub use memory::InMemoryTraceLogger;
pub use noop::NoOpTraceLogger;
