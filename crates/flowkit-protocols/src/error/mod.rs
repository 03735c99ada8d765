//! Error types for the flowkit protocol layer.

mod agent;
mod callback;
mod classify;
mod kind;
mod runner;
mod storage;

pub use agent::*;
pub use callback::*;
pub use classify::*;
pub use kind::*;
pub use runner::*;
pub use storage::*;
