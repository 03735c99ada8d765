//! Data model shared across the flowkit crates.

mod common;
mod event;
mod result;
mod state;

pub use common::*;
pub use event::*;
pub use result::*;
pub use state::*;
