//! Runner lifecycle state.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Lifecycle of a [`Runner`](crate::Runner).
///
/// `Created -> Started -> Stopping -> Stopped`. A runner that is stopped
/// without being started goes straight from `Created` to `Stopping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RunnerState {
    /// Built, dispatch task not spawned yet.
    Created = 0,
    /// Dispatch task running, emits accepted.
    Started = 1,
    /// Queue closed, draining.
    Stopping = 2,
    /// Terminal.
    Stopped = 3,
}

impl From<u8> for RunnerState {
    fn from(v: u8) -> Self {
        match v {
            0 => RunnerState::Created,
            1 => RunnerState::Started,
            2 => RunnerState::Stopping,
            _ => RunnerState::Stopped,
        }
    }
}

impl std::fmt::Display for RunnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerState::Created => write!(f, "created"),
            RunnerState::Started => write!(f, "started"),
            RunnerState::Stopping => write!(f, "stopping"),
            RunnerState::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(RunnerState::Created as u8))
    }

    pub(crate) fn get(&self) -> RunnerState {
        RunnerState::from(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: RunnerState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Move from `from` to `to`. Returns the observed state on failure.
    pub(crate) fn transition(&self, from: RunnerState, to: RunnerState) -> Result<(), RunnerState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(RunnerState::from)
    }
}
