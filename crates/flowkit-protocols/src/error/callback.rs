//! Hook callback errors.

use thiserror::Error;

use super::ErrorKind;
use crate::hook::HookPoint;

#[derive(Debug, Clone, Error)]
pub enum CallbackError {
    #[error("Callback name cannot be empty")]
    EmptyName,

    #[error("Callback '{name}' already registered for hook '{hook}'")]
    DuplicateName { hook: HookPoint, name: String },

    #[error("Callback '{name}' failed at hook '{hook}': {message}")]
    Failed {
        hook: HookPoint,
        name: String,
        message: String,
    },

    #[error("Callback '{name}' panicked at hook '{hook}': {message}")]
    Panicked {
        hook: HookPoint,
        name: String,
        message: String,
    },

    /// Raised by callback bodies; the registry wraps it into `Failed`.
    #[error("{0}")]
    Custom(String),
}

impl CallbackError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CallbackError::EmptyName | CallbackError::DuplicateName { .. } => {
                ErrorKind::Configuration
            }
            CallbackError::Failed { .. }
            | CallbackError::Panicked { .. }
            | CallbackError::Custom(_) => ErrorKind::Execution,
        }
    }
}
