//! Failure categories used to pick a retry policy.

use serde::{Deserialize, Serialize};

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid registration or wiring; fix the setup, do not retry.
    Configuration,
    /// A named target could not be resolved.
    Lookup,
    /// Agent or callback code failed while running.
    Execution,
    /// Admission was refused because the queue is saturated.
    Capacity,
    /// The component is in the wrong lifecycle state for the call.
    Lifecycle,
    /// Trace or session persistence failed.
    Storage,
}

impl ErrorKind {
    /// Whether retrying the same call later can succeed without changes.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Capacity | ErrorKind::Storage)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Lookup => "lookup",
            ErrorKind::Execution => "execution",
            ErrorKind::Capacity => "capacity",
            ErrorKind::Lifecycle => "lifecycle",
            ErrorKind::Storage => "storage",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::Capacity.is_retryable());
        assert!(ErrorKind::Storage.is_retryable());
        assert!(!ErrorKind::Lookup.is_retryable());
        assert!(!ErrorKind::Configuration.is_retryable());
        assert!(!ErrorKind::Execution.is_retryable());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::Capacity.to_string(), "capacity");
        assert_eq!(ErrorKind::Lifecycle.to_string(), "lifecycle");
    }
}
