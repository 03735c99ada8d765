//! Configuration for the Runner.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use flowkit_protocols::{ErrorCategory, Severity};

/// Runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Capacity of the event queue.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// How long `emit` waits for a free slot before giving up.
    #[serde(default = "default_emit_timeout_ms")]
    pub emit_timeout_ms: u64,

    /// Agent that receives a failure event when a dispatch fails and no
    /// severity or category handler matches.
    #[serde(default)]
    pub error_handler: Option<String>,

    /// Failure handlers by severity. Checked before `category_handlers`.
    #[serde(default)]
    pub severity_handlers: HashMap<Severity, String>,

    /// Failure handlers by error category.
    #[serde(default)]
    pub category_handlers: HashMap<ErrorCategory, String>,

    /// Re-dispatch of transient failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Directory for per-session trace files. Used only when no trace
    /// logger is supplied explicitly.
    #[serde(default)]
    pub trace_dir: Option<PathBuf>,
}

fn default_queue_size() -> usize {
    100
}

fn default_emit_timeout_ms() -> u64 {
    1000
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            queue_size: default_queue_size(),
            emit_timeout_ms: default_emit_timeout_ms(),
            error_handler: None,
            severity_handlers: HashMap::new(),
            category_handlers: HashMap::new(),
            retry: RetryConfig::default(),
            trace_dir: None,
        }
    }
}

impl RunnerConfig {
    pub fn with_queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    pub fn with_emit_timeout(mut self, timeout: Duration) -> Self {
        self.emit_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_error_handler(mut self, agent: impl Into<String>) -> Self {
        self.error_handler = Some(agent.into());
        self
    }

    pub fn with_severity_handler(mut self, severity: Severity, agent: impl Into<String>) -> Self {
        self.severity_handlers.insert(severity, agent.into());
        self
    }

    pub fn with_category_handler(
        mut self,
        category: ErrorCategory,
        agent: impl Into<String>,
    ) -> Self {
        self.category_handlers.insert(category, agent.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_trace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.trace_dir = Some(dir.into());
        self
    }

    pub fn emit_timeout(&self) -> Duration {
        Duration::from_millis(self.emit_timeout_ms)
    }

    /// Queue capacity actually used; tokio channels need at least one slot.
    pub(crate) fn capacity(&self) -> usize {
        self.queue_size.max(1)
    }
}

/// Retry configuration for transient dispatch failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Re-dispatches allowed per event. Zero disables retries.
    #[serde(default)]
    pub max_retries: u32,

    /// Delay before the first retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay_ms: base_delay.as_millis() as u64,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt + 1`: exponential in `attempt`,
    /// capped at `max_delay_ms`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay = delay.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(delay as u64)
    }
}
