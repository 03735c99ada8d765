//! Orchestrator configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Strategy used to route an event to agents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestrationMode {
    /// One target per event, chosen by `route_to` or the event target.
    #[default]
    Route,
    /// A fixed chain where each agent's output feeds the next.
    Sequential,
    /// A fixed set run in parallel with merged results.
    Collaborative,
    /// One agent re-run until it marks the loop completed.
    Loop,
    /// A collaborative group followed by a sequential chain.
    Mixed,
}

impl OrchestrationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestrationMode::Route => "route",
            OrchestrationMode::Sequential => "sequential",
            OrchestrationMode::Collaborative => "collaborative",
            OrchestrationMode::Loop => "loop",
            OrchestrationMode::Mixed => "mixed",
        }
    }
}

impl fmt::Display for OrchestrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrchestrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "route" => Ok(OrchestrationMode::Route),
            "sequential" => Ok(OrchestrationMode::Sequential),
            "collaborative" | "parallel" => Ok(OrchestrationMode::Collaborative),
            "loop" => Ok(OrchestrationMode::Loop),
            "mixed" => Ok(OrchestrationMode::Mixed),
            other => Err(format!("unknown orchestration mode: {other}")),
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub mode: OrchestrationMode,

    /// Agents taking part, in order. Sequential and loop modes use this
    /// list; collaborative mode falls back to every registered agent when
    /// it is empty.
    #[serde(default)]
    pub agents: Vec<String>,

    /// Parallel group for mixed mode.
    #[serde(default)]
    pub collaborative_agents: Vec<String>,

    /// Chain run after the parallel group in mixed mode.
    #[serde(default)]
    pub sequential_agents: Vec<String>,

    /// Upper bound on loop iterations.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Per-agent timeout for collaborative work.
    #[serde(default = "default_agent_timeout_ms")]
    pub agent_timeout_ms: u64,
}

fn default_max_iterations() -> usize {
    5
}

fn default_agent_timeout_ms() -> u64 {
    30_000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mode: OrchestrationMode::default(),
            agents: Vec::new(),
            collaborative_agents: Vec::new(),
            sequential_agents: Vec::new(),
            max_iterations: default_max_iterations(),
            agent_timeout_ms: default_agent_timeout_ms(),
        }
    }
}

impl OrchestratorConfig {
    pub fn new(mode: OrchestrationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agents = agents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_collaborative_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collaborative_agents = agents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sequential_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sequential_agents = agents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.mode, OrchestrationMode::Route);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.agent_timeout(), Duration::from_secs(30));
        assert!(config.agents.is_empty());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: OrchestratorConfig =
            serde_json::from_str(r#"{"mode":"loop","agents":["refiner"]}"#).unwrap();
        assert_eq!(config.mode, OrchestrationMode::Loop);
        assert_eq!(config.agents, vec!["refiner"]);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.agent_timeout_ms, 30_000);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Sequential".parse(), Ok(OrchestrationMode::Sequential));
        assert_eq!("parallel".parse(), Ok(OrchestrationMode::Collaborative));
        assert!("broadcast".parse::<OrchestrationMode>().is_err());
    }

    #[test]
    fn test_builder() {
        let config = OrchestratorConfig::new(OrchestrationMode::Mixed)
            .with_collaborative_agents(["a", "b"])
            .with_sequential_agents(["c"])
            .with_agent_timeout(Duration::from_millis(250));
        assert_eq!(config.collaborative_agents.len(), 2);
        assert_eq!(config.sequential_agents, vec!["c"]);
        assert_eq!(config.agent_timeout_ms, 250);
    }
}
