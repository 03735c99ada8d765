//! Agent handler registry.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use flowkit_protocols::{AgentError, AgentHandler};

/// Thread-safe map of agent names to handlers.
///
/// Registration is check-and-insert under the shard lock, so two concurrent
/// registrations of the same name cannot both succeed.
#[derive(Default)]
pub struct AgentRegistry {
    items: DashMap<String, Arc<dyn AgentHandler>>,
}

impl AgentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Register a handler under `name`.
    ///
    /// Returns an error if the name is empty or already taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), AgentError> {
        let name = name.into();
        if name.is_empty() {
            return Err(AgentError::InvalidAgentName);
        }

        match self.items.entry(name) {
            Entry::Occupied(e) => Err(AgentError::DuplicateAgent(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(handler);
                Ok(())
            }
        }
    }

    /// Remove a handler, returning it if it was registered.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn AgentHandler>> {
        self.items.remove(name).map(|(_, handler)| handler)
    }

    /// Get a handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentHandler>> {
        self.items.get(name).map(|item| item.value().clone())
    }

    /// Get a handler or fail with `HandlerNotFound`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn AgentHandler>, AgentError> {
        self.get(name)
            .ok_or_else(|| AgentError::HandlerNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// List all registered names.
    pub fn list_ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every handler.
    pub fn clear(&self) {
        self.items.clear();
    }
}
