//! Thread-safe key-value state passed between agents and hooks.

use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::common::{Data, Metadata};
use super::event::Event;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct StateInner {
    #[serde(default)]
    data: Data,
    #[serde(default)]
    meta: Metadata,
}

/// Key-value context with a data map and a metadata map.
///
/// Every accessor takes `&self`; reads go through the read lock and writes
/// through the write lock, so a `State` can be shared behind an `Arc` and
/// mutated from several tasks. [`Clone`] produces an independent copy.
#[derive(Default)]
pub struct State {
    inner: RwLock<StateInner>,
}

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state from existing maps.
    pub fn from_parts(data: Data, meta: Metadata) -> Self {
        Self {
            inner: RwLock::new(StateInner { data, meta }),
        }
    }

    /// Seed a state with an event's payload and metadata.
    pub fn from_event(event: &Event) -> Self {
        Self::from_parts(event.data(), event.metadata())
    }

    /// Builder-style data insertion.
    pub fn with(self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style metadata insertion.
    pub fn with_meta(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_meta(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.read().data.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.inner.write().data.insert(key.into(), value.into());
    }

    /// Remove a data key, returning its previous value.
    pub fn delete(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.write().data.remove(key)
    }

    pub fn get_meta(&self, key: &str) -> Option<String> {
        self.inner.read().meta.get(key).cloned()
    }

    pub fn set_meta(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.write().meta.insert(key.into(), value.into());
    }

    /// Remove a metadata key, returning its previous value.
    pub fn delete_meta(&self, key: &str) -> Option<String> {
        self.inner.write().meta.remove(key)
    }

    /// Snapshot of the data keys.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().data.keys().cloned().collect()
    }

    /// Snapshot of the metadata keys.
    pub fn meta_keys(&self) -> Vec<String> {
        self.inner.read().meta.keys().cloned().collect()
    }

    /// Copy of the data map.
    pub fn data(&self) -> Data {
        self.inner.read().data.clone()
    }

    /// Copy of the metadata map.
    pub fn meta(&self) -> Metadata {
        self.inner.read().meta.clone()
    }

    /// Number of data entries.
    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    /// True when both maps are empty.
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.read();
        inner.data.is_empty() && inner.meta.is_empty()
    }

    /// Copy every key of `source` into `self`, overwriting existing keys.
    ///
    /// The source is snapshotted before the destination's write lock is
    /// taken, so merging a state into itself cannot deadlock.
    pub fn merge(&self, source: &State) {
        let incoming = source.inner.read().clone();
        let mut inner = self.inner.write();
        inner.data.extend(incoming.data);
        inner.meta.extend(incoming.meta);
    }
}

impl Clone for State {
    fn clone(&self) -> Self {
        let inner = self.inner.read().clone();
        Self {
            inner: RwLock::new(inner),
        }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let left = self.inner.read().clone();
        let right = other.inner.read().clone();
        left == right
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("State")
            .field("data", &inner.data)
            .field("meta", &inner.meta)
            .finish()
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let inner = self.inner.read().clone();
        inner.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let inner = StateInner::deserialize(deserializer)?;
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
