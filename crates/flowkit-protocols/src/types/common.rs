//! Common utility types.

use std::collections::HashMap;

/// Event payload and state data map.
pub type Data = HashMap<String, serde_json::Value>;

/// String-to-string metadata map.
pub type Metadata = HashMap<String, String>;

/// Well-known metadata and state keys.
pub mod keys {
    /// Metadata key carrying the session id of an event.
    pub const SESSION_ID: &str = "session_id";

    /// Metadata key naming the agent an event (or an output state) routes to.
    pub const ROUTE_TO: &str = "route_to";

    /// State key conventionally holding an agent's primary output.
    pub const OUTPUT: &str = "output";

    /// State key a looping agent sets to `true` to end the loop.
    pub const LOOP_COMPLETED: &str = "loop_completed";

    /// Metadata key carrying the outcome of a follow-up event.
    pub const STATUS: &str = "status";

    /// Metadata key counting how often an event has been re-dispatched.
    pub const RETRY_COUNT: &str = "retry_count";

    /// Session id used for trace entries logged without one.
    pub const DEFAULT_SESSION: &str = "default_session";
}

/// RFC 3339 timestamps with nanosecond precision.
pub mod rfc3339_nanos {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "common_tests.rs"]
mod tests;
