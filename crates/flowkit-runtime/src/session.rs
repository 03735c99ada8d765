//! Session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flowkit_protocols::{is_path_safe_id, SessionStoreError, State};

/// A session and the state it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    #[serde(default)]
    pub state: State,
}

impl Session {
    pub fn new(id: impl Into<String>, state: State) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            last_active: now,
            state,
        }
    }

    /// Replace the owned state and bump `last_active`.
    pub fn replace_state(&mut self, state: State) {
        self.state = state;
        self.touch();
    }

    /// Update last active time.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

/// Reject ids that are empty or could escape a storage directory.
pub fn validate_session_id(id: &str) -> Result<(), SessionStoreError> {
    if !is_path_safe_id(id) {
        return Err(SessionStoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_creation() {
        let session = Session::new("test-id", State::new().with("k", 1));
        assert_eq!(session.id, "test-id");
        assert_eq!(session.created_at, session.last_active);
        assert_eq!(session.state.get("k"), Some(json!(1)));
    }

    #[test]
    fn test_replace_state_touches() {
        let mut session = Session::new("s", State::new());
        let created = session.created_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        session.replace_state(State::new().with("k", 2));
        assert!(session.last_active > created);
        assert_eq!(session.created_at, created);
        assert_eq!(session.state.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("session-1").is_ok());
        assert!(validate_session_id("a.b_c").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("..").is_err());
        assert!(validate_session_id("../etc/passwd").is_err());
        assert!(validate_session_id("a\\b").is_err());
    }

    #[test]
    fn test_session_serialization() {
        let session = Session::new("s", State::new().with("k", "v").with_meta("m", "x"));
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["state"]["data"]["k"], json!("v"));
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back.state, session.state);
        assert_eq!(back.created_at, session.created_at);
    }
}
