//! Session persistence protocol.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SessionStoreError;
use crate::types::State;

/// Whether `id` can name a file inside a storage directory: non-empty, not
/// `.` or `..`, and free of path separators and NUL.
pub fn is_path_safe_id(id: &str) -> bool {
    !(id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '\0']))
}

/// Storage for per-session state.
///
/// `Ok(None)` is the only way a backend reports a missing session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_session(
        &self,
        ctx: &CancellationToken,
        session_id: &str,
    ) -> Result<Option<State>, SessionStoreError>;

    /// Replace the stored state of a session, creating it if needed.
    async fn save_session(
        &self,
        ctx: &CancellationToken,
        session_id: &str,
        state: &State,
    ) -> Result<(), SessionStoreError>;

    /// Remove a session. Deleting an unknown session is not an error.
    async fn delete_session(
        &self,
        ctx: &CancellationToken,
        session_id: &str,
    ) -> Result<(), SessionStoreError>;

    async fn list_sessions(&self, ctx: &CancellationToken)
    -> Result<Vec<String>, SessionStoreError>;
}
