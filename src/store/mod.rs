//! Persistence boundary.
//!
//! Rooms and submissions live in an external relational store. Everything the
//! service knows is re-read from here on each interaction; the only thing kept
//! in-process is per-view session state.

mod memory;
mod rest;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::types::*;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Store request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Store rejected the write: {0}")]
    Rejected(String),

    #[error("Malformed {table} record: {reason}")]
    InvalidRecord { table: &'static str, reason: String },

    #[error("Expected a single {table} row, found {count}")]
    Ambiguous { table: &'static str, count: usize },

    #[error("Invalid store configuration: {0}")]
    Config(String),
}

/// Operations the service needs from the persistence layer
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a room; fails with `Conflict` if the code is taken
    async fn insert_room(&self, room: NewRoom) -> StoreResult<Room>;

    /// Look up the room with this code.
    /// `Ok(None)` for no match, `Err(Ambiguous)` for more than one.
    async fn find_room_by_code(&self, code: &str) -> StoreResult<Option<Room>>;

    /// All submissions for a room, ordered by id
    async fn list_submissions(&self, room_id: RoomId) -> StoreResult<Vec<Submission>>;

    /// Insert or replace the submission keyed by `(room_id, name)`
    async fn upsert_submission(&self, submission: NewSubmission) -> StoreResult<Submission>;

    /// Name of this backend, for logging
    fn name(&self) -> &str;

    /// Whether any room already uses this code
    async fn code_exists(&self, code: &str) -> StoreResult<bool> {
        match self.find_room_by_code(code).await {
            Ok(room) => Ok(room.is_some()),
            Err(StoreError::Ambiguous { .. }) => Ok(true),
            Err(e) => Err(e),
        }
    }
}

/// Build the configured store: REST when a URL is set, in-memory otherwise
pub fn build_store(config: &StoreConfig) -> StoreResult<Arc<dyn Store>> {
    match &config.url {
        Some(url) => {
            let store = RestStore::new(url.clone(), config.api_key.clone(), config.timeout)?;
            tracing::info!("Using REST store at {}", url);
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("STORE_URL not set, using in-memory store. Rooms will not survive a restart!");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_store_defaults_to_memory() {
        let config = StoreConfig {
            url: None,
            api_key: None,
            timeout: Duration::from_secs(1),
        };
        let store = build_store(&config).unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn test_build_store_uses_rest_when_url_set() {
        let config = StoreConfig {
            url: Some("http://localhost:3000".to_string()),
            api_key: Some("key".to_string()),
            timeout: Duration::from_secs(1),
        };
        let store = build_store(&config).unwrap();
        assert_eq!(store.name(), "rest");
    }
}
