mod room;
mod submission;
mod view;

use crate::config::AppConfig;
use crate::store::{MemoryStore, Store};
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub use submission::compute_remaining;
pub use view::ViewSession;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Minimum number of ranked games per list
    pub min_list_items: usize,
    /// Open room views, one per client session
    pub views: Arc<RwLock<HashMap<ViewId, Arc<Mutex<ViewSession>>>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            min_list_items: DEFAULT_MIN_LIST_ITEMS,
            views: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_config(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        Self {
            min_list_items: config.min_list_items,
            ..Self::new(store)
        }
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

/// Split multi-line input into trimmed, non-empty lines, keeping their order
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines_trims_and_drops_blank() {
        let lines = parse_lines("  Alice \n\n\tBob\r\n   \nCarol");
        assert_eq!(lines, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_parse_lines_whitespace_only() {
        assert!(parse_lines("").is_empty());
        assert!(parse_lines(" \n\t\n  ").is_empty());
    }

    #[test]
    fn test_with_config_takes_min_list_items() {
        let config = AppConfig {
            min_list_items: 3,
            ..AppConfig::default()
        };
        let state = AppState::with_config(Arc::new(MemoryStore::new()), &config);
        assert_eq!(state.min_list_items, 3);
    }
}
