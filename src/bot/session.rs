//! Ephemeral search sessions.
//!
//! The search interaction is two-step (pick an image mode, then page
//! through results), so the bot keeps a small session between
//! callbacks. Sessions are bounded: moka evicts by TTL and by
//! capacity, so an abandoned search cannot grow the process without
//! limit.

use crate::catalog::CatalogItem;
use crate::images::ImageMode;
use moka::future::Cache;
use std::time::Duration;

/// In-progress search state for one user or channel.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    /// Query awaiting a mode selection.
    pub pending_query: Option<String>,
    /// Matches stored for paging, in catalog order.
    pub matches: Vec<CatalogItem>,
    /// Selected image mode.
    pub mode: ImageMode,
}

/// Bounded store of [`SearchSession`]s keyed by session scope.
#[derive(Clone)]
pub struct SessionStore {
    /// Moka cache storing scope -> session mappings with automatic TTL
    cache: Cache<i64, SearchSession>,
}

impl SessionStore {
    /// Creates a new `SessionStore` with the given bounds.
    ///
    /// # Arguments
    ///
    /// * `ttl_secs` - Seconds an untouched session survives
    /// * `max_capacity` - Maximum number of stored sessions
    #[must_use]
    pub fn new(ttl_secs: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Starts a fresh session holding a pending query.
    ///
    /// Any previous session under the same key is replaced, matching
    /// the one-search-at-a-time interaction.
    pub async fn begin_search(&self, key: i64, query: String) {
        let session = SearchSession {
            pending_query: Some(query),
            ..SearchSession::default()
        };
        self.cache.insert(key, session).await;
    }

    /// Returns a snapshot of the session under `key`, if any.
    pub async fn get(&self, key: i64) -> Option<SearchSession> {
        self.cache.get(&key).await
    }

    /// Stores `session` under `key`, resetting its TTL.
    pub async fn put(&self, key: i64, session: SearchSession) {
        self.cache.insert(key, session).await;
    }

    /// Number of live sessions.
    ///
    /// Useful for monitoring and the `/stats` command.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_begin_search_stores_pending_query() {
        let store = SessionStore::new(60, 100);

        store.begin_search(42, "bunny".to_string()).await;

        let session = store.get(42).await.expect("session exists");
        assert_eq!(session.pending_query.as_deref(), Some("bunny"));
        assert!(session.matches.is_empty());
        assert_eq!(session.mode, ImageMode::Live);
    }

    #[tokio::test]
    async fn test_begin_search_replaces_previous_session() {
        let store = SessionStore::new(60, 100);

        store.begin_search(42, "bunny".to_string()).await;
        store.begin_search(42, "fox".to_string()).await;

        let session = store.get(42).await.expect("session exists");
        assert_eq!(session.pending_query.as_deref(), Some("fox"));
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = SessionStore::new(60, 100);

        let session = SearchSession {
            pending_query: None,
            matches: Vec::new(),
            mode: ImageMode::Advance,
        };
        store.put(7, session).await;

        let restored = store.get(7).await.expect("session exists");
        assert_eq!(restored.pending_query, None);
        assert_eq!(restored.mode, ImageMode::Advance);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = SessionStore::new(60, 100);

        store.begin_search(1, "bunny".to_string()).await;

        assert!(store.get(1).await.is_some());
        assert!(store.get(2).await.is_none());
    }

    #[tokio::test]
    async fn test_entry_count() {
        let store = SessionStore::new(60, 100);

        store.begin_search(1, "a".to_string()).await;
        store.begin_search(2, "b".to_string()).await;

        // Manually run pending tasks to update the entry count
        store.cache.run_pending_tasks().await;

        assert_eq!(store.entry_count(), 2);
    }
}
