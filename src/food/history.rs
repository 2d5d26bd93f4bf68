use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub const HISTORY_CAPACITY: usize = 5;

/// Most-recent-first list of distinct search terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchHistory(Vec<String>);

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terms(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new history with `term` at the front. Older copies of the same
    /// string (exact, case-sensitive) are dropped and the list is capped.
    pub fn record_query(&self, term: &str) -> SearchHistory {
        let mut next = Vec::with_capacity(HISTORY_CAPACITY);
        next.push(term.to_string());
        next.extend(self.0.iter().filter(|t| t.as_str() != term).cloned());
        next.truncate(HISTORY_CAPACITY);
        SearchHistory(next)
    }
}

impl From<Vec<String>> for SearchHistory {
    fn from(v: Vec<String>) -> Self {
        SearchHistory(v)
    }
}

/// Persistence hook the resolver calls once per text resolution.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record(&self, term: &str);
}

/// In-memory history per user.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: RwLock<HashMap<Uuid, SearchHistory>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self, user_id: Uuid) -> SearchHistory {
        self.entries
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn record(&self, user_id: Uuid, term: &str) -> SearchHistory {
        let mut entries = self.entries.write().await;
        let next = entries.get(&user_id).cloned().unwrap_or_default().record_query(term);
        entries.insert(user_id, next.clone());
        debug!(%user_id, size = next.len(), "search history updated");
        next
    }

    pub async fn forget(&self, user_id: Uuid) {
        self.entries.write().await.remove(&user_id);
    }

    /// Binds the store to one user so it can be handed to the resolver.
    pub fn for_user(&self, user_id: Uuid) -> UserHistory<'_> {
        UserHistory { store: self, user_id }
    }
}

pub struct UserHistory<'a> {
    store: &'a MemoryHistoryStore,
    user_id: Uuid,
}

#[async_trait]
impl HistorySink for UserHistory<'_> {
    async fn record(&self, term: &str) {
        self.store.record(self.user_id, term).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(terms: &[&str]) -> SearchHistory {
        SearchHistory::from(terms.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn repeated_term_moves_to_front_without_duplicate() {
        let h = history(&["pizza", "burger"]).record_query("pizza");
        assert_eq!(h.terms(), &["pizza", "burger"]);

        let h = history(&["pizza", "burger"]).record_query("burger");
        assert_eq!(h.terms(), &["burger", "pizza"]);
    }

    #[test]
    fn capped_at_five_dropping_oldest() {
        let mut h = SearchHistory::new();
        for term in ["a", "b", "c", "d", "e", "f"] {
            h = h.record_query(term);
        }
        assert_eq!(h.len(), 5);
        assert_eq!(h.terms(), &["f", "e", "d", "c", "b"]);
    }

    #[test]
    fn dedup_is_case_sensitive() {
        let h = history(&["Pizza"]).record_query("pizza");
        assert_eq!(h.terms(), &["pizza", "Pizza"]);
    }

    #[test]
    fn record_query_does_not_mutate_input() {
        let original = history(&["salad"]);
        let _ = original.record_query("soup");
        assert_eq!(original.terms(), &["salad"]);
    }

    #[tokio::test]
    async fn store_keeps_users_apart() {
        let store = MemoryHistoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.for_user(alice).record("ramen").await;
        store.for_user(bob).record("tacos").await;
        store.for_user(alice).record("pho").await;

        assert_eq!(store.load(alice).await.terms(), &["pho", "ramen"]);
        assert_eq!(store.load(bob).await.terms(), &["tacos"]);

        store.forget(alice).await;
        assert!(store.load(alice).await.is_empty());
    }
}
