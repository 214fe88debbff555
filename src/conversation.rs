//! Per-user conversation memory.
//!
//! Bounded by an LRU capacity. Each user's history sits behind its own async
//! lock that an exchange holds across the provider call, so concurrent
//! exchanges for one user run one after the other instead of overwriting each
//! other's result.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use lru::LruCache;
use poise::serenity_prelude::UserId;
use tokio::sync::Mutex as AsyncMutex;

use crate::types::ConversationHistory;

/// Shared handle on one user's history.
pub type HistorySlot = Arc<AsyncMutex<ConversationHistory>>;

const FALLBACK_CAPACITY: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

pub struct ConversationStore {
    entries: Mutex<LruCache<UserId, HistorySlot>>,
}

impl ConversationStore {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(FALLBACK_CAPACITY);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Returns the user's slot, creating an empty history on first use.
    pub fn slot(&self, user_id: UserId) -> HistorySlot {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = entries.get_or_insert(user_id, || {
            debug!("Starting new conversation for user {user_id}");
            HistorySlot::default()
        });
        Arc::clone(slot)
    }

    /// Forgets the user's history.
    ///
    /// Returns `true` when there was something to forget. An exchange still in
    /// flight counts as history; its result lands in the detached slot and is
    /// dropped.
    pub fn reset(&self, user_id: UserId) -> bool {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop(&user_id);

        match removed {
            None => false,
            Some(slot) => slot
                .try_lock()
                .map_or(true, |history| !history.is_empty()),
        }
    }

    #[cfg(test)]
    fn contains(&self, user_id: UserId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user_id)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Turn;

    #[tokio::test]
    async fn slot_is_shared_between_lookups() {
        let store = ConversationStore::new(10);
        let user = UserId::new(1);

        store.slot(user).lock().await.push(Turn::user("hola"));

        assert_eq!(store.slot(user).lock().await.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn reset_reports_whether_history_existed() {
        let store = ConversationStore::new(10);
        let user = UserId::new(1);

        assert!(!store.reset(user));

        store.slot(user).lock().await.push(Turn::user("hola"));
        assert!(store.reset(user));
        assert!(!store.contains(user));
        assert!(!store.reset(user));
    }

    #[test]
    fn empty_slot_does_not_count_as_history() {
        let store = ConversationStore::new(10);
        let user = UserId::new(1);

        let _ = store.slot(user);
        assert!(!store.reset(user));
        assert!(store.is_empty());
    }

    #[test]
    fn evicts_least_recently_used_user() {
        let store = ConversationStore::new(2);

        let _ = store.slot(UserId::new(1));
        let _ = store.slot(UserId::new(2));
        let _ = store.slot(UserId::new(1));
        let _ = store.slot(UserId::new(3));

        assert_eq!(store.len(), 2);
        assert!(store.contains(UserId::new(1)));
        assert!(!store.contains(UserId::new(2)));
        assert!(store.contains(UserId::new(3)));
    }

    #[test]
    fn zero_capacity_falls_back_to_default() {
        let store = ConversationStore::new(0);
        let _ = store.slot(UserId::new(1));
        assert_eq!(store.len(), 1);
    }
}
