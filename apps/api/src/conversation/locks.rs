//! Per-chat serialization of conversational turns.
//!
//! A turn holds its chat's lock from appending the user message until the reply
//! is stored, so two sends to the same chat never interleave. Different chats
//! never contend. Entries are dropped once no turn holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct ChatLocks {
    inner: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn is running for `chat_id`.
    ///
    /// If the returned future is dropped while still waiting, the map entry is
    /// evicted as well once nothing else references it.
    pub async fn acquire(&self, chat_id: i64) -> ChatTurnGuard {
        let evict = Eviction {
            chat_id,
            locks: Arc::clone(&self.inner),
        };
        let mutex = Arc::clone(self.inner.entry(chat_id).or_default().value());
        let guard = mutex.lock_owned().await;
        ChatTurnGuard {
            _guard: guard,
            _evict: evict,
        }
    }

    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.inner.len()
    }
}

/// Held for the duration of one turn. Fields drop in declaration order, so the
/// mutex is released before the eviction check runs.
pub struct ChatTurnGuard {
    _guard: OwnedMutexGuard<()>,
    _evict: Eviction,
}

struct Eviction {
    chat_id: i64,
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl Drop for Eviction {
    fn drop(&mut self) {
        // Idle when the map holds the only reference.
        self.locks
            .remove_if(&self.chat_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
