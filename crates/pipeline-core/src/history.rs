//! Per-thread conversation state.
//!
//! Threads are keyed by a caller-supplied opaque id. Each thread owns a
//! slot with its own async mutex; a turn locks the slot before reading
//! history and releases it only after the turn's outcome is written
//! back, so overlapping turns on one thread are serialized instead of
//! racing on history (lost-update hazard in the original design).
//!
//! Thread count is bounded with LRU eviction, and per-thread history is
//! trimmed to a turn budget, so an open deployment cannot grow memory
//! without bound.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::message::ChatMessage;

/// Default maximum number of threads tracked before LRU eviction.
const DEFAULT_MAX_THREADS: usize = 10000;

/// One thread's history behind its serialization lock.
#[derive(Debug, Default)]
pub struct ThreadSlot {
    history: Mutex<Vec<ChatMessage>>,
}

impl ThreadSlot {
    /// Lock this thread for the duration of a turn.
    pub async fn lock(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.history.lock().await
    }
}

/// Keyed store of conversation threads.
#[derive(Debug)]
pub struct ThreadStore {
    /// Insertion-ordered map so the first entry is always the least
    /// recently used thread.
    threads: RwLock<IndexMap<String, Arc<ThreadSlot>>>,
    /// Maximum user/assistant turn pairs kept per thread.
    max_turns: usize,
    /// Maximum threads tracked before LRU eviction.
    max_threads: usize,
}

impl Default for ThreadStore {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ThreadStore {
    /// Create a store keeping `max_turns` exchanges per thread, with the
    /// default thread cap.
    pub fn new(max_turns: usize) -> Self {
        Self::with_limits(max_turns, DEFAULT_MAX_THREADS)
    }

    /// Create a store with explicit turn and thread limits.
    pub fn with_limits(max_turns: usize, max_threads: usize) -> Self {
        Self {
            threads: RwLock::new(IndexMap::new()),
            max_turns,
            max_threads,
        }
    }

    /// Get (or create) the slot for a thread id.
    ///
    /// Marks the thread as recently used and evicts the least recently
    /// used threads past the cap. An in-flight turn keeps its own `Arc`,
    /// so eviction never invalidates a running turn; the evicted history
    /// is simply not findable afterwards.
    pub async fn slot(&self, thread_id: &str) -> Arc<ThreadSlot> {
        let mut threads = self.threads.write().await;

        // Move to the end to mark as recently used.
        let slot = match threads.shift_remove(thread_id) {
            Some(existing) => existing,
            None => Arc::new(ThreadSlot::default()),
        };
        threads.insert(thread_id.to_string(), slot.clone());

        while threads.len() > self.max_threads {
            threads.shift_remove_index(0);
        }

        slot
    }

    /// Append a completed exchange to a locked history and trim it to
    /// the turn budget.
    pub fn record_exchange(
        &self,
        history: &mut Vec<ChatMessage>,
        user_text: &str,
        assistant_text: &str,
    ) {
        history.push(ChatMessage::user(user_text));
        history.push(ChatMessage::assistant(assistant_text));

        let max_messages = self.max_turns * 2;
        if history.len() > max_messages {
            let excess = history.len() - max_messages;
            history.drain(0..excess);
        }
    }

    /// Drop a thread entirely.
    pub async fn clear(&self, thread_id: &str) {
        let mut threads = self.threads.write().await;
        threads.shift_remove(thread_id);
    }

    /// Number of threads currently tracked.
    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }
}
