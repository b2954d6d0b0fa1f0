//! Session memory store
//!
//! Keyed append-only log of interactions that tool handlers use for
//! conversational context. Gated by `CHAINGUARD_MEMORY_ENABLED`: when the
//! flag is off the store is an inert variant with the identical contract,
//! so handler code never branches on the flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// One recorded tool interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Tool that produced the interaction
    pub tool: String,

    /// Short human-readable summary of what happened
    pub summary: String,

    /// When the interaction was recorded
    pub recorded_at: DateTime<Utc>,
}

impl Interaction {
    /// Record an interaction for a tool, timestamped now
    pub fn new(tool: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            summary: summary.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Per-session log, ordered by insertion
#[derive(Debug)]
struct MemoryEntry {
    interactions: Vec<Interaction>,
    last_access: DateTime<Utc>,
}

/// Session memory store
///
/// `Enabled` holds the real per-session map; `Disabled` discards every write
/// and answers every read with "absent". Entries live for the process
/// lifetime unless explicitly cleared; nothing persists across restarts.
pub enum MemoryStore {
    Enabled(SessionMemory),
    Disabled,
}

/// The live session map behind the enabled store
pub struct SessionMemory {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    /// Create a store matching the resolved feature flag
    pub fn new(enabled: bool) -> Self {
        if enabled {
            MemoryStore::Enabled(SessionMemory {
                entries: RwLock::new(HashMap::new()),
            })
        } else {
            MemoryStore::Disabled
        }
    }

    /// Whether this is the live store
    pub fn is_enabled(&self) -> bool {
        matches!(self, MemoryStore::Enabled(_))
    }

    /// Append an interaction to a session's log
    ///
    /// Creates the entry on first reference to the key. No-op when disabled.
    pub async fn record(&self, session: &str, interaction: Interaction) {
        let MemoryStore::Enabled(memory) = self else {
            return;
        };

        let mut entries = memory.entries.write().await;
        let entry = entries.entry(session.to_string()).or_insert_with(|| MemoryEntry {
            interactions: Vec::new(),
            last_access: Utc::now(),
        });
        entry.interactions.push(interaction);
        entry.last_access = Utc::now();

        debug!(session = session, count = entry.interactions.len(), "recorded interaction");
    }

    /// Recall a session's interactions in recording order
    ///
    /// Empty when the key is absent or the store is disabled.
    pub async fn recall(&self, session: &str) -> Vec<Interaction> {
        let MemoryStore::Enabled(memory) = self else {
            return Vec::new();
        };

        let mut entries = memory.entries.write().await;
        match entries.get_mut(session) {
            Some(entry) => {
                entry.last_access = Utc::now();
                entry.interactions.clone()
            }
            None => Vec::new(),
        }
    }

    /// Evict a session's log; returns whether an entry existed
    pub async fn clear(&self, session: &str) -> bool {
        let MemoryStore::Enabled(memory) = self else {
            return false;
        };

        let mut entries = memory.entries.write().await;
        entries.remove(session).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_recall_when_enabled() {
        let store = MemoryStore::new(true);
        assert!(store.is_enabled());

        store
            .record("s1", Interaction::new("vuln_lookup", "looked up CG-1"))
            .await;
        store
            .record("s1", Interaction::new("version_check", "checked 1.2.3"))
            .await;

        let recalled = store.recall("s1").await;
        assert_eq!(recalled.len(), 2);
        assert_eq!(recalled[0].tool, "vuln_lookup");
        assert_eq!(recalled[1].tool, "version_check");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemoryStore::new(true);

        store.record("a", Interaction::new("t", "x")).await;

        assert_eq!(store.recall("a").await.len(), 1);
        assert!(store.recall("b").await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_evicts_entry() {
        let store = MemoryStore::new(true);

        store.record("s1", Interaction::new("t", "x")).await;
        assert!(store.clear("s1").await);
        assert!(store.recall("s1").await.is_empty());

        // Already gone
        assert!(!store.clear("s1").await);
    }

    #[tokio::test]
    async fn test_disabled_store_is_inert() {
        let store = MemoryStore::new(false);
        assert!(!store.is_enabled());

        // Record-then-recall returns empty when disabled
        store.record("s1", Interaction::new("t", "x")).await;
        assert!(store.recall("s1").await.is_empty());
        assert!(!store.clear("s1").await);
    }
}
