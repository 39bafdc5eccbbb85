//! Session registry and memory store.

use std::fmt;
use std::sync::Arc;

use banter_core::{Message, SessionKey, Summarizer};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{ConversationWindow, MemoryError};

/// Point-in-time copy of one session's memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemorySnapshot {
    pub window: Vec<Message>,
    pub summary: String,
}

/// Which part of a session's memory to reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearTarget {
    History,
    Summary,
    Both,
}

/// Per-session bookkeeping exposed for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub session: SessionKey,
    pub window_messages: usize,
    pub committed_messages: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    window: ConversationWindow,
    summary: String,
    committed_messages: usize,
    updated_at: DateTime<Utc>,
}

/// One registry slot. `writer` serializes read-modify-write sequences for
/// the session; `entry` is only ever locked briefly and never across an
/// await point, so snapshot reads do not wait for a summarization call.
struct SessionSlot {
    writer: Mutex<()>,
    entry: RwLock<MemoryEntry>,
}

impl SessionSlot {
    fn new(window_pairs: usize) -> Self {
        Self {
            writer: Mutex::new(()),
            entry: RwLock::new(MemoryEntry {
                window: ConversationWindow::with_pairs(window_pairs),
                summary: String::new(),
                committed_messages: 0,
                updated_at: Utc::now(),
            }),
        }
    }
}

/// In-process conversational memory for every session.
pub struct MemoryStore {
    sessions: DashMap<SessionKey, Arc<SessionSlot>>,
    summarizer: Arc<dyn Summarizer>,
    window_pairs: usize,
}

impl MemoryStore {
    /// Create an empty store.
    ///
    /// # Arguments
    /// * `summarizer` - Backend used to fold committed messages into summaries
    /// * `window_pairs` - `k`; each window keeps the last `2k` messages
    #[must_use]
    pub fn new(summarizer: Arc<dyn Summarizer>, window_pairs: usize) -> Self {
        info!("Creating MemoryStore with a window of {window_pairs} pairs");
        Self {
            sessions: DashMap::new(),
            summarizer,
            window_pairs,
        }
    }

    #[must_use]
    pub const fn window_pairs(&self) -> usize {
        self.window_pairs
    }

    /// Number of sessions that have an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn slot(&self, session: &str) -> Option<Arc<SessionSlot>> {
        self.sessions.get(session).map(|slot| Arc::clone(slot.value()))
    }

    fn slot_or_create(&self, session: &str) -> Arc<SessionSlot> {
        if let Some(slot) = self.slot(session) {
            return slot;
        }
        let slot = self
            .sessions
            .entry(session.to_string())
            .or_insert_with(|| {
                debug!("Creating memory entry for session: {session}");
                Arc::new(SessionSlot::new(self.window_pairs))
            });
        Arc::clone(slot.value())
    }

    /// Read the window and summary of `session`.
    ///
    /// Unknown sessions read as an empty window and empty summary; no entry
    /// is created.
    #[must_use]
    pub fn get(&self, session: &str) -> MemorySnapshot {
        self.slot(session).map_or_else(MemorySnapshot::default, |slot| {
            let entry = slot.entry.read();
            MemorySnapshot {
                window: entry.window.to_vec(),
                summary: entry.summary.clone(),
            }
        })
    }

    /// Commit `exchange` to `session`'s memory.
    ///
    /// The messages enter the window in order, evicting the oldest beyond
    /// capacity, and the summary is replaced by
    /// `summarize(previous_summary, exchange)`. Window and summary are
    /// published together once summarization succeeds; on failure the entry
    /// is left exactly as it was. Concurrent appends to the same session run
    /// one after the other.
    pub async fn append(&self, session: &str, exchange: Vec<Message>) -> Result<(), MemoryError> {
        let slot = self.slot_or_create(session);
        let _writer = slot.writer.lock().await;

        if exchange.is_empty() {
            return Ok(());
        }

        let (mut window, previous_summary) = {
            let entry = slot.entry.read();
            (entry.window.clone(), entry.summary.clone())
        };
        window.extend(exchange.iter().cloned());

        let summary = match self.summarizer.summarize(&previous_summary, &exchange).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(
                    session,
                    error = %e,
                    "Summarization failed, memory left unchanged"
                );
                return Err(MemoryError::BackendUnavailable(e));
            }
        };

        let mut entry = slot.entry.write();
        entry.window = window;
        entry.summary = summary;
        entry.committed_messages += exchange.len();
        entry.updated_at = Utc::now();

        debug!(
            session,
            window = entry.window.len(),
            committed = entry.committed_messages,
            "Committed {} messages",
            exchange.len()
        );
        Ok(())
    }

    /// Reset the window, the summary, or both. Unknown sessions are ignored.
    pub async fn clear(&self, session: &str, target: ClearTarget) {
        let Some(slot) = self.slot(session) else {
            debug!("Nothing to clear for unknown session: {session}");
            return;
        };
        let _writer = slot.writer.lock().await;

        let mut entry = slot.entry.write();
        if matches!(target, ClearTarget::History | ClearTarget::Both) {
            entry.window.clear();
        }
        if matches!(target, ClearTarget::Summary | ClearTarget::Both) {
            entry.summary.clear();
        }
        entry.updated_at = Utc::now();

        info!(session, ?target, "Cleared session memory");
    }

    /// Statistics for every known session, ordered by session key.
    #[must_use]
    pub fn stats(&self) -> Vec<SessionStats> {
        let mut stats: Vec<SessionStats> = self
            .sessions
            .iter()
            .map(|slot| {
                let entry = slot.value().entry.read();
                SessionStats {
                    session: slot.key().clone(),
                    window_messages: entry.window.len(),
                    committed_messages: entry.committed_messages,
                    updated_at: entry.updated_at,
                }
            })
            .collect();
        stats.sort_by(|a, b| a.session.cmp(&b.session));
        stats
    }
}

impl fmt::Display for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MEMORY INFORMATION:")?;
        writeln!(f, "===================")?;
        for (i, stats) in self.stats().iter().enumerate() {
            writeln!(
                f,
                "{}. {}: {} messages",
                i + 1,
                stats.session,
                stats.committed_messages
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_providers::scripted::ScriptedSummarizer;

    fn store(pairs: usize) -> MemoryStore {
        MemoryStore::new(Arc::new(ScriptedSummarizer::new()), pairs)
    }

    #[test]
    fn test_get_unknown_session_is_empty() {
        let store = store(5);
        assert_eq!(store.get("nobody"), MemorySnapshot::default());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_append_creates_entry() {
        let store = store(5);
        store
            .append("s1", vec![Message::human("Hello"), Message::assistant("Hi")])
            .await
            .unwrap();

        let snapshot = store.get("s1");
        assert_eq!(
            snapshot.window,
            vec![Message::human("Hello"), Message::assistant("Hi")]
        );
        assert_eq!(snapshot.summary, "Human: Hello\nAI: Hi");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_targets() {
        let store = store(5);
        let exchange = vec![Message::human("Hello"), Message::assistant("Hi")];

        store.append("s1", exchange.clone()).await.unwrap();
        store.clear("s1", ClearTarget::History).await;
        let snapshot = store.get("s1");
        assert!(snapshot.window.is_empty());
        assert!(!snapshot.summary.is_empty());

        store.append("s1", exchange.clone()).await.unwrap();
        store.clear("s1", ClearTarget::Summary).await;
        let snapshot = store.get("s1");
        assert_eq!(snapshot.window.len(), 2);
        assert!(snapshot.summary.is_empty());

        store.append("s1", exchange).await.unwrap();
        store.clear("s1", ClearTarget::Both).await;
        assert_eq!(store.get("s1"), MemorySnapshot::default());

        store.clear("unknown", ClearTarget::Both).await;
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_and_display() {
        let store = store(1);
        for i in 0..3 {
            store
                .append(
                    "b",
                    vec![Message::human(format!("q{i}")), Message::assistant("a")],
                )
                .await
                .unwrap();
        }
        store
            .append("a", vec![Message::human("q"), Message::assistant("a")])
            .await
            .unwrap();

        let stats = store.stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].session, "a");
        assert_eq!(stats[1].session, "b");
        assert_eq!(stats[1].window_messages, 2);
        assert_eq!(stats[1].committed_messages, 6);

        let report = store.to_string();
        assert!(report.starts_with("MEMORY INFORMATION:\n"));
        assert!(report.contains("1. a: 2 messages"));
        assert!(report.contains("2. b: 6 messages"));
    }

    #[tokio::test]
    async fn test_clear_target_serde() {
        let target: ClearTarget = serde_json::from_str(r#""summary""#).unwrap();
        assert_eq!(target, ClearTarget::Summary);
    }
}
