//! The entry store boundary and its in-memory reference implementation.
//!
//! The ledger core treats persistence as an external collaborator: a store
//! returns entries matching an agent and time window, filtered but in no
//! guaranteed order. Callers sort before chaining.
//!
//! `InMemoryEntryStore` is the reference implementation, used by tests and
//! the demo. It keeps entries in a `Vec` behind a `Mutex`, making it safe
//! to share across threads while events are appended and reports are
//! generated.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use custos_contracts::{
    entry::AuditEntry,
    error::{CustosError, CustosResult},
    report::TimeRange,
};

/// A queryable, append-only source of audit entries.
///
/// Implementations back this with whatever persistence they have — a
/// document store, a database, a file. Contract:
///
/// - `query` returns every stored entry for `agent_id` whose timestamp
///   falls inside `range` (inclusive), in arbitrary order;
/// - when `deadline` is given, a query that cannot complete within it
///   fails with `SourceTimeout` — never a silently truncated batch;
/// - `append` durably adds one entry;
/// - an unreachable backend fails with `SourceUnavailable`.
pub trait EntryStore: Send + Sync {
    /// Fetch all entries for `agent_id` within `range`.
    ///
    /// `deadline` is the caller's time budget for the whole query.
    /// `None` means unbounded.
    fn query(
        &self,
        agent_id: &str,
        range: &TimeRange,
        deadline: Option<Duration>,
    ) -> CustosResult<Vec<AuditEntry>>;

    /// Append one entry to the store.
    fn append(&self, entry: AuditEntry) -> CustosResult<()>;
}

/// In-memory `EntryStore` backed by a mutex-protected `Vec`.
///
/// # Thread safety
///
/// Both operations acquire a `Mutex` internally. Clones share the same
/// underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryEntryStore {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl InMemoryEntryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entries, across all agents.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntryStore for InMemoryEntryStore {
    /// Return clones of all matching entries, in append order.
    ///
    /// Append order is an implementation accident, not a guarantee —
    /// callers must still sort by timestamp before chaining.
    ///
    /// The deadline is checked after the scan: a query that used up its
    /// whole budget fails with `SourceTimeout` rather than handing back a
    /// batch the caller already considers stale.
    fn query(
        &self,
        agent_id: &str,
        range: &TimeRange,
        deadline: Option<Duration>,
    ) -> CustosResult<Vec<AuditEntry>> {
        let started = Instant::now();

        let entries = self.entries.lock().map_err(|e| CustosError::SourceUnavailable {
            reason: format!("entry store lock poisoned: {}", e),
        })?;

        let matched: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| e.agent_id == agent_id && range.contains(e.timestamp))
            .cloned()
            .collect();

        if let Some(deadline) = deadline {
            if started.elapsed() >= deadline {
                return Err(CustosError::SourceTimeout {
                    timeout_ms: deadline.as_millis() as u64,
                });
            }
        }

        debug!(
            agent_id = %agent_id,
            matched = matched.len(),
            "entry store queried"
        );
        Ok(matched)
    }

    fn append(&self, entry: AuditEntry) -> CustosResult<()> {
        let mut entries = self.entries.lock().map_err(|e| CustosError::SourceUnavailable {
            reason: format!("entry store lock poisoned: {}", e),
        })?;
        entries.push(entry);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    use custos_contracts::entry::{EventData, EventType};

    use super::*;

    fn make_entry(agent: &str, offset_secs: i64) -> AuditEntry {
        AuditEntry::new(
            agent,
            "user-1",
            EventType::ChatMessage,
            EventData::default(),
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
                + ChronoDuration::seconds(offset_secs),
        )
    }

    fn day_range() -> TimeRange {
        TimeRange {
            start: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn query_filters_by_agent() {
        let store = InMemoryEntryStore::new();
        store.append(make_entry("agent-1", 0)).unwrap();
        store.append(make_entry("agent-2", 1)).unwrap();
        store.append(make_entry("agent-1", 2)).unwrap();

        let result = store.query("agent-1", &day_range(), None).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|e| e.agent_id == "agent-1"));
    }

    #[test]
    fn query_filters_by_time_range() {
        let store = InMemoryEntryStore::new();
        store.append(make_entry("agent-1", 0)).unwrap();
        // Outside the day window.
        store.append(make_entry("agent-1", 24 * 3600)).unwrap();

        let result = store.query("agent-1", &day_range(), None).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn query_on_empty_store_returns_empty() {
        let store = InMemoryEntryStore::new();
        assert!(store
            .query("agent-1", &day_range(), None)
            .unwrap()
            .is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn generous_deadline_does_not_trip() {
        let store = InMemoryEntryStore::new();
        store.append(make_entry("agent-1", 0)).unwrap();

        let result = store
            .query("agent-1", &day_range(), Some(Duration::from_secs(30)))
            .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn exhausted_deadline_fails_with_timeout() {
        let store = InMemoryEntryStore::new();
        store.append(make_entry("agent-1", 0)).unwrap();

        // A zero budget is always exhausted by the time the scan finishes.
        let err = store
            .query("agent-1", &day_range(), Some(Duration::ZERO))
            .unwrap_err();
        assert!(matches!(err, CustosError::SourceTimeout { timeout_ms: 0 }));
    }

    #[test]
    fn clones_share_storage() {
        let store = InMemoryEntryStore::new();
        let alias = store.clone();
        alias.append(make_entry("agent-1", 0)).unwrap();
        assert_eq!(store.len(), 1);
    }
}
