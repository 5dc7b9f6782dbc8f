//! Tag → handler routing table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::handler::SentenceHandler;
use super::metrics::DispatchMetrics;

/// Maps tags to the handlers of their pending requests.
///
/// This is the only shared mutable state in the dispatch layer: the
/// dispatch loop and any number of registering callers access it in
/// parallel. Every operation serializes on one internal mutex scoped to
/// the map access alone; the lock is never held across a call into
/// handler code, so a slow handler cannot block registration for other
/// tags and handlers may re-enter the table (e.g. to register a follow-up
/// tag) without deadlocking.
///
/// # Shutdown
///
/// [`sweep`] captures and removes every entry in one step and marks the
/// table shut down. After that point no new registrations are accepted.
///
/// [`sweep`]: DispatchTable::sweep
pub struct DispatchTable {
    inner: Mutex<TableState>,
}

struct TableState {
    /// Live associations; `None` once the table has been swept.
    entries: Option<HashMap<String, Arc<dyn SentenceHandler>>>,

    /// Counters for metrics and debugging.
    registrations: u64,
    deregistrations: u64,
    dispatched: u64,
    discarded: u64,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TableState {
                entries: Some(HashMap::new()),
                registrations: 0,
                deregistrations: 0,
                dispatched: 0,
                discarded: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, TableState> {
        self.inner.lock().expect("dispatch table lock poisoned")
    }

    /// Register a handler for a tag.
    ///
    /// Callers must keep tags unique among currently-outstanding requests;
    /// registering a tag that is still live replaces the previous entry
    /// without notifying it.
    ///
    /// # Panics
    ///
    /// Panics if the table has already been swept: registering against a
    /// dispatcher that has shut down is a programming error on the
    /// caller's side.
    pub fn register(&self, tag: impl Into<String>, handler: Arc<dyn SentenceHandler>) {
        let mut state = self.state();
        let entries = state
            .entries
            .as_mut()
            .expect("register on a dispatch table that has shut down");
        entries.insert(tag.into(), handler);
        state.registrations += 1;
    }

    /// Look up the handler for a tag.
    ///
    /// Returns a cloned handle so the caller can invoke the handler
    /// without holding the table lock. A miss is not an error; it counts
    /// toward the `discarded` metric because the dispatch loop drops the
    /// sentence that prompted the lookup.
    pub fn lookup(&self, tag: &str) -> Option<Arc<dyn SentenceHandler>> {
        let mut state = self.state();
        let found = state
            .entries
            .as_ref()
            .and_then(|entries| entries.get(tag).cloned());
        match found {
            Some(handler) => {
                state.dispatched += 1;
                Some(handler)
            }
            None => {
                state.discarded += 1;
                None
            }
        }
    }

    /// Remove the association for a tag.
    ///
    /// Removing an absent tag is a no-op.
    pub fn remove(&self, tag: &str) -> Option<Arc<dyn SentenceHandler>> {
        let mut state = self.state();
        let removed = state
            .entries
            .as_mut()
            .and_then(|entries| entries.remove(tag));
        if removed.is_some() {
            state.deregistrations += 1;
        }
        removed
    }

    /// Capture and remove every entry, marking the table shut down.
    ///
    /// Used exactly once, when the dispatch loop terminates. The captured
    /// entries are returned so the caller can deliver close notifications
    /// outside the lock.
    pub fn sweep(&self) -> Vec<(String, Arc<dyn SentenceHandler>)> {
        let mut state = self.state();
        let swept: Vec<_> = state
            .entries
            .take()
            .map(|entries| entries.into_iter().collect())
            .unwrap_or_default();
        state.deregistrations += swept.len() as u64;
        swept
    }

    /// Number of currently registered handlers.
    pub fn pending(&self) -> usize {
        self.state()
            .entries
            .as_ref()
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Snapshot of the routing counters.
    pub fn metrics(&self) -> DispatchMetrics {
        let state = self.state();
        DispatchMetrics {
            registrations: state.registrations,
            deregistrations: state.deregistrations,
            dispatched: state.dispatched,
            discarded: state.discarded,
            pending: state.entries.as_ref().map(HashMap::len).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchResult;
    use crate::sentence::Sentence;

    /// Handler that records nothing; enough for table bookkeeping tests.
    struct NullHandler;

    impl SentenceHandler for NullHandler {
        fn process_sentence(&self, _sentence: Sentence) -> DispatchResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_new_table_is_empty() {
        let table = DispatchTable::new();
        assert_eq!(table.pending(), 0);
        assert_eq!(table.metrics(), DispatchMetrics::default());
    }

    #[test]
    fn test_register_and_lookup() {
        let table = DispatchTable::new();
        table.register("1", Arc::new(NullHandler));

        assert_eq!(table.pending(), 1);
        assert!(table.lookup("1").is_some());
        assert_eq!(table.metrics().registrations, 1);
        assert_eq!(table.metrics().dispatched, 1);
    }

    #[test]
    fn test_lookup_miss_counts_discarded() {
        let table = DispatchTable::new();
        assert!(table.lookup("nope").is_none());

        let metrics = table.metrics();
        assert_eq!(metrics.discarded, 1);
        assert_eq!(metrics.dispatched, 0);
    }

    #[test]
    fn test_remove_deletes_association() {
        let table = DispatchTable::new();
        table.register("1", Arc::new(NullHandler));

        assert!(table.remove("1").is_some());
        assert_eq!(table.pending(), 0);
        assert!(table.lookup("1").is_none());
        assert_eq!(table.metrics().deregistrations, 1);
    }

    #[test]
    fn test_remove_absent_tag_is_noop() {
        let table = DispatchTable::new();
        assert!(table.remove("1").is_none());
        assert_eq!(table.metrics().deregistrations, 0);
    }

    #[test]
    fn test_reregistering_live_tag_replaces_entry() {
        let table = DispatchTable::new();
        table.register("1", Arc::new(NullHandler));
        table.register("1", Arc::new(NullHandler));

        assert_eq!(table.pending(), 1);
        assert_eq!(table.metrics().registrations, 2);
    }

    #[test]
    fn test_sweep_captures_everything() {
        let table = DispatchTable::new();
        table.register("a", Arc::new(NullHandler));
        table.register("b", Arc::new(NullHandler));

        let mut swept: Vec<String> = table.sweep().into_iter().map(|(tag, _)| tag).collect();
        swept.sort();
        assert_eq!(swept, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(table.pending(), 0);
        assert_eq!(table.metrics().deregistrations, 2);
    }

    #[test]
    fn test_sweep_twice_is_empty() {
        let table = DispatchTable::new();
        table.register("a", Arc::new(NullHandler));

        assert_eq!(table.sweep().len(), 1);
        assert!(table.sweep().is_empty());
    }

    #[test]
    #[should_panic(expected = "shut down")]
    fn test_register_after_sweep_panics() {
        let table = DispatchTable::new();
        table.sweep();
        table.register("1", Arc::new(NullHandler));
    }
}
