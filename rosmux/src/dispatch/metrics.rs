//! Routing counters for the dispatch table.

/// Snapshot of dispatch-table counters.
///
/// Taken under the table lock via [`DispatchTable::metrics`], so the
/// fields are mutually consistent at the instant of the snapshot.
///
/// [`DispatchTable::metrics`]: super::DispatchTable::metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchMetrics {
    /// Total handler registrations over the table's lifetime.
    pub registrations: u64,

    /// Total handler removals, including the shutdown sweep.
    pub deregistrations: u64,

    /// Sentences routed to a registered handler.
    pub dispatched: u64,

    /// Sentences discarded because no handler was registered for their tag.
    pub discarded: u64,

    /// Handlers currently registered.
    pub pending: usize,
}
