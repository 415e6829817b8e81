//! Per-table primary-key counters.

use std::collections::HashMap;

/// Hands out monotonically increasing integer keys per table.
///
/// The first key for a table is 1. Keys are never handed out twice, even
/// after the rows carrying them are deleted. The counters are not persisted;
/// after a reload they are reseeded from the keys found in the data.
///
/// The store picks a candidate with [`peek`](Self::peek) and claims it with
/// [`next_key`](Self::next_key) only once the insert succeeds, so rejected
/// inserts leave the counter alone. Once a counter reaches `u64::MAX` the
/// table has no keys left and both return `None`.
#[derive(Debug, Clone, Default)]
pub struct KeyAllocator {
    /// Last key handed out (or seeded) per table.
    last: HashMap<String, u64>,
}

impl KeyAllocator {
    /// Creates an allocator with no counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next key for `table`, or `None` if the key space is
    /// exhausted.
    pub fn next_key(&mut self, table: &str) -> Option<u64> {
        let last = self.last.entry(table.to_string()).or_insert(0);
        *last = last.checked_add(1)?;
        Some(*last)
    }

    /// Returns the key the next call to [`next_key`](Self::next_key) would
    /// yield, without consuming it.
    #[must_use]
    pub fn peek(&self, table: &str) -> Option<u64> {
        self.last.get(table).copied().unwrap_or(0).checked_add(1)
    }

    /// Makes sure the next key for `table` is greater than `key`.
    ///
    /// Never moves a counter backwards.
    pub fn observe(&mut self, table: &str, key: u64) {
        let last = self.last.entry(table.to_string()).or_insert(0);
        if key > *last {
            *last = key;
        }
    }

    /// Drops the counter for `table`; the next key starts at 1 again.
    pub fn forget(&mut self, table: &str) {
        self.last.remove(table);
    }

    /// Returns `(table, next key)` for every table with a counter.
    pub fn counters(&self) -> impl Iterator<Item = (&str, u64)> {
        self.last
            .iter()
            .map(|(table, last)| (table.as_str(), last.saturating_add(1)))
    }
}
