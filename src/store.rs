//! In-memory implementation of the host-store seams.
//!
//! The host catalogue's record persistence is opaque to this crate and
//! reached only through the [`DatasetStore`] and [`CursorStore`]
//! traits. `MemoryStore` is the reference implementation used by the
//! CLI and the test suite.

use std::collections::{BTreeMap, BTreeSet};

use crate::cursor::{CursorStore, HarvestCursor};
use crate::record::{DatasetStore, NormalizedRecord};

/// Dataset names and completed-run cursors held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    names: BTreeSet<String>,
    cursors: BTreeMap<String, HarvestCursor>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist one produced record's name.
    pub fn insert_record(&mut self, record: &NormalizedRecord) {
        self.names.insert(record.name.clone());
    }

    /// Mark a run as completed at the given cursor. The stored cursor
    /// is monotonically non-decreasing per source.
    pub fn complete_run(&mut self, source_id: &str, cursor: HarvestCursor) {
        match self.cursors.get(source_id) {
            Some(existing) if existing.page_start > cursor.page_start => {}
            _ => {
                self.cursors.insert(source_id.to_string(), cursor);
            }
        }
    }

    /// Number of distinct dataset names held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl DatasetStore for MemoryStore {
    fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl CursorStore for MemoryStore {
    fn last_completed_cursor(&self, source_id: &str) -> Option<HarvestCursor> {
        self.cursors.get(source_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cursor_monotonic_per_source() {
        let mut store = MemoryStore::new();
        store.complete_run("s1", HarvestCursor::at("C", 51));
        store.complete_run("s1", HarvestCursor::at("C", 26));
        assert_eq!(
            store.last_completed_cursor("s1").map(|c| c.page_start),
            Some(51)
        );

        store.complete_run("s1", HarvestCursor::at("C", 101));
        assert_eq!(
            store.last_completed_cursor("s1").map(|c| c.page_start),
            Some(101)
        );
    }

    #[test]
    fn test_sources_are_independent() {
        let mut store = MemoryStore::new();
        store.complete_run("s1", HarvestCursor::at("C", 51));
        assert_eq!(store.last_completed_cursor("s2"), None);
    }
}
