//! Restart-safe pagination cursor recovery.
//!
//! A harvest run resumes exactly where the last completed run for the
//! same source left off. The cursor is never written as a standalone
//! run-completion marker: it is stamped into the extras of every
//! record the run produces, so an interrupted run still recovers from
//! whichever record was persisted last. Duplicate work on restart is
//! bounded to at most one page.

use serde::{Deserialize, Serialize};

use crate::config::MIN_PAGE_START;
use crate::record::NormalizedRecord;

/// Extras key under which the cursor is stamped on each record.
pub const CURSOR_EXTRA_KEY: &str = "harvest_cursor";

/// Pagination position of a harvest run for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestCursor {
    /// Collection the cursor belongs to.
    pub collection_key: String,

    /// Page-start index; always at least [`MIN_PAGE_START`].
    pub page_start: u64,
}

impl HarvestCursor {
    /// Cursor at the minimum pagination value.
    #[must_use]
    pub fn seed(collection_key: impl Into<String>) -> Self {
        Self {
            collection_key: collection_key.into(),
            page_start: MIN_PAGE_START,
        }
    }

    /// Cursor at an explicit position, clamped to the minimum.
    #[must_use]
    pub fn at(collection_key: impl Into<String>, page_start: u64) -> Self {
        Self {
            collection_key: collection_key.into(),
            page_start: page_start.max(MIN_PAGE_START),
        }
    }

    /// Stamp this cursor into a record's extras.
    pub fn stamp(&self, record: &mut NormalizedRecord) {
        record
            .extras
            .insert(CURSOR_EXTRA_KEY.to_string(), self.page_start.to_string());
    }
}

/// Read seam to the host's record of completed harvest runs.
pub trait CursorStore {
    /// Cursor persisted by the most recently completed run for this
    /// source, or `None` if no run has completed yet.
    fn last_completed_cursor(&self, source_id: &str) -> Option<HarvestCursor>;
}

/// Cursor recovery across independent harvest runs.
pub struct RestartCursor;

impl RestartCursor {
    /// Load the resume position for a source, seeding the minimum
    /// pagination value when no completed run exists.
    #[must_use]
    pub fn load(
        store: &dyn CursorStore,
        source_id: &str,
        collection_key: &str,
    ) -> HarvestCursor {
        match store.last_completed_cursor(source_id) {
            Some(cursor) => HarvestCursor::at(cursor.collection_key, cursor.page_start),
            None => HarvestCursor::seed(collection_key),
        }
    }
}
