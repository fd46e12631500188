//! Gather phase of a harvest run, tying all components together.
//!
//! One run processes one source, one page at a time, one entry at a
//! time. The smallest atomic unit of work is a page: its entries are
//! converted to records and stamped with the page's cursor before the
//! next page is requested. A failed page fetch ends the run; records
//! produced so far survive, and the cursor they carry is the next
//! run's resume point.

use serde_json::Value;

use crate::config::HarvestConfig;
use crate::cursor::{CursorStore, HarvestCursor, RestartCursor};
use crate::error::Result;
use crate::http::{create_client, Pacer};
use crate::pagination::{PaginatedQuery, QueryState};
use crate::path::resolve;
use crate::record::{DatasetStore, HarvestRecordBuilder, NormalizedRecord};
use crate::schema::{CollectionSchema, SchemaCatalog};

/// Everything one gather run produced.
#[derive(Debug)]
pub struct GatherOutcome {
    /// Records in production order, each stamped with the cursor of
    /// the page it came from.
    pub records: Vec<NormalizedRecord>,

    /// Run-level gather errors (failed page fetches) and entry-level
    /// parse failures, in occurrence order.
    pub errors: Vec<String>,

    /// Cursor position after the last fully consumed page.
    pub cursor: HarvestCursor,
}

/// Run the gather phase for one harvest source.
///
/// Configuration and schema problems fail fast before any network
/// call. Page-level network errors end the page loop but are returned
/// inside the outcome, together with every record produced before the
/// failure.
pub fn gather<S>(
    source_id: &str,
    config: &HarvestConfig,
    catalog: &SchemaCatalog,
    store: &S,
) -> Result<GatherOutcome>
where
    S: DatasetStore + CursorStore,
{
    config.validate()?;
    let schema = catalog.get(&config.collection)?;
    let client = create_client(config)?;

    let resume = RestartCursor::load(store, source_id, &config.collection);
    tracing::info!(
        source_id,
        collection = %config.collection,
        page_start = resume.page_start,
        "Starting gather"
    );

    let mut query = PaginatedQuery::new(config, schema, resume.page_start)?;
    query.build();

    let builder = HarvestRecordBuilder::new(schema, &config.collection, config.update_all);
    let mut pacer = Pacer::new();
    let mut records = Vec::new();
    let mut errors = Vec::new();

    loop {
        let page_cursor = HarvestCursor::at(config.collection.as_str(), query.page_start());

        let page = match query.fetch(&client, &mut pacer, config) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(error = %e, "Page fetch failed, ending run");
                errors.push(e.to_string());
                break;
            }
        };

        let entries = entry_list(&page, schema);
        let consumed = entries.len();
        tracing::debug!(consumed, page_start = page_cursor.page_start, "Page fetched");

        for entry in entries {
            match builder.build(entry, store) {
                Ok(mut record) => {
                    page_cursor.stamp(&mut record);
                    records.push(record);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping entry");
                    errors.push(e.to_string());
                }
            }
        }

        query.advance(consumed);
        if query.state() == QueryState::Exhausted {
            break;
        }
    }

    let cursor = HarvestCursor::at(config.collection.as_str(), query.page_start());
    tracing::info!(
        records = records.len(),
        errors = errors.len(),
        page_start = cursor.page_start,
        "Gather finished"
    );

    Ok(GatherOutcome {
        records,
        errors,
        cursor,
    })
}

/// Extract the raw entry list from a fetched page.
///
/// A page with one entry may hold it as a bare mapping instead of a
/// one-element array (XML normalization does this); both shapes yield
/// the same list. A missing entry list is an empty page.
fn entry_list<'a>(page: &'a Value, schema: &CollectionSchema) -> Vec<&'a Value> {
    match resolve(page, &schema.entry_list_path) {
        Some(Value::Array(entries)) => entries.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::schema::SchemaCatalog;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::from_json(crate::schema::test_fixtures::SENTINEL_CATALOG).unwrap()
    }

    #[test]
    fn test_entry_list_array() {
        let catalog = catalog();
        let schema = catalog.get("SENTINEL2_L1C").unwrap();
        let page = json!({"feed": {"entry": [{"id": "a"}, {"id": "b"}]}});
        assert_eq!(entry_list(&page, schema).len(), 2);
    }

    #[test]
    fn test_entry_list_single_mapping_coerced() {
        let catalog = catalog();
        let schema = catalog.get("SENTINEL2_L1C").unwrap();
        let page = json!({"feed": {"entry": {"id": "a"}}});
        assert_eq!(entry_list(&page, schema).len(), 1);
    }

    #[test]
    fn test_entry_list_missing_is_empty_page() {
        let catalog = catalog();
        let schema = catalog.get("SENTINEL2_L1C").unwrap();
        let page = json!({"feed": {"totalResults": "0"}});
        assert!(entry_list(&page, schema).is_empty());
    }

    #[test]
    fn test_gather_unknown_collection_fails_fast() {
        let config = HarvestConfig::from_json(
            r#"{
                "base_query_url": "https://example.com/search",
                "page_size_keyword": "rows",
                "page_start_keyword": "start",
                "collection": "NOT_A_COLLECTION"
            }"#,
        )
        .unwrap();
        let store = crate::store::MemoryStore::new();
        let err = gather("s1", &config, &catalog(), &store).unwrap_err();
        assert!(matches!(
            err,
            crate::error::HarvesterError::UnknownCollection(_)
        ));
    }
}
