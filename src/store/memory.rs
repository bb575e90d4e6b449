use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, Bson, Document, doc};
use tokio::sync::RwLock;

use super::document::DocumentCollection;
use super::kv::KeyValueBackend;
use crate::core::TallyError;
use crate::query::{
    COUNTS_FIELD, CREATED_AT_FIELD, KEY_FIELD, Pipeline, Stage, TOTAL_COUNT_FIELD,
};

/// Process-local key-value backend.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueBackend for MemoryStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), TallyError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, TallyError> {
        Ok(self.entries.read().await.get(key).cloned())
    }
}

/// Process-local document collection.
///
/// Evaluates pipeline stages with the same semantics MongoDB gives their
/// rendered form. Counts may be a number or an array of numbers; only
/// integer counts are summed. Output is ordered by key.
#[derive(Default)]
pub struct MemoryCollection {
    rows: RwLock<Vec<Document>>,
    disconnected: AtomicBool,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, key: &str, created_at: DateTime<Utc>, counts: &[i64]) {
        self.insert_document(doc! {
            KEY_FIELD: key,
            CREATED_AT_FIELD: bson::DateTime::from_millis(created_at.timestamp_millis()),
            COUNTS_FIELD: counts.to_vec(),
        })
        .await;
    }

    pub async fn insert_document(&self, row: Document) {
        self.rows.write().await.push(row);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>, TallyError> {
        if self.disconnected.load(Ordering::Acquire) {
            return Err(TallyError::StorageUnavailable(
                "collection is disconnected".to_string(),
            ));
        }

        let mut documents = self.rows.read().await.clone();
        for stage in pipeline.stages() {
            documents = apply(stage, documents);
        }
        Ok(documents)
    }

    async fn disconnect(&self) -> Result<(), TallyError> {
        self.disconnected.store(true, Ordering::Release);
        Ok(())
    }
}

fn apply(stage: &Stage, documents: Vec<Document>) -> Vec<Document> {
    match stage {
        Stage::MatchWindow { start, end } => {
            let (start, end) = (start.timestamp_millis(), end.timestamp_millis());
            documents
                .into_iter()
                .filter(|doc| match doc.get(CREATED_AT_FIELD) {
                    Some(Bson::DateTime(at)) => {
                        (start..end).contains(&at.timestamp_millis())
                    }
                    _ => false,
                })
                .collect()
        }
        Stage::GroupTotals => group_totals(documents),
        Stage::MatchTotal { min, max } => documents
            .into_iter()
            .filter(|doc| match doc.get(TOTAL_COUNT_FIELD) {
                Some(Bson::Int64(total)) => (*min..*max).contains(total),
                _ => false,
            })
            .collect(),
    }
}

struct Group {
    key: Bson,
    created_at: Option<bson::DateTime>,
    total: i64,
}

fn group_totals(documents: Vec<Document>) -> Vec<Document> {
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();

    for doc in documents {
        let key = doc.get(KEY_FIELD).cloned().unwrap_or(Bson::Null);
        let slot = match &key {
            Bson::String(s) => s.clone(),
            other => other.to_string(),
        };
        let group = groups.entry(slot).or_insert_with(|| Group {
            key,
            created_at: None,
            total: 0,
        });

        if let Some(Bson::DateTime(at)) = doc.get(CREATED_AT_FIELD) {
            group.created_at = Some(match group.created_at {
                Some(earliest) if earliest <= *at => earliest,
                _ => *at,
            });
        }
        let row_total = doc.get(COUNTS_FIELD).map(sum_counts).unwrap_or(0);
        group.total = group.total.saturating_add(row_total);
    }

    groups
        .into_values()
        .map(|group| {
            let created_at = group.created_at.map(Bson::DateTime).unwrap_or(Bson::Null);
            doc! {
                KEY_FIELD: group.key,
                CREATED_AT_FIELD: created_at,
                TOTAL_COUNT_FIELD: group.total,
            }
        })
        .collect()
}

/// Non-numeric values count as zero, as `$sum` ignores them. Totals
/// saturate at the `i64` bounds.
fn sum_counts(counts: &Bson) -> i64 {
    match counts {
        Bson::Int32(v) => i64::from(*v),
        Bson::Int64(v) => *v,
        Bson::Array(values) => values
            .iter()
            .map(sum_counts)
            .fold(0_i64, i64::saturating_add),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::query::DataQuery;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn pipeline(start: (i32, u32, u32), end: (i32, u32, u32), min: i64, max: i64) -> Pipeline {
        let query = DataQuery::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            min,
            max,
        )
        .unwrap();
        Pipeline::for_query(&query)
    }

    fn keys(documents: &[Document]) -> Vec<&str> {
        documents
            .iter()
            .map(|d| d.get_str(KEY_FIELD).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_window_includes_start_excludes_end() {
        let collection = MemoryCollection::new();
        collection.insert("on-start", at(2020, 1, 1), &[5]).await;
        collection.insert("inside", at(2020, 1, 15), &[5]).await;
        collection.insert("on-end", at(2020, 2, 1), &[5]).await;
        collection.insert("before", at(2019, 12, 31), &[5]).await;

        let out = collection
            .aggregate(&pipeline((2020, 1, 1), (2020, 2, 1), 0, 100))
            .await
            .unwrap();
        assert_eq!(keys(&out), ["inside", "on-start"]);
    }

    #[tokio::test]
    async fn test_total_includes_min_excludes_max() {
        let collection = MemoryCollection::new();
        collection.insert("min", at(2020, 1, 2), &[10]).await;
        collection.insert("max", at(2020, 1, 2), &[20]).await;
        collection.insert("mid", at(2020, 1, 2), &[7, 8]).await;
        collection.insert("low", at(2020, 1, 2), &[9]).await;

        let out = collection
            .aggregate(&pipeline((2020, 1, 1), (2020, 2, 1), 10, 20))
            .await
            .unwrap();
        assert_eq!(keys(&out), ["mid", "min"]);
        assert_eq!(out[0].get_i64(TOTAL_COUNT_FIELD).unwrap(), 15);
    }

    #[tokio::test]
    async fn test_rows_sharing_a_key_are_summed() {
        let collection = MemoryCollection::new();
        collection.insert("a", at(2020, 1, 10), &[1, 2]).await;
        collection.insert("a", at(2020, 1, 5), &[3]).await;
        collection.insert("a", at(2021, 1, 5), &[1000]).await;
        collection
            .insert_document(doc! {
                KEY_FIELD: "a",
                CREATED_AT_FIELD: bson::DateTime::from_millis(at(2020, 1, 20).timestamp_millis()),
                COUNTS_FIELD: 4_i32,
            })
            .await;

        let out = collection
            .aggregate(&pipeline((2020, 1, 1), (2020, 2, 1), 0, 1000))
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get_i64(TOTAL_COUNT_FIELD).unwrap(), 10);
        assert_eq!(
            out[0].get_datetime(CREATED_AT_FIELD).unwrap().timestamp_millis(),
            at(2020, 1, 5).timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_filtering_happens_after_grouping() {
        // Each row alone is below the minimum; only their sum qualifies.
        let collection = MemoryCollection::new();
        collection.insert("a", at(2020, 1, 2), &[6]).await;
        collection.insert("a", at(2020, 1, 3), &[6]).await;

        let out = collection
            .aggregate(&pipeline((2020, 1, 1), (2020, 2, 1), 10, 20))
            .await
            .unwrap();
        assert_eq!(keys(&out), ["a"]);
    }

    #[test]
    fn test_overflowing_totals_saturate() {
        let row = |key: &str, counts: Vec<i64>| {
            doc! {
                KEY_FIELD: key,
                CREATED_AT_FIELD: bson::DateTime::from_millis(0),
                COUNTS_FIELD: counts,
            }
        };
        let groups = group_totals(vec![
            row("a", vec![i64::MAX, 1]),
            row("b", vec![i64::MAX]),
            row("b", vec![i64::MAX]),
            row("c", vec![i64::MIN, -1]),
        ]);
        let totals: Vec<i64> = groups
            .iter()
            .map(|g| g.get_i64(TOTAL_COUNT_FIELD).unwrap())
            .collect();
        assert_eq!(totals, [i64::MAX, i64::MAX, i64::MIN]);
    }

    #[tokio::test]
    async fn test_overflowing_row_is_aggregated() {
        let collection = MemoryCollection::new();
        collection.insert("a", at(2020, 1, 2), &[i64::MAX, 1]).await;
        collection.insert("b", at(2020, 1, 2), &[3]).await;

        let out = collection
            .aggregate(&pipeline((2020, 1, 1), (2020, 2, 1), 0, i64::MAX))
            .await
            .unwrap();
        assert_eq!(keys(&out), ["b"]);
    }

    #[tokio::test]
    async fn test_disconnected_collection_is_unavailable() {
        let collection = MemoryCollection::new();
        collection.disconnect().await.unwrap();
        let result = collection
            .aggregate(&pipeline((2020, 1, 1), (2020, 2, 1), 0, 1))
            .await;
        assert!(matches!(result, Err(TallyError::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await, Ok(None));
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await, Ok(Some("v".to_string())));
    }
}
