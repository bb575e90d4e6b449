//! Test utilities.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::AppState;
use crate::query::{DataQuery, DataQueryRecord};
use crate::store::{DocumentQueryService, KeyValueStore, MemoryCollection, MemoryStore};

/// One stored row: a key observed on a day with some counts.
#[derive(Debug, Clone)]
pub struct Observation {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub counts: Vec<i64>,
}

impl Observation {
    pub fn new(key: &str, created_at: DateTime<Utc>, counts: &[i64]) -> Self {
        Self {
            key: key.to_string(),
            created_at,
            counts: counts.to_vec(),
        }
    }
}

pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Rows around the window 2016-01-26..2018-02-02 with totals around
/// 2700..3000. That query matches `alpha` (2800), `bravo` (2700) and
/// `echo` (2900, from two rows).
pub fn sample_observations() -> Vec<Observation> {
    vec![
        Observation::new("alpha", day(2016, 1, 26), &[1000, 1800]),
        Observation::new("bravo", day(2017, 5, 1), &[2700]),
        Observation::new("charlie", day(2017, 6, 1), &[3000]),
        Observation::new("delta", day(2018, 2, 2), &[2800]),
        Observation::new("echo", day(2017, 8, 1), &[1400]),
        Observation::new("echo", day(2017, 7, 1), &[1500]),
        Observation::new("foxtrot", day(2015, 12, 31), &[2800]),
    ]
}

/// Deterministic random rows over 2019..2021 with a small key space so
/// keys repeat.
pub fn generate_observations(seed: u64, count: usize) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let key = format!("key-{}", rng.gen_range(0..20));
            let created_at = day(2019, 1, 1) + chrono::Duration::days(rng.gen_range(0..3 * 365));
            let counts = (0..rng.gen_range(0..4))
                .map(|_| rng.gen_range(0..500))
                .collect();
            Observation {
                key,
                created_at,
                counts,
            }
        })
        .collect()
}

pub async fn collection_from(observations: &[Observation]) -> MemoryCollection {
    let collection = MemoryCollection::new();
    for obs in observations {
        collection
            .insert(&obs.key, obs.created_at, &obs.counts)
            .await;
    }
    collection
}

/// App state over in-memory stores.
pub fn memory_state(collection: MemoryCollection) -> AppState {
    AppState::new(
        KeyValueStore::new(MemoryStore::new()),
        DocumentQueryService::new(collection),
        Duration::from_secs(5),
    )
}

/// Straightforward evaluation of `query` over `observations`, ordered by key.
pub fn expected_records(observations: &[Observation], query: &DataQuery) -> Vec<DataQueryRecord> {
    let (start, end) = (query.window_start(), query.window_end());
    let mut groups: BTreeMap<&str, (DateTime<Utc>, i64)> = BTreeMap::new();

    for obs in observations {
        if obs.created_at < start || obs.created_at >= end {
            continue;
        }
        let total: i64 = obs.counts.iter().sum();
        groups
            .entry(obs.key.as_str())
            .and_modify(|(earliest, sum)| {
                *earliest = (*earliest).min(obs.created_at);
                *sum += total;
            })
            .or_insert((obs.created_at, total));
    }

    groups
        .into_iter()
        .filter(|(_, (_, total))| query.min_count() <= *total && *total < query.max_count())
        .map(|(key, (created_at, total_count))| DataQueryRecord {
            key: key.to_string(),
            created_at,
            total_count,
        })
        .collect()
}
