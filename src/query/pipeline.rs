//! Aggregation pipeline for the count query.
//!
//! A [`Pipeline`] is built from a [`DataQuery`] and always holds the same
//! three stages in the same order:
//!
//! 1. keep rows with `start <= createdAt < end`
//! 2. group rows by `key`, summing `counts` into `totalCount`
//! 3. keep groups with `minCount <= totalCount < maxCount`
//!
//! Both filters are half-open. Filtering totals before grouping would
//! change the result, so stages are never reordered.

use chrono::{DateTime, Utc};
use mongodb::bson::{self, Document, doc};

use super::model::{COUNTS_FIELD, CREATED_AT_FIELD, DataQuery, KEY_FIELD, TOTAL_COUNT_FIELD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Rows whose `createdAt` lies in `[start, end)`.
    MatchWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// One output row per `key`: earliest `createdAt`, summed `counts`.
    GroupTotals,
    /// Groups whose `totalCount` lies in `[min, max)`.
    MatchTotal { min: i64, max: i64 },
}

impl Stage {
    /// MongoDB stage documents for this stage. Grouping needs a `$project`
    /// after the `$group` to drop `_id`, so it renders as two documents.
    pub fn to_documents(&self) -> Vec<Document> {
        match self {
            Stage::MatchWindow { start, end } => vec![doc! {
                "$match": {
                    CREATED_AT_FIELD: {
                        "$gte": bson_datetime(start),
                        "$lt": bson_datetime(end),
                    }
                }
            }],
            Stage::GroupTotals => vec![
                doc! {
                    "$group": {
                        "_id": format!("${KEY_FIELD}"),
                        CREATED_AT_FIELD: { "$min": format!("${CREATED_AT_FIELD}") },
                        // inner $sum folds an array of counts, or passes a scalar through
                        TOTAL_COUNT_FIELD: { "$sum": { "$sum": format!("${COUNTS_FIELD}") } },
                    }
                },
                doc! {
                    "$project": {
                        "_id": 0,
                        KEY_FIELD: "$_id",
                        CREATED_AT_FIELD: 1,
                        TOTAL_COUNT_FIELD: 1,
                    }
                },
            ],
            Stage::MatchTotal { min, max } => vec![doc! {
                "$match": {
                    TOTAL_COUNT_FIELD: { "$gte": *min, "$lt": *max }
                }
            }],
        }
    }
}

fn bson_datetime(at: &DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline(Vec<Stage>);

impl Pipeline {
    pub fn for_query(query: &DataQuery) -> Self {
        Self(vec![
            Stage::MatchWindow {
                start: query.window_start(),
                end: query.window_end(),
            },
            Stage::GroupTotals,
            Stage::MatchTotal {
                min: query.min_count(),
                max: query.max_count(),
            },
        ])
    }

    pub fn stages(&self) -> &[Stage] {
        &self.0
    }

    pub fn to_documents(&self) -> Vec<Document> {
        self.0.iter().flat_map(Stage::to_documents).collect()
    }
}
