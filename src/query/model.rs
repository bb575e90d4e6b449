use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mongodb::bson::{Bson, Document};

use crate::core::TallyError;

pub const KEY_FIELD: &str = "key";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const COUNTS_FIELD: &str = "counts";
pub const TOTAL_COUNT_FIELD: &str = "totalCount";

/// A validated aggregation request. `start_date <= end_date` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataQuery {
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_count: i64,
    max_count: i64,
}

impl DataQuery {
    /// Counts are taken as given; only the date order is checked.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        min_count: i64,
        max_count: i64,
    ) -> Result<Self, TallyError> {
        if start_date > end_date {
            return Err(TallyError::ChronologicalOrder);
        }
        Ok(Self {
            start_date,
            end_date,
            min_count,
            max_count,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn min_count(&self) -> i64 {
        self.min_count
    }

    pub fn max_count(&self) -> i64 {
        self.max_count
    }

    /// Start of the window, midnight UTC.
    pub fn window_start(&self) -> DateTime<Utc> {
        midnight_utc(self.start_date)
    }

    /// End of the window (exclusive), midnight UTC.
    pub fn window_end(&self) -> DateTime<Utc> {
        midnight_utc(self.end_date)
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    NaiveDateTime::from(date).and_utc()
}

/// One aggregated group as returned by the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQueryRecord {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub total_count: i64,
}

impl TryFrom<Document> for DataQueryRecord {
    type Error = TallyError;

    fn try_from(doc: Document) -> Result<Self, TallyError> {
        let key = doc
            .get_str(KEY_FIELD)
            .map_err(|e| TallyError::DecodeError(format!("{KEY_FIELD}: {e}")))?
            .to_string();

        let created_at = doc
            .get_datetime(CREATED_AT_FIELD)
            .map_err(|e| TallyError::DecodeError(format!("{CREATED_AT_FIELD}: {e}")))?;
        let created_at = DateTime::from_timestamp_millis(created_at.timestamp_millis())
            .ok_or_else(|| {
                TallyError::DecodeError(format!("{CREATED_AT_FIELD}: {created_at} out of range"))
            })?;

        let total_count = match doc.get(TOTAL_COUNT_FIELD) {
            Some(value) => integer(value).ok_or_else(|| {
                TallyError::DecodeError(format!(
                    "{TOTAL_COUNT_FIELD}: expected integer, got {value}"
                ))
            })?,
            None => {
                return Err(TallyError::DecodeError(format!(
                    "{TOTAL_COUNT_FIELD}: missing"
                )));
            }
        };

        Ok(Self {
            key,
            created_at,
            total_count,
        })
    }
}

/// `$sum` yields int32, int64 or double depending on its inputs.
fn integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v)
            if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 =>
        {
            Some(*v as i64)
        }
        _ => None,
    }
}
