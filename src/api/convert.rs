use chrono::NaiveDate;

use crate::core::TallyError;
use crate::query::{DataQuery, DataQueryRecord};

use super::types::{FetchRequest, RecordResponse};

const DATE_FORMAT: &str = "%Y-%m-%d";

impl TryFrom<&FetchRequest> for DataQuery {
    type Error = TallyError;

    fn try_from(req: &FetchRequest) -> Result<Self, TallyError> {
        let start_date = parse_date("startDate", &req.start_date)?;
        let end_date = parse_date("endDate", &req.end_date)?;
        DataQuery::new(start_date, end_date, req.min_count, req.max_count)
    }
}

/// Parses a strict `YYYY-MM-DD` date: four-digit year, two-digit month and day.
fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, TallyError> {
    let invalid = |reason: String| TallyError::InvalidDateFormat {
        field: field.to_string(),
        reason,
    };

    let bytes = raw.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
    if !well_formed {
        return Err(invalid(format!("expected YYYY-MM-DD, got {raw:?}")));
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| invalid(format!("{raw:?}: {e}")))
}

impl From<DataQueryRecord> for RecordResponse {
    fn from(record: DataQueryRecord) -> Self {
        Self {
            key: record.key,
            created_at: record.created_at,
            total_count: record.total_count,
        }
    }
}

/// Projects records one to one, keeping their order.
pub fn to_responses(records: Vec<DataQueryRecord>) -> Vec<RecordResponse> {
    records.into_iter().map(RecordResponse::from).collect()
}
