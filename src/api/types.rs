use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::TallyError;

/// Request body for `POST /fetch`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub start_date: String,
    pub end_date: String,
    pub min_count: i64,
    pub max_count: i64,
}

impl FetchRequest {
    pub fn validate(&self) -> Result<(), TallyError> {
        require("startDate", &self.start_date)?;
        require("endDate", &self.end_date)
    }
}

/// One aggregated record as sent to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub total_count: i64,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub code: i32,
    pub msg: String,
    pub records: Vec<RecordResponse>,
}

impl FetchResponse {
    pub fn success(records: Vec<RecordResponse>) -> Self {
        Self {
            code: 0,
            msg: String::from("Success"),
            records,
        }
    }
}

/// Body of `POST /in-memory` and of both in-memory responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn validate(&self) -> Result<(), TallyError> {
        require("key", &self.key)?;
        require("value", &self.value)
    }
}

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

fn require(field: &str, value: &str) -> Result<(), TallyError> {
    if value.is_empty() {
        return Err(TallyError::InvalidRequest(format!("{field} is required")));
    }
    Ok(())
}
