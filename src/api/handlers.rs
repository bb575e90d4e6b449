use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::de::DeserializeOwned;

use crate::core::TallyError;
use crate::query::DataQuery;

use super::convert::to_responses;
use super::error::{ApiError, error_response};
use super::state::AppState;
use super::types::{FetchRequest, FetchResponse, KeyQuery, KeyValue};

pub async fn health() -> &'static str {
    "OK"
}

/// POST /fetch
///
/// Aggregates stored counts per key over `[startDate, endDate)` and keeps
/// the keys whose total lies in `[minCount, maxCount)`.
pub async fn fetch(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<FetchResponse>, ApiError> {
    let request: FetchRequest = decode_body(&body)?;
    request.validate()?;
    let query = DataQuery::try_from(&request)?;

    let ctx = state.request_context();
    let records = state.documents.get(&ctx, &query).await?;

    Ok(Json(FetchResponse::success(to_responses(records))))
}

/// POST /in-memory
pub async fn set_value(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<KeyValue>, ApiError> {
    let pair: KeyValue = decode_body(&body)?;
    pair.validate()?;

    let ctx = state.request_context();
    state.kv.set(&ctx, &pair.key, &pair.value).await?;

    Ok(Json(pair))
}

/// GET /in-memory?key=
pub async fn get_value(
    State(state): State<AppState>,
    params: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<Json<KeyValue>, ApiError> {
    let Query(params) =
        params.map_err(|rejection| TallyError::InvalidRequest(rejection.body_text()))?;
    let key = params
        .key
        .filter(|key| !key.is_empty())
        .ok_or_else(|| TallyError::InvalidRequest(String::from("key not given")))?;

    let ctx = state.request_context();
    let value = state.kv.get(&ctx, &key).await?;

    Ok(Json(KeyValue { key, value }))
}

/// Unknown paths and unsupported methods on known paths.
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, String::from("not found"))
}

/// Bodies are decoded as JSON whatever the `Content-Type` says.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, TallyError> {
    serde_json::from_slice(body)
        .map_err(|e| TallyError::InvalidRequest(format!("invalid request body: {e}")))
}
