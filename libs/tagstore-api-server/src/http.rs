use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use tagstore_api::{Fingerprint, RecordPatch};
use tagstore_engine::ReadOutcome;

use crate::error::ApiError;
use crate::AppState;

/// Client-presented tag from a conditional header. Non-ASCII or empty
/// values count as absent.
fn presented(headers: &HeaderMap, name: HeaderName) -> Option<Fingerprint> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(Fingerprint::parse)
}

/// Whole segment must be an unsigned integer: `1abc` names no record.
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidId(raw.to_string()))
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /api/users/{id}   (If-None-Match)
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    let if_none_match = presented(&headers, header::IF_NONE_MATCH);

    match state.store.read(id, if_none_match.as_ref()).await? {
        ReadOutcome::Unchanged { fingerprint } => Ok((
            StatusCode::NOT_MODIFIED,
            [(header::ETAG, fingerprint.to_string())],
        )
            .into_response()),
        ReadOutcome::Modified(v) => Ok((
            StatusCode::OK,
            [
                (header::ETAG, v.fingerprint.to_string()),
                (header::CACHE_CONTROL, state.cache_control.to_string()),
            ],
            Json(v.record),
        )
            .into_response()),
    }
}

// ═══════════════════════════════════════════════════════════════
//  REST: PUT /api/users/{id}   (If-Match required)
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_put_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<RecordPatch>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    let if_match = presented(&headers, header::IF_MATCH);

    // 404 / 428 / 412 take precedence over a bad body
    let patch = match body {
        Ok(Json(patch)) => patch,
        Err(rejection) => {
            state.store.precondition(id, if_match.as_ref()).await?;
            return Err(ApiError::Body(rejection));
        }
    };

    let v = state.store.update(id, if_match.as_ref(), patch).await?;
    Ok((
        StatusCode::OK,
        [(header::ETAG, v.fingerprint.to_string())],
        Json(v.record),
    )
        .into_response())
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /api/time   (never fingerprinted)
// ═══════════════════════════════════════════════════════════════

#[derive(Serialize)]
pub(crate) struct TimeResponse {
    timestamp: String,
}

pub(crate) async fn handle_time() -> Json<TimeResponse> {
    Json(TimeResponse {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
