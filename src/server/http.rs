//! JSON request/response handlers.

use super::{AppState, blocking};
use crate::config::ClientSettings;
use crate::error::CasebookError;
use crate::locks::{Lock, LockTable, Owner};
use crate::records::{CaseView, Record};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::error;

/// A [`CasebookError`] rendered as an HTTP response.
///
/// The body is `{"error": message}`, plus `"lock"` for conflicts so the
/// caller can show who holds the case.
#[derive(Debug)]
pub struct ApiError(pub CasebookError);

impl From<CasebookError> for ApiError {
    fn from(err: CasebookError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CasebookError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CasebookError::Conflict { .. } => StatusCode::LOCKED,
            CasebookError::Forbidden => StatusCode::LOCKED,
            CasebookError::NotOwner => StatusCode::CONFLICT,
            CasebookError::NotFound(_) => StatusCode::NOT_FOUND,
            CasebookError::Storage(_) | CasebookError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = match self.0.conflicting_lock() {
            Some(lock) => json!({ "error": self.0.to_string(), "lock": lock }),
            None => json!({ "error": self.0.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Body of `POST /api/locks/{caseId}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AcquireBody {
    user_id: Option<String>,
    username: Option<String>,
}

/// Body of heartbeat and release requests.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OwnerBody {
    user_id: Option<String>,
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CasebookError::ValidationError(format!("{} is required", field)).into()),
    }
}

pub(super) async fn health() -> &'static str {
    "casebook running"
}

pub(super) async fn settings(State(state): State<AppState>) -> Json<ClientSettings> {
    Json(state.settings)
}

pub(super) async fn list_records(State(state): State<AppState>) -> ApiResult<Json<Vec<CaseView>>> {
    Ok(Json(blocking(&state.service, |s| s.list_cases()).await??))
}

pub(super) async fn create_record(
    State(state): State<AppState>,
    body: Option<Json<Map<String, Value>>>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let draft = body.map(|Json(b)| b).unwrap_or_default();
    let record = blocking(&state.service, move |s| s.create_case(&draft)).await??;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(super) async fn update_record(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
    body: Option<Json<Map<String, Value>>>,
) -> ApiResult<Json<Record>> {
    let patch = body.map(|Json(b)| b).unwrap_or_default();
    Ok(Json(
        blocking(&state.service, move |s| s.update_case(&case_id, patch)).await??,
    ))
}

pub(super) async fn delete_record(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
) -> ApiResult<Json<Value>> {
    blocking(&state.service, move |s| s.delete_case(&case_id)).await??;
    Ok(Json(json!({ "ok": true })))
}

pub(super) async fn list_locks(State(state): State<AppState>) -> ApiResult<Json<LockTable>> {
    Ok(Json(blocking(&state.service, |s| s.locks()).await??))
}

pub(super) async fn acquire_lock(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
    body: Option<Json<AcquireBody>>,
) -> ApiResult<Json<Lock>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let owner = Owner::new(
        required(body.user_id, "userId")?,
        required(body.username, "username")?,
    );
    Ok(Json(
        blocking(&state.service, move |s| s.acquire(&case_id, owner)).await??,
    ))
}

pub(super) async fn renew_lock(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
    body: Option<Json<OwnerBody>>,
) -> ApiResult<Json<Lock>> {
    let owner_id = body.and_then(|Json(b)| b.user_id).unwrap_or_default();
    Ok(Json(
        blocking(&state.service, move |s| s.renew(&case_id, &owner_id)).await??,
    ))
}

pub(super) async fn release_lock(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
    body: Option<Json<OwnerBody>>,
) -> ApiResult<Json<Value>> {
    let owner_id = body.and_then(|Json(b)| b.user_id).unwrap_or_default();
    blocking(&state.service, move |s| s.release(&case_id, &owner_id)).await??;
    Ok(Json(json!({ "ok": true })))
}
