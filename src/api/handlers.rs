//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::{Arc, MutexGuard};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HerdbookError;
use crate::partition::{CountTable, YearPartition};
use crate::register::Register;
use crate::store::DynStore;
use crate::types::{CellValue, Record};

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Error mapped to an HTTP status with an `ApiResponse` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<HerdbookError> for ApiError {
    fn from(e: HerdbookError) -> Self {
        let status = match &e {
            HerdbookError::NoSuchRecord { .. } => StatusCode::NOT_FOUND,
            HerdbookError::InvalidDate(_) => StatusCode::UNPROCESSABLE_ENTITY,
            HerdbookError::PartialWrite { .. } | HerdbookError::Write(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Register<DynStore>>, ApiError> {
    state.register.lock().map_err(|_| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "register lock poisoned by an earlier failure".to_string(),
    })
}

/// Root endpoint response
#[derive(Serialize, Deserialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize, Deserialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(RootResponse {
        name: "Herdbook API Server".to_string(),
        version: state.version.clone(),
        description: "Animal register backed by a spreadsheet worksheet".to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint("GET", "/api/v1/records", "List all records"),
            endpoint("POST", "/api/v1/records", "Add a record (acquired defaults to today)"),
            endpoint("PUT", "/api/v1/records/:index", "Update the record at an index"),
            endpoint("DELETE", "/api/v1/records/:index", "Delete the record at an index"),
            endpoint("GET", "/api/v1/years", "Records partitioned by year and species"),
            endpoint("GET", "/api/v1/counts", "Year x species count table"),
        ],
    }))
}

/// Health check response
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub records: usize,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let register = lock(&state)?;
    Ok(Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        records: register.len(),
    })))
}

/// Version response
#[derive(Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
    }))
}

/// A record with its position in the register
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct IndexedRecord {
    pub index: usize,
    #[serde(flatten)]
    pub record: Record,
}

#[derive(Serialize, Deserialize)]
pub struct RecordsResponse {
    pub count: usize,
    pub records: Vec<IndexedRecord>,
}

/// GET /api/v1/records - List records
pub async fn list_records(State(state): State<Arc<AppState>>) -> ApiResult<RecordsResponse> {
    let register = lock(&state)?;
    let records: Vec<IndexedRecord> = register
        .list()
        .into_iter()
        .enumerate()
        .map(|(index, record)| IndexedRecord { index, record })
        .collect();
    Ok(Json(ApiResponse::ok(RecordsResponse {
        count: records.len(),
        records,
    })))
}

/// POST /api/v1/records - Add a record. A missing acquisition date is today.
pub async fn add_record(
    State(state): State<Arc<AppState>>,
    Json(mut record): Json<Record>,
) -> ApiResult<IndexedRecord> {
    let mut register = lock(&state)?;
    if record.acquired.is_empty() {
        record.acquired = CellValue::Date(register.today());
    }
    let index = register.add(record)?;
    let record = register.get(index)?;
    Ok(Json(ApiResponse::ok(IndexedRecord { index, record })))
}

/// PUT /api/v1/records/:index - Update a record
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(record): Json<Record>,
) -> ApiResult<IndexedRecord> {
    let mut register = lock(&state)?;
    let record = register.update(index, record)?;
    Ok(Json(ApiResponse::ok(IndexedRecord { index, record })))
}

#[derive(Serialize, Deserialize)]
pub struct DeleteResponse {
    pub removed: IndexedRecord,
    pub remaining: usize,
}

/// DELETE /api/v1/records/:index - Delete a record
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> ApiResult<DeleteResponse> {
    let mut register = lock(&state)?;
    let record = register.delete(index)?;
    Ok(Json(ApiResponse::ok(DeleteResponse {
        removed: IndexedRecord { index, record },
        remaining: register.len(),
    })))
}

/// GET /api/v1/years - Year partition
pub async fn years(State(state): State<Arc<AppState>>) -> ApiResult<YearPartition> {
    let register = lock(&state)?;
    Ok(Json(ApiResponse::ok(register.partition())))
}

/// GET /api/v1/counts - Year x species counts
pub async fn counts(State(state): State<Arc<AppState>>) -> ApiResult<CountTable> {
    let register = lock(&state)?;
    Ok(Json(ApiResponse::ok(register.counts())))
}
