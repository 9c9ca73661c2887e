//! Request handlers.
//!
//! Each handler walks `Received → Decoding → StoreOp → Encoding → Responded`
//! and bails out with an [`ApiError`] at the first failing stage. Decoding,
//! encoding and store writes run on the blocking pool; once a body has been
//! received in full, its write completes even if the client goes away.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use csvd_core::{codec, PutOutcome, TableName};

use super::error::ApiError;
use super::AppState;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Number of committed tables.
    pub tables: usize,
    /// Rows across all tables.
    pub rows: usize,
    /// Seconds since the store was opened.
    pub uptime_secs: u64,
    /// Server version.
    pub version: String,
}

/// `POST /frame`: store the body under a generated name.
pub(crate) async fn create_frame(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let body = body.map_err(|r| ApiError::from_body_rejection(r, state.options.max_body_bytes))?;

    let store = state.store.clone();
    let name = run_blocking(move || {
        let table = codec::decode(&body)?;
        Ok(store.insert_generated(table)?)
    })
    .await?;

    let location = format!("/tables/{}", name);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        name.into_string(),
    )
        .into_response())
}

/// `POST|PUT /tables/:name`: create or replace a table.
pub(crate) async fn put_table(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let name = TableName::new(name)?;
    let body = body.map_err(|r| ApiError::from_body_rejection(r, state.options.max_body_bytes))?;

    let store = state.store.clone();
    let target = name.clone();
    let outcome = run_blocking(move || {
        let table = codec::decode(&body)?;
        Ok(store.put(&target, table)?)
    })
    .await?;

    let status = match outcome {
        PutOutcome::Created => StatusCode::CREATED,
        PutOutcome::Replaced => StatusCode::OK,
    };
    Ok((status, name.into_string()).into_response())
}

/// `GET /tables/:name`: fetch a table as CSV.
pub(crate) async fn get_table(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let name = TableName::new(name)?;
    let table = state.store.get(name.as_str())?;

    let body = run_blocking(move || {
        codec::encode(&table).map_err(|e| ApiError::Internal(format!("encoding failed: {}", e)))
    })
    .await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, codec::CSV_CONTENT_TYPE)],
        body,
    )
        .into_response())
}

/// `DELETE /tables/:name`.
pub(crate) async fn delete_table(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let name = TableName::new(name)?;
    let store = state.store.clone();
    run_blocking(move || Ok(store.remove(&name)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /tables`: committed names, sorted.
pub(crate) async fn list_tables(State(state): State<AppState>) -> Json<Vec<TableName>> {
    Json(state.store.list())
}

/// `GET /health`.
pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.store.stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        tables: stats.table_count,
        rows: stats.total_rows,
        uptime_secs: stats.uptime.as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Logs method, path, status and latency of every request.
pub(crate) async fn log_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_us = start.elapsed().as_micros() as u64;
    if response.status().is_server_error() {
        tracing::error!(%method, %path, status, elapsed_us, "request");
    } else if response.status().is_client_error() {
        tracing::warn!(%method, %path, status, elapsed_us, "request");
    } else if state.options.request_logging {
        tracing::info!(%method, %path, status, elapsed_us, "request");
    } else {
        tracing::debug!(%method, %path, status, elapsed_us, "request");
    }
    response
}

/// Runs CPU-heavy or blocking work off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {}", e)))?
}
