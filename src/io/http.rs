//! Tracking HTTP API
//!
//! Routes:
//! - `POST /api/checkpoint` - record a checkpoint (201, 400, 409)
//! - `GET /api/history?unitId=<uuid>` - checkpoints of a unit in save order
//! - `GET /api/units[?status=S]` - unit projections
//! - `GET /health`, `GET /metrics`
//!
//! Uses hyper for the HTTP server.

use crate::domain::checkpoint::Checkpoint;
use crate::domain::error::TrackingError;
use crate::infra::checkpoint_store::{CheckpointStore, InMemoryCheckpointStore};
use crate::infra::config::Config;
use crate::infra::metrics::{Metrics, MetricsSummary};
use crate::infra::unit_store::{InMemoryUnitStore, UnitStore};
use crate::io::prometheus::format_prometheus_metrics;
use crate::services::{GetHistory, ListUnits, RecordCheckpoint};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type HttpResponse = Response<Full<Bytes>>;

/// Shared handles used by every connection
pub struct AppState {
    record: Arc<RecordCheckpoint>,
    history: GetHistory,
    units: ListUnits,
    checkpoint_store: Arc<dyn CheckpointStore>,
    unit_store: Arc<dyn UnitStore>,
    metrics: Arc<Metrics>,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        checkpoint_store: Arc<dyn CheckpointStore>,
        unit_store: Arc<dyn UnitStore>,
        metrics: Arc<Metrics>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            record: Arc::new(RecordCheckpoint::with_metrics(
                checkpoint_store.clone(),
                unit_store.clone(),
                metrics.clone(),
            )),
            history: GetHistory::with_metrics(checkpoint_store.clone(), metrics.clone()),
            units: ListUnits::new(unit_store.clone()),
            checkpoint_store,
            unit_store,
            metrics,
            max_body_bytes,
        }
    }

    /// State backed by fresh in-memory stores
    pub fn in_memory(config: &Config, metrics: Arc<Metrics>) -> Self {
        Self::new(
            Arc::new(InMemoryCheckpointStore::new()),
            Arc::new(InMemoryUnitStore::new()),
            metrics,
            config.max_body_bytes(),
        )
    }

    /// Metrics summary with current store sizes; `reset` starts a new reporting period
    pub async fn metrics_summary(&self, reset: bool) -> MetricsSummary {
        let units = self.unit_store.count().await.unwrap_or_else(|e| {
            warn!(error = %e, "unit_count_failed");
            0
        });
        let checkpoints = self.checkpoint_store.count().await.unwrap_or_else(|e| {
            warn!(error = %e, "checkpoint_count_failed");
            0
        });
        if reset {
            self.metrics.report(units, checkpoints)
        } else {
            self.metrics.snapshot(units, checkpoints)
        }
    }
}

/// Schema violation reported back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Validated body of `POST /api/checkpoint`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCheckpointRequest {
    pub unit_id: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Hyphenated UUID, e.g. `123e4567-e89b-12d3-a456-426614174000`
fn is_uuid(value: &str) -> bool {
    value.len() == 36 && Uuid::parse_str(value).is_ok()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value).ok().map(|ts| ts.with_timezone(&Utc))
}

/// Check request shape only; status membership is decided by the record operation
pub fn validate_create_request(body: &Value) -> Result<CreateCheckpointRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let unit_id = match body.get("unitId").and_then(Value::as_str) {
        Some(id) if is_uuid(id) => Some(id.to_string()),
        _ => {
            errors.push(FieldError { field: "unitId", message: "Invalid unitId format" });
            None
        }
    };

    let status = match body.get("status").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => {
            errors.push(FieldError { field: "status", message: "Status cannot be empty" });
            None
        }
    };

    let timestamp = match body.get("timestamp").and_then(Value::as_str).and_then(parse_timestamp) {
        Some(ts) => Some(ts),
        None => {
            errors.push(FieldError { field: "timestamp", message: "Invalid timestamp format" });
            None
        }
    };

    match (unit_id, status, timestamp) {
        (Some(unit_id), Some(status), Some(timestamp)) => {
            Ok(CreateCheckpointRequest { unit_id, status, timestamp })
        }
        _ => Err(errors),
    }
}

/// First value of `key` in a query string (percent-decoded)
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(bytes)))
            .expect("static response should not fail"),
        Err(e) => {
            error!(error = %e, "http_response_serialize_failed");
            internal_error()
        }
    }
}

fn message_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &json!({ "message": message }))
}

fn internal_error() -> HttpResponse {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(r#"{"message":"Internal Server Error"}"#)))
        .expect("static response should not fail")
}

fn validation_failed(errors: &[FieldError]) -> HttpResponse {
    json_response(
        StatusCode::BAD_REQUEST,
        &json!({ "message": "Validation failed", "errors": errors }),
    )
}

/// Map a domain error to its HTTP response
fn error_response(err: &TrackingError) -> HttpResponse {
    let status = match err {
        TrackingError::InvalidStatus { .. } => StatusCode::BAD_REQUEST,
        TrackingError::DuplicateRequest { .. } => StatusCode::CONFLICT,
        TrackingError::Store(_) => return internal_error(),
    };
    json_response(status, &json!({ "error": err.kind(), "message": err.to_string() }))
}

async fn create_checkpoint(req: Request<hyper::body::Incoming>, state: &AppState) -> HttpResponse {
    let body = match Limited::new(req.into_body(), state.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return message_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
        Err(e) => {
            debug!(error = %e, "http_body_read_failed");
            return message_response(StatusCode::BAD_REQUEST, "Unable to read request body");
        }
    };

    let Ok(value) = serde_json::from_slice::<Value>(&body) else {
        return message_response(StatusCode::BAD_REQUEST, "Malformed JSON body");
    };

    let request = match validate_create_request(&value) {
        Ok(request) => request,
        Err(errors) => return validation_failed(&errors),
    };

    // Run to completion even if the client goes away, so a commit is never cut in half
    let record = state.record.clone();
    let outcome = tokio::spawn(async move {
        record.execute(&request.unit_id, &request.status, request.timestamp).await
    })
    .await;

    match outcome {
        Ok(Ok(checkpoint)) => json_response(StatusCode::CREATED, &checkpoint),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            error!(error = %e, "checkpoint_task_failed");
            internal_error()
        }
    }
}

async fn get_history(query: Option<&str>, state: &AppState) -> HttpResponse {
    let unit_id = match query_param(query, "unitId") {
        Some(id) if is_uuid(&id) => id,
        _ => {
            return validation_failed(&[FieldError {
                field: "unitId",
                message: "Invalid unitId format",
            }])
        }
    };

    match state.history.execute(&unit_id).await {
        Ok(history) => json_response::<Vec<Checkpoint>>(StatusCode::OK, &history),
        Err(e) => error_response(&e),
    }
}

async fn list_units(query: Option<&str>, state: &AppState) -> HttpResponse {
    let status = query_param(query, "status");
    match state.units.execute(status.as_deref()).await {
        Ok(units) => json_response(StatusCode::OK, &units),
        Err(e) => error_response(&e),
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<HttpResponse, Infallible> {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    state.metrics.record_http_request();

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/api/checkpoint") => create_checkpoint(req, &state).await,
        (&Method::GET, "/api/history") => get_history(query.as_deref(), &state).await,
        (&Method::GET, "/api/units") => list_units(query.as_deref(), &state).await,
        (&Method::GET, "/health") => Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("ok")))
            .expect("static response should not fail"),
        (&Method::GET, "/metrics") => {
            let body = format_prometheus_metrics(&state.metrics_summary(false).await);
            Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
                .body(Full::new(Bytes::from(body)))
                .expect("static response should not fail")
        }
        _ => message_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    debug!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        latency_us = %start.elapsed().as_micros(),
        "http_request"
    );

    Ok(response)
}

/// Bind `config.listen_addr()` and serve until shutdown
pub async fn start_http_server(
    config: &Config,
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(config.listen_addr()).await?;
    serve(listener, state, shutdown).await
}

/// Serve connections from an already bound listener until shutdown
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "http_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let state = state.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let state = state.clone();
                                async move { handle_request(req, state).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "http_connection_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "http_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("http_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}
