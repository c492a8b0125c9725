//! Stub analysis service for end-to-end tests.
//!
//! Serves the same routes as the real service on an ephemeral local port.
//! Each uploaded file gets a fresh id and replays the configured status
//! script; once the script runs out the last entry repeats.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
struct StubState {
    health: Mutex<Option<StatusCode>>,
    stall_health: Mutex<bool>,
    reject_uploads: Mutex<bool>,
    script: Mutex<Vec<Value>>,
    jobs: Mutex<HashMap<String, (usize, Vec<Value>)>>,
    uploads: Mutex<Vec<UploadedFile>>,
    status_requests: Mutex<usize>,
}

/// Handle on a running stub service. The server stops when the test ends.
#[derive(Clone)]
pub struct StubService {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubService {
    pub async fn spawn() -> Self {
        let state = Arc::new(StubState::default());

        let app = Router::new()
            .route("/api/test", get(health))
            .route("/api/upload", post(upload))
            .route("/api/status/{id}", get(status))
            .route("/api/download/{id}", get(download))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub listener");
        let addr = listener.local_addr().expect("Stub listener has no address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Stub server failed");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Status bodies returned, in order, for every job uploaded afterwards.
    pub fn script(&self, steps: Vec<Value>) {
        *self.state.script.lock().unwrap() = steps;
    }

    /// Answer liveness probes with `code` instead of 200.
    pub fn health_status(&self, code: StatusCode) {
        *self.state.health.lock().unwrap() = Some(code);
    }

    /// Accept liveness probes but never answer them.
    pub fn stall_health(&self) {
        *self.state.stall_health.lock().unwrap() = true;
    }

    pub fn reject_uploads(&self) {
        *self.state.reject_uploads.lock().unwrap() = true;
    }

    pub fn uploads(&self) -> Vec<UploadedFile> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn status_requests(&self) -> usize {
        *self.state.status_requests.lock().unwrap()
    }
}

pub fn processing(progress: u8) -> Value {
    json!({
        "stage": "processing",
        "progress": progress,
        "message": format!("Analyzing document ({}%)", progress)
    })
}

pub fn completed(results: Value) -> Value {
    json!({
        "stage": "completed",
        "progress": 100,
        "message": "Analysis completed successfully",
        "results": results
    })
}

pub fn failed(message: &str) -> Value {
    json!({
        "stage": "failed",
        "progress": 100,
        "message": message
    })
}

async fn health(State(state): State<Arc<StubState>>) -> Response {
    let stalled = *state.stall_health.lock().unwrap();
    if stalled {
        std::future::pending::<()>().await;
    }

    match *state.health.lock().unwrap() {
        Some(code) => (code, "unavailable").into_response(),
        None => Json(json!({"message": "API is working"})).into_response(),
    }
}

async fn upload(State(state): State<Arc<StubState>>, mut multipart: Multipart) -> Response {
    if *state.reject_uploads.lock().unwrap() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upload rejected").into_response();
    }

    let mut received = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let Ok(bytes) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        received = Some((name, content_type, bytes.len()));
    }

    let Some((name, content_type, size)) = received else {
        return (StatusCode::BAD_REQUEST, "missing file field").into_response();
    };

    let id = Uuid::new_v4().to_string();
    let script = state.script.lock().unwrap().clone();
    state.jobs.lock().unwrap().insert(id.clone(), (0, script));
    state.uploads.lock().unwrap().push(UploadedFile {
        id: id.clone(),
        name,
        content_type,
        size,
    });

    Json(json!({"fileId": id, "message": "File uploaded successfully"})).into_response()
}

async fn status(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Response {
    *state.status_requests.lock().unwrap() += 1;

    let mut jobs = state.jobs.lock().unwrap();
    let Some((cursor, steps)) = jobs.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(last) = steps.len().checked_sub(1) else {
        return Json(processing(0)).into_response();
    };

    let body = steps[(*cursor).min(last)].clone();
    *cursor += 1;
    Json(body).into_response()
}

async fn download(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Response {
    let jobs = state.jobs.lock().unwrap();
    let results = jobs
        .get(&id)
        .and_then(|(_, steps)| steps.iter().find_map(|s| s.get("results").cloned()));

    match results {
        Some(results) => Json(results).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
