//! In-memory analysis service used by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::models::api::{RemoteStage, StatusResponse, UploadResponse};
use crate::models::document::{DocumentFile, PDF_CONTENT_TYPE};
use crate::services::backend::{AnalysisBackend, BackendError};

pub(crate) fn processing(progress: u8) -> StatusResponse {
    StatusResponse {
        stage: RemoteStage::Processing,
        progress,
        message: format!("Analyzing ({}%)", progress),
        results: None,
    }
}

pub(crate) fn completed(results: Value) -> StatusResponse {
    StatusResponse {
        stage: RemoteStage::Completed,
        progress: 100,
        message: "Analysis completed successfully".to_string(),
        results: results.as_object().cloned(),
    }
}

pub(crate) fn failed(message: &str) -> StatusResponse {
    StatusResponse {
        stage: RemoteStage::Failed,
        progress: 100,
        message: message.to_string(),
        results: None,
    }
}

/// The service's intermediate stage right after it accepts a file.
pub(crate) fn upload_stage(progress: u8) -> StatusResponse {
    StatusResponse {
        stage: RemoteStage::Upload,
        progress,
        message: "File received".to_string(),
        results: None,
    }
}

/// A stage this client does not know about.
pub(crate) fn unrecognized_stage(progress: u8) -> StatusResponse {
    StatusResponse {
        stage: RemoteStage::Unknown,
        progress,
        message: "Queued".to_string(),
        results: None,
    }
}

pub(crate) fn sample_pdf() -> DocumentFile {
    DocumentFile::new(
        "audit.pdf",
        PDF_CONTENT_TYPE,
        b"%PDF-1.4\n%%EOF".to_vec(),
    )
}

enum Reply {
    Respond(StatusResponse),
    Error,
    /// Never answers.
    Hang,
}

struct ScriptedStatus {
    delay: Duration,
    reply: Reply,
}

/// Backend whose responses are queued up front. When the status script runs
/// out, the last scripted response repeats.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    /// `None` is a probe that never answers.
    probes: Mutex<VecDeque<Option<bool>>>,
    upload_fails: bool,
    statuses: Mutex<VecDeque<ScriptedStatus>>,
    last_status: Mutex<Option<StatusResponse>>,
    stalled: AtomicBool,
    artifact: Vec<u8>,
    pub probe_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            artifact: br#"{"ExecutiveSummary":"ok"}"#.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_probes(self, outcomes: &[bool]) -> Self {
        self.probes
            .lock()
            .unwrap()
            .extend(outcomes.iter().copied().map(Some));
        self
    }

    pub fn then_probe_hang(self) -> Self {
        self.probes.lock().unwrap().push_back(None);
        self
    }

    pub fn failing_upload(mut self) -> Self {
        self.upload_fails = true;
        self
    }

    pub fn then_status(self, response: StatusResponse) -> Self {
        self.then_status_after(Duration::ZERO, response)
    }

    pub fn then_status_after(self, delay: Duration, response: StatusResponse) -> Self {
        self.push_status(delay, Reply::Respond(response))
    }

    pub fn then_status_error(self) -> Self {
        self.push_status(Duration::ZERO, Reply::Error)
    }

    /// From here on, status requests never answer.
    pub fn then_status_hang(self) -> Self {
        self.push_status(Duration::ZERO, Reply::Hang)
    }

    fn push_status(self, delay: Duration, reply: Reply) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .push_back(ScriptedStatus { delay, reply });
        self
    }

    pub fn probes(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn status_requests(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn probe(&self) -> Result<(), BackendError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.probes.lock().unwrap().pop_front();
        match next.unwrap_or(Some(true)) {
            Some(true) => Ok(()),
            Some(false) => Err(BackendError::Status(StatusCode::SERVICE_UNAVAILABLE)),
            None => std::future::pending().await,
        }
    }

    async fn upload(&self, _document: &DocumentFile) -> Result<UploadResponse, BackendError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.upload_fails {
            return Err(BackendError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        Ok(UploadResponse {
            file_id: "job-1".to_string(),
            message: Some("Processing started".to_string()),
        })
    }

    async fn status(&self, _file_id: &str) -> Result<StatusResponse, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        let Some(scripted) = next else {
            if self.stalled.load(Ordering::SeqCst) {
                return std::future::pending().await;
            }
            let last = self.last_status.lock().unwrap().clone();
            return last.ok_or(BackendError::Status(StatusCode::BAD_GATEWAY));
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        match scripted.reply {
            Reply::Respond(response) => {
                *self.last_status.lock().unwrap() = Some(response.clone());
                Ok(response)
            }
            Reply::Error => Err(BackendError::Status(StatusCode::BAD_GATEWAY)),
            Reply::Hang => {
                self.stalled.store(true, Ordering::SeqCst);
                std::future::pending().await
            }
        }
    }

    async fn download(&self, _file_id: &str) -> Result<Vec<u8>, BackendError> {
        Ok(self.artifact.clone())
    }
}

pub(crate) fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
