use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Generic message shown when the client could not read the job status.
pub const STATUS_CHECK_FAILED: &str = "Failed to check status";

/// Message shown when a job outlives the configured client-side timeout.
pub const STATUS_CHECK_TIMED_OUT: &str = "Status check timed out";

/// Message shown when the upload request fails.
pub const UPLOAD_FAILED: &str = "Failed to upload file. Please try again.";

/// Lifecycle stage of the analysis job tracked by the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    #[default]
    Idle,
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl JobStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Failed)
    }
}

/// Where a terminal failure message came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "message", rename_all = "snake_case")]
pub enum JobFailure {
    /// The status request itself failed; message is client-generated.
    Transport(String),
    /// The service reported the job as failed; message is the service's.
    Backend(String),
}

impl JobFailure {
    pub fn message(&self) -> &str {
        match self {
            JobFailure::Transport(msg) | JobFailure::Backend(msg) => msg,
        }
    }
}

/// The single analysis job owned by a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Option<String>,
    pub stage: JobStage,
    pub progress: u8,
    pub message: Option<String>,
    pub result: Option<Map<String, Value>>,
    pub error: Option<JobFailure>,
    /// Set when the upload failed before any backend job existed.
    pub upload_error: Option<String>,
}

impl Job {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.stage, JobStage::Uploading | JobStage::Processing)
    }

    /// True when this job is still being tracked under `id`.
    pub fn is_tracking(&self, id: &str) -> bool {
        self.stage == JobStage::Processing && self.id.as_deref() == Some(id)
    }

    pub(crate) fn begin_upload(&mut self) {
        *self = Job {
            stage: JobStage::Uploading,
            ..Job::default()
        };
    }

    pub(crate) fn upload_succeeded(&mut self, id: String) {
        self.id = Some(id);
        self.stage = JobStage::Processing;
        self.progress = 0;
        self.message = Some("Processing started".to_string());
    }

    pub(crate) fn upload_failed(&mut self) {
        *self = Job {
            upload_error: Some(UPLOAD_FAILED.to_string()),
            ..Job::default()
        };
    }

    pub(crate) fn record_progress(&mut self, progress: u8, message: String) {
        self.progress = progress.min(100);
        self.message = Some(message);
    }

    pub(crate) fn complete(&mut self, progress: u8, message: String, result: Map<String, Value>) {
        self.record_progress(progress, message);
        self.stage = JobStage::Completed;
        self.result = Some(result);
        self.error = None;
    }

    pub(crate) fn fail(&mut self, failure: JobFailure) {
        self.stage = JobStage::Failed;
        self.result = None;
        self.error = Some(failure);
    }
}
