//! The job lifecycle controller for one client session.
//!
//! A session owns the single [`Job`], the health monitor and at most one
//! running status poller. All background work is tied to the session's
//! cancellation token and is torn down by [`Session::shutdown`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app_state::AppState;
use crate::models::document::{DocumentFile, UploadPolicy};
use crate::models::health::ServiceHealth;
use crate::models::job::{Job, JobStage};
use crate::services::backend::{AnalysisBackend, BackendError};
use crate::services::health::HealthMonitor;
use crate::services::poller::{JobPoller, PollHandle, PollerConfig};
use crate::services::report::Report;
use crate::services::upload::{UploadCoordinator, UploadError};

/// File name the report artifact is saved under.
pub const REPORT_FILE_NAME: &str = "cybersecurity_report.json";

pub struct Session {
    backend: Arc<dyn AnalysisBackend>,
    job: Arc<watch::Sender<Job>>,
    report: Arc<watch::Sender<Option<Report>>>,
    health: Arc<HealthMonitor>,
    uploader: UploadCoordinator,
    poller: JobPoller,
    active_poll: Option<PollHandle>,
    health_task: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl Session {
    /// Create a session and start its health monitor.
    pub fn start(state: &AppState) -> Self {
        let config = &state.config;
        let backend = Arc::clone(&state.backend);
        let (job, _) = watch::channel(Job::idle());
        let job = Arc::new(job);
        let (report, _) = watch::channel(None);
        let shutdown = CancellationToken::new();

        let health = Arc::new(HealthMonitor::new(
            Arc::clone(&backend),
            config.health_interval(),
        ));
        let health_task = Arc::clone(&health).start(job.subscribe(), shutdown.clone());

        let uploader = UploadCoordinator::new(
            Arc::clone(&backend),
            UploadPolicy {
                max_bytes: config.max_upload_bytes,
            },
        );
        let poller = JobPoller::new(
            Arc::clone(&backend),
            PollerConfig {
                interval: config.poll_interval(),
                request_timeout: config.request_timeout(),
                discard_stale: config.discard_stale_polls,
                timeout: config.job_timeout(),
            },
        );

        tracing::info!(base_url = %config.api_base_url, "Session started");

        Self {
            backend,
            job,
            report: Arc::new(report),
            health,
            uploader,
            poller,
            active_poll: None,
            health_task: Some(health_task),
            shutdown,
        }
    }

    pub fn job(&self) -> Job {
        self.job.borrow().clone()
    }

    pub fn subscribe_job(&self) -> watch::Receiver<Job> {
        self.job.subscribe()
    }

    pub fn report(&self) -> Option<Report> {
        self.report.borrow().clone()
    }

    pub fn health(&self) -> ServiceHealth {
        self.health.current()
    }

    pub fn subscribe_health(&self) -> watch::Receiver<ServiceHealth> {
        self.health.subscribe()
    }

    /// Check a document without submitting it.
    pub fn validate(&self, document: &DocumentFile) -> Result<(), SessionError> {
        self.uploader.validate(document)?;
        Ok(())
    }

    /// Submit a document for analysis.
    ///
    /// A job still uploading or processing must be reset first. A finished
    /// job is discarded. On success the status poller is running for the
    /// new job.
    pub async fn submit(&mut self, document: &DocumentFile) -> Result<Job, SessionError> {
        if self.job.borrow().is_active() {
            return Err(SessionError::JobInProgress);
        }
        self.uploader.validate(document)?;
        if self.job.borrow().stage != JobStage::Idle {
            self.reset();
        }

        let file_id = self.uploader.submit(document, &self.job).await?;

        let handle = self.poller.start(
            file_id,
            Arc::clone(&self.job),
            Arc::clone(&self.report),
            &self.shutdown,
        );
        self.active_poll = Some(handle);

        Ok(self.job())
    }

    /// Wait until the current job reaches a terminal stage, or the upload
    /// fails. Returns the job as last observed.
    pub async fn wait_for_outcome(&self) -> Job {
        let mut rx = self.job.subscribe();
        loop {
            {
                let job = rx.borrow_and_update();
                if job.stage.is_terminal() || job.stage == JobStage::Idle {
                    return job.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.job();
            }
        }
    }

    /// Discard the current job, stopping its poller. Health monitoring
    /// resumes if a report was displayed.
    pub fn reset(&mut self) {
        if let Some(handle) = self.active_poll.take() {
            handle.cancel();
        }
        self.job.send_replace(Job::idle());
        self.report.send_replace(None);
        tracing::info!("Session reset");
    }

    /// Fetch the report artifact of the completed job and save it in `dir`.
    pub async fn download_report(&self, dir: &Path) -> Result<PathBuf, DownloadError> {
        let job = self.job();
        let file_id = match (&job.id, job.stage) {
            (Some(id), JobStage::Completed) => id.clone(),
            _ => return Err(DownloadError::NotReady),
        };

        let bytes = self.backend.download(&file_id).await.map_err(|e| {
            tracing::error!(job_id = %file_id, error = %e, "Failed to download report");
            DownloadError::Fetch(e)
        })?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(REPORT_FILE_NAME);
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(job_id = %file_id, path = %path.display(), bytes = bytes.len(), "Report saved");
        Ok(path)
    }

    /// Stop all background work owned by this session.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.active_poll.take() {
            handle.finished().await;
        }
        if let Some(task) = self.health_task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Health monitor task aborted");
            }
        }
        tracing::info!("Session shut down");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("A job is already in progress; reset before submitting another document")]
    JobInProgress,

    #[error(transparent)]
    Upload(#[from] UploadError),
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("No completed report is available to download")]
    NotReady,

    #[error("Failed to download report: {0}")]
    Fetch(#[from] BackendError),

    #[error("Failed to save report: {0}")]
    Io(#[from] std::io::Error),
}
