use std::sync::Arc;

use garde::Validate;
use tokio::sync::watch;

use crate::models::document::{DocumentFile, UploadPolicy};
use crate::models::job::Job;
use crate::services::backend::{AnalysisBackend, BackendError};

/// Validates a document and hands it to the analysis service.
pub struct UploadCoordinator {
    backend: Arc<dyn AnalysisBackend>,
    policy: UploadPolicy,
}

impl UploadCoordinator {
    pub fn new(backend: Arc<dyn AnalysisBackend>, policy: UploadPolicy) -> Self {
        Self { backend, policy }
    }

    /// Check a document against the upload policy without touching the network.
    pub fn validate(&self, document: &DocumentFile) -> Result<(), UploadError> {
        document.validate_with(&self.policy)?;
        Ok(())
    }

    /// Upload `document`, driving `job` through `uploading` into `processing`.
    ///
    /// Returns the service-assigned job identifier. On validation failure the
    /// job is left untouched; on transport failure it is returned to `idle`
    /// with the upload error recorded.
    pub async fn submit(
        &self,
        document: &DocumentFile,
        job: &watch::Sender<Job>,
    ) -> Result<String, UploadError> {
        if let Err(e) = self.validate(document) {
            tracing::info!(file = %document.name, error = %e, "Rejected document before upload");
            return Err(e);
        }

        job.send_modify(Job::begin_upload);
        metrics::counter!("audit_uploads_total").increment(1);

        tracing::info!(
            file = %document.name,
            size_kb = document.size_kb(),
            "Uploading document for analysis"
        );

        match self.backend.upload(document).await {
            Ok(response) => {
                tracing::info!(job_id = %response.file_id, "Upload accepted, processing started");
                let id = response.file_id.clone();
                job.send_modify(|j| j.upload_succeeded(response.file_id));
                Ok(id)
            }
            Err(e) => {
                tracing::error!(file = %document.name, error = %e, "Upload failed");
                metrics::counter!("audit_upload_failures_total").increment(1);
                job.send_modify(Job::upload_failed);
                Err(UploadError::Transport(e))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid document: {0}")]
    Validation(#[from] garde::Report),

    #[error("Upload failed: {0}")]
    Transport(#[from] BackendError),
}
